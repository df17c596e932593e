//! RPC access to one chain endpoint.
//!
//! Everything the relay needs from a chain goes through the `LedgerClient`
//! trait, so the pipeline can run against a scripted double in tests.

use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};

use crate::types::ConfirmationStatus;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Capability surface the relay needs from a chain endpoint.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Latest block number as reported by the endpoint.
    async fn latest_block_number(&self) -> Result<u64>;

    /// Event logs emitted by `contract` with `topic0`, inclusive block range.
    async fn get_logs(
        &self,
        contract: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>>;

    /// Pending-inclusive transaction count for an account.
    async fn pending_transaction_count(&self, address: Address) -> Result<u64>;

    /// Current gas price quote.
    async fn current_gas_price(&self) -> Result<u128>;

    /// Dispatch a signed transaction; returns its hash.
    async fn submit_signed_call(&self, raw: &[u8]) -> Result<B256>;

    /// Poll for a receipt until `timeout`; `Pending` if none appears in time.
    async fn wait_for_confirmation(
        &self,
        tx_hash: B256,
        timeout: Duration,
    ) -> Result<ConfirmationStatus>;

    /// Read-only contract call.
    async fn call(&self, contract: Address, calldata: Bytes) -> Result<Bytes>;
}

/// `LedgerClient` over a plain HTTP JSON-RPC provider.
pub struct EvmClient {
    provider: RootProvider<Http<Client>>,
}

impl EvmClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url = rpc_url.parse().wrap_err("Failed to parse RPC URL")?;
        let provider = ProviderBuilder::new().on_http(url);
        Ok(Self { provider })
    }
}

#[async_trait]
impl LedgerClient for EvmClient {
    async fn latest_block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .wrap_err("Failed to get block number")
    }

    async fn get_logs(
        &self,
        contract: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        let filter = Filter::new()
            .address(contract)
            .event_signature(topic0)
            .from_block(from_block)
            .to_block(to_block);

        self.provider
            .get_logs(&filter)
            .await
            .wrap_err("Failed to get logs")
    }

    async fn pending_transaction_count(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .wrap_err("Failed to get transaction count")
    }

    async fn current_gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .wrap_err("Failed to get gas price")
    }

    async fn submit_signed_call(&self, raw: &[u8]) -> Result<B256> {
        // The RPC error text is kept in the message; the submitter
        // classifies nonce conflicts by matching on it.
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| eyre!("Failed to send raw transaction: {}", e))?;

        Ok(*pending.tx_hash())
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: B256,
        timeout: Duration,
    ) -> Result<ConfirmationStatus> {
        let start = std::time::Instant::now();

        while start.elapsed() < timeout {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                return Ok(if receipt.status() {
                    ConfirmationStatus::Confirmed
                } else {
                    ConfirmationStatus::Failed
                });
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }

        Ok(ConfirmationStatus::Pending)
    }

    async fn call(&self, contract: Address, calldata: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default()
            .to(contract)
            .input(calldata.into());

        self.provider
            .call(&tx)
            .await
            .map_err(|e| eyre!("Contract call failed: {}", e))
    }
}
