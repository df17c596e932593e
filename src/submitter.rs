//! Transaction submission for relay calls.
//!
//! Builds, signs, and dispatches legacy transactions against the target
//! chain. Nonces come from the shared tracker; a dispatch rejected for a
//! nonce conflict releases its reservation and retries with backoff, any
//! other rejection propagates to the per-event boundary.

use std::sync::Arc;
use std::time::Duration;

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::contracts::{DestinationBridge, SourceBridge};
use crate::error::{RelayError, SubmissionError};
use crate::nonce::NonceTracker;
use crate::registry::ChainEndpoint;
use crate::types::{CallKind, ConfirmationStatus, RelayCall, SubmissionResult};

const MAX_BACKOFF_MS: u64 = 10_000;

/// Submission tuning, lifted from the relay section of the config.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    pub gas_limit: u64,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub wait_for_receipt: bool,
    pub confirmation_timeout: Duration,
}

impl SubmitterConfig {
    pub fn from_relay(relay: &RelayConfig) -> Self {
        Self {
            gas_limit: relay.gas_limit,
            retry_attempts: relay.retry_attempts,
            retry_delay: Duration::from_millis(relay.retry_delay_ms),
            wait_for_receipt: relay.wait_for_receipt,
            confirmation_timeout: Duration::from_secs(relay.confirmation_timeout_secs),
        }
    }

    /// Backoff before the retry that follows failed attempt `attempt`
    /// (0-indexed). Doubles per attempt, capped at 10s.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.retry_delay.as_millis() as u64;
        let ms = base.saturating_mul(1u64 << attempt.min(32)).min(MAX_BACKOFF_MS);
        Duration::from_millis(ms)
    }
}

/// True for rejections the submitter may retry with a fresh nonce.
pub fn is_nonce_conflict(error: &str) -> bool {
    let error_lower = error.to_lowercase();
    error_lower.contains("nonce too low")
        || error_lower.contains("nonce too high")
        || error_lower.contains("invalid nonce")
        || error_lower.contains("already known")
        || error_lower.contains("replacement transaction underpriced")
}

/// Signs and dispatches relay calls on behalf of the warden account.
///
/// One submitter serves both chains; the warden uses the same key
/// everywhere, so nonce state is keyed by address inside the tracker.
pub struct TransactionSubmitter {
    signer: PrivateKeySigner,
    address: Address,
    config: SubmitterConfig,
    nonces: Arc<NonceTracker>,
}

impl TransactionSubmitter {
    pub fn new(
        private_key: &str,
        config: SubmitterConfig,
        nonces: Arc<NonceTracker>,
    ) -> Result<Self, RelayError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| RelayError::Config(format!("invalid private key: {}", e)))?;
        let address = signer.address();

        Ok(Self {
            signer,
            address,
            config,
            nonces,
        })
    }

    /// Address of the warden account.
    pub fn signer_address(&self) -> Address {
        self.address
    }

    /// Submit one relay call, retrying only across nonce conflicts.
    pub async fn submit(
        &self,
        endpoint: &ChainEndpoint,
        call: &RelayCall,
    ) -> Result<SubmissionResult, SubmissionError> {
        let calldata = encode_call(call);
        let mut last_error = String::new();

        for attempt in 0..self.config.retry_attempts {
            if attempt > 0 {
                let backoff = self.config.backoff_for_attempt(attempt - 1);
                warn!(
                    chain = %endpoint.role,
                    attempt,
                    max = self.config.retry_attempts,
                    ?backoff,
                    "Retrying after nonce conflict"
                );
                tokio::time::sleep(backoff).await;
            }

            let nonce = self
                .nonces
                .reserve(endpoint.client.as_ref(), self.address)
                .await
                .map_err(|e| {
                    SubmissionError::Rejected(format!("nonce reservation failed: {}", e))
                })?;

            match self.dispatch(endpoint, calldata.clone(), nonce).await {
                Ok(tx_hash) => {
                    self.nonces.commit(self.address, nonce).await;
                    info!(
                        chain = %endpoint.role,
                        kind = %call.kind,
                        tx_hash = %tx_hash,
                        nonce,
                        "Relay call dispatched"
                    );

                    let status = self.confirm(endpoint, tx_hash).await;
                    if status == ConfirmationStatus::Failed {
                        return Err(SubmissionError::Reverted {
                            tx_hash: format!("{:?}", tx_hash),
                        });
                    }

                    return Ok(SubmissionResult {
                        tx_hash,
                        status,
                        nonce,
                        attempts: attempt + 1,
                    });
                }
                Err(e) => {
                    self.nonces.release(self.address, nonce).await;
                    if e.is_retriable() {
                        last_error = e.to_string();
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(SubmissionError::RetriesExhausted {
            attempts: self.config.retry_attempts,
            last_error,
        })
    }

    /// Build, sign, and send one transaction with the reserved nonce.
    async fn dispatch(
        &self,
        endpoint: &ChainEndpoint,
        calldata: Bytes,
        nonce: u64,
    ) -> Result<B256, SubmissionError> {
        let gas_price = endpoint
            .client
            .current_gas_price()
            .await
            .map_err(|e| SubmissionError::Rejected(format!("gas price query failed: {}", e)))?;

        let mut tx = TxLegacy {
            chain_id: Some(endpoint.chain_id),
            nonce,
            gas_price,
            gas_limit: self.config.gas_limit,
            to: TxKind::Call(endpoint.contract),
            value: U256::ZERO,
            input: calldata,
        };

        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| SubmissionError::Signing(e.to_string()))?;
        let raw = TxEnvelope::Legacy(tx.into_signed(signature)).encoded_2718();

        endpoint
            .client
            .submit_signed_call(&raw)
            .await
            .map_err(|e| {
                let text = e.to_string();
                if is_nonce_conflict(&text) {
                    SubmissionError::NonceConflict(text)
                } else {
                    SubmissionError::Rejected(text)
                }
            })
    }

    /// Wait out the confirmation window. Polling failures leave the
    /// transaction pending rather than failing the submission; the chain
    /// may still include it.
    async fn confirm(&self, endpoint: &ChainEndpoint, tx_hash: B256) -> ConfirmationStatus {
        if !self.config.wait_for_receipt {
            return ConfirmationStatus::Pending;
        }

        match endpoint
            .client
            .wait_for_confirmation(tx_hash, self.config.confirmation_timeout)
            .await
        {
            Ok(status) => {
                if status == ConfirmationStatus::Pending {
                    warn!(
                        chain = %endpoint.role,
                        tx_hash = %tx_hash,
                        timeout_secs = self.config.confirmation_timeout.as_secs(),
                        "No receipt before timeout; leaving transaction pending"
                    );
                } else {
                    debug!(
                        chain = %endpoint.role,
                        tx_hash = %tx_hash,
                        status = %status,
                        "Receipt resolved"
                    );
                }
                status
            }
            Err(e) => {
                warn!(
                    chain = %endpoint.role,
                    tx_hash = %tx_hash,
                    error = %e,
                    "Receipt polling failed; leaving transaction pending"
                );
                ConfirmationStatus::Pending
            }
        }
    }
}

/// ABI-encode the target function for a relay call.
pub fn encode_call(call: &RelayCall) -> Bytes {
    match call.kind {
        CallKind::Wrap => DestinationBridge::wrapCall {
            token: call.asset,
            recipient: call.recipient,
            amount: call.amount,
        }
        .abi_encode()
        .into(),
        CallKind::Withdraw => SourceBridge::withdrawCall {
            token: call.asset,
            to: call.recipient,
            amount: call.amount,
        }
        .abi_encode()
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChainRole;

    fn config() -> SubmitterConfig {
        SubmitterConfig {
            gas_limit: 300_000,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
            wait_for_receipt: true,
            confirmation_timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_nonce_conflict_classification() {
        assert!(is_nonce_conflict("nonce too low"));
        assert!(is_nonce_conflict("Nonce too HIGH: expected 5"));
        assert!(is_nonce_conflict("invalid nonce for account"));
        assert!(is_nonce_conflict("already known"));
        assert!(is_nonce_conflict("replacement transaction underpriced"));
        assert!(is_nonce_conflict(
            "Failed to send raw transaction: nonce too low"
        ));

        assert!(!is_nonce_conflict("insufficient funds for gas"));
        assert!(!is_nonce_conflict("execution reverted"));
        assert!(!is_nonce_conflict("connection refused"));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = config();
        assert_eq!(config.backoff_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_millis(1_000));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_millis(2_000));
        assert_eq!(config.backoff_for_attempt(5), Duration::from_millis(10_000)); // capped
        assert_eq!(
            config.backoff_for_attempt(30),
            Duration::from_millis(10_000)
        );
    }

    #[test]
    fn test_encode_call_picks_the_bound_function() {
        let wrap = encode_call(&RelayCall {
            target: ChainRole::Destination,
            kind: CallKind::Wrap,
            asset: Address::repeat_byte(0x11),
            recipient: Address::repeat_byte(0x22),
            amount: U256::from(9u64),
        });
        assert_eq!(&wrap[..4], DestinationBridge::wrapCall::SELECTOR);

        let withdraw = encode_call(&RelayCall {
            target: ChainRole::Source,
            kind: CallKind::Withdraw,
            asset: Address::repeat_byte(0x11),
            recipient: Address::repeat_byte(0x22),
            amount: U256::from(9u64),
        });
        assert_eq!(&withdraw[..4], SourceBridge::withdrawCall::SELECTOR);
    }

    #[test]
    fn test_encode_call_carries_event_fields() {
        let call = RelayCall {
            target: ChainRole::Destination,
            kind: CallKind::Wrap,
            asset: Address::repeat_byte(0x11),
            recipient: Address::repeat_byte(0x22),
            amount: U256::from(1_000u64),
        };
        let decoded =
            DestinationBridge::wrapCall::abi_decode(&encode_call(&call), true).unwrap();
        assert_eq!(decoded.token, call.asset);
        assert_eq!(decoded.recipient, call.recipient);
        assert_eq!(decoded.amount, call.amount);
    }
}
