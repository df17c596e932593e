//! Event scanning over a bounded lookback window.
//!
//! Each pass reads the chain tip, walks `[tip - window, tip]` for the
//! origin role's event, and decodes raw logs into domain events. Malformed
//! logs are logged and skipped; they never abort the window.

use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;

use crate::error::RelayError;
use crate::registry::ChainEndpoint;
use crate::translator;
use crate::types::{ChainRole, DomainEvent};

/// Decoded contents of one scanned window.
#[derive(Debug)]
pub struct ScannedWindow {
    pub from_block: u64,
    pub to_block: u64,
    pub events: Vec<DomainEvent>,
}

/// Scans a chain endpoint for relayable events.
pub struct EventScanner {
    window: u64,
}

impl EventScanner {
    pub fn new(window: u64) -> Self {
        Self { window }
    }

    /// Scan the lookback window on `endpoint` for its bound event.
    ///
    /// Events come back ordered by block number, then log index.
    pub async fn scan(&self, endpoint: &ChainEndpoint) -> Result<ScannedWindow, RelayError> {
        let to_block = endpoint
            .client
            .latest_block_number()
            .await
            .map_err(|e| RelayError::Scan(format!("cannot read chain tip: {}", e)))?;
        let from_block = to_block.saturating_sub(self.window);

        let binding = translator::binding_for(endpoint.role);
        tracing::debug!(
            chain = %endpoint.role,
            event = binding.event_name,
            from_block,
            to_block,
            "Scanning window"
        );

        let logs = endpoint
            .client
            .get_logs(endpoint.contract, binding.event_topic(), from_block, to_block)
            .await
            .map_err(|e| RelayError::Scan(format!("log query failed: {}", e)))?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            match decode_event(endpoint.role, &log) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::error!(
                        chain = %endpoint.role,
                        tx_hash = ?log.transaction_hash,
                        log_index = ?log.log_index,
                        error = %e,
                        "Skipping malformed event log"
                    );
                }
            }
        }

        events.sort_by_key(|e| (e.block_number, e.log_index));

        Ok(ScannedWindow {
            from_block,
            to_block,
            events,
        })
    }
}

/// Decode one raw log into a domain event.
///
/// Both bound events share the same shape: two indexed address topics
/// (asset, recipient) and a single uint256 amount in the data.
pub fn decode_event(origin: ChainRole, log: &Log) -> Result<DomainEvent, RelayError> {
    let binding = translator::binding_for(origin);

    let topics = log.topics();
    if topics.len() < 3 {
        return Err(RelayError::Decode(format!(
            "expected 3 topics, got {}",
            topics.len()
        )));
    }
    if topics[0] != binding.event_topic() {
        return Err(RelayError::Decode(format!(
            "log signature does not match event '{}'",
            binding.event_name
        )));
    }

    let asset = Address::from_slice(&topics[1].as_slice()[12..]);
    let recipient = Address::from_slice(&topics[2].as_slice()[12..]);

    let data = log.data().data.as_ref();
    if data.len() < 32 {
        return Err(RelayError::Decode(format!(
            "event data too short: {} bytes",
            data.len()
        )));
    }
    let amount = U256::from_be_slice(&data[..32]);

    let tx_hash = log
        .transaction_hash
        .ok_or_else(|| RelayError::Decode("missing transaction hash".to_string()))?;
    let block_number = log
        .block_number
        .ok_or_else(|| RelayError::Decode("missing block number".to_string()))?;
    let log_index = log
        .log_index
        .ok_or_else(|| RelayError::Decode("missing log index".to_string()))?;

    Ok(DomainEvent {
        origin,
        asset,
        recipient,
        amount,
        block_number,
        tx_hash,
        log_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts;
    use alloy::primitives::{Bytes, LogData, B256};

    fn make_log(
        topic0: B256,
        asset: Address,
        recipient: Address,
        amount: U256,
        block_number: u64,
        tx_hash: B256,
        log_index: u64,
    ) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x01),
                data: LogData::new_unchecked(
                    vec![topic0, asset.into_word(), recipient.into_word()],
                    Bytes::copy_from_slice(&amount.to_be_bytes::<32>()),
                ),
            },
            block_hash: Some(B256::repeat_byte(0xbb)),
            block_number: Some(block_number),
            block_timestamp: None,
            transaction_hash: Some(tx_hash),
            transaction_index: Some(0),
            log_index: Some(log_index),
            removed: false,
        }
    }

    #[test]
    fn test_decode_deposit_log() {
        let asset = Address::repeat_byte(0x11);
        let recipient = Address::repeat_byte(0x22);
        let tx_hash = B256::repeat_byte(0xaa);
        let log = make_log(
            contracts::deposit_topic(),
            asset,
            recipient,
            U256::from(1_000u64),
            42,
            tx_hash,
            3,
        );

        let event = decode_event(ChainRole::Source, &log).unwrap();
        assert_eq!(event.origin, ChainRole::Source);
        assert_eq!(event.asset, asset);
        assert_eq!(event.recipient, recipient);
        assert_eq!(event.amount, U256::from(1_000u64));
        assert_eq!(event.block_number, 42);
        assert_eq!(event.tx_hash, tx_hash);
        assert_eq!(event.log_index, 3);
    }

    #[test]
    fn test_decode_unwrap_log() {
        let log = make_log(
            contracts::unwrap_topic(),
            Address::repeat_byte(0x33),
            Address::repeat_byte(0x44),
            U256::from(7u64),
            100,
            B256::repeat_byte(0xcc),
            0,
        );

        let event = decode_event(ChainRole::Destination, &log).unwrap();
        assert_eq!(event.origin, ChainRole::Destination);
        assert_eq!(event.amount, U256::from(7u64));
    }

    #[test]
    fn test_decode_rejects_wrong_signature() {
        let log = make_log(
            contracts::unwrap_topic(),
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            U256::from(1u64),
            42,
            B256::repeat_byte(0xaa),
            0,
        );

        let err = decode_event(ChainRole::Source, &log).unwrap_err();
        assert!(err.to_string().contains("Deposit"));
    }

    #[test]
    fn test_decode_rejects_missing_topics() {
        let mut log = make_log(
            contracts::deposit_topic(),
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            U256::from(1u64),
            42,
            B256::repeat_byte(0xaa),
            0,
        );
        log.inner.data = LogData::new_unchecked(
            vec![contracts::deposit_topic()],
            log.inner.data.data.clone(),
        );

        let err = decode_event(ChainRole::Source, &log).unwrap_err();
        assert!(matches!(err, RelayError::Decode(_)));
        assert!(err.to_string().contains("topics"));
    }

    #[test]
    fn test_decode_rejects_short_data() {
        let mut log = make_log(
            contracts::deposit_topic(),
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            U256::from(1u64),
            42,
            B256::repeat_byte(0xaa),
            0,
        );
        let topics = log.topics().to_vec();
        log.inner.data = LogData::new_unchecked(topics, Bytes::new());

        let err = decode_event(ChainRole::Source, &log).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_decode_rejects_pending_log_fields() {
        let mut log = make_log(
            contracts::deposit_topic(),
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            U256::from(1u64),
            42,
            B256::repeat_byte(0xaa),
            0,
        );
        log.block_number = None;

        let err = decode_event(ChainRole::Source, &log).unwrap_err();
        assert!(err.to_string().contains("block number"));
    }
}
