//! Role table: which event each chain emits and which call the relay makes
//! on the opposite chain in response.

use alloy::primitives::B256;

use crate::contracts;
use crate::types::{CallKind, ChainRole, DomainEvent, RelayCall};

/// The fixed pairing for one origin role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleBinding {
    /// Chain whose events this binding scans.
    pub origin: ChainRole,
    /// Event name emitted by the origin contract.
    pub event_name: &'static str,
    /// Call relayed in response.
    pub call_kind: CallKind,
    /// Chain that receives the call.
    pub target: ChainRole,
}

impl RoleBinding {
    /// topic0 of the bound event.
    pub fn event_topic(&self) -> B256 {
        match self.origin {
            ChainRole::Source => contracts::deposit_topic(),
            ChainRole::Destination => contracts::unwrap_topic(),
        }
    }
}

/// Resolve the binding for an origin role. The table is closed: deposits on
/// the source chain become wrap calls on the destination, unwraps on the
/// destination become withdraw calls on the source.
pub fn binding_for(origin: ChainRole) -> RoleBinding {
    match origin {
        ChainRole::Source => RoleBinding {
            origin: ChainRole::Source,
            event_name: "Deposit",
            call_kind: CallKind::Wrap,
            target: ChainRole::Destination,
        },
        ChainRole::Destination => RoleBinding {
            origin: ChainRole::Destination,
            event_name: "Unwrap",
            call_kind: CallKind::Withdraw,
            target: ChainRole::Source,
        },
    }
}

/// Map a scanned event to the call that settles it on the opposite chain.
/// Asset, recipient and amount carry over unchanged.
pub fn translate(event: &DomainEvent) -> RelayCall {
    let binding = binding_for(event.origin);
    RelayCall {
        target: binding.target,
        kind: binding.call_kind,
        asset: event.asset,
        recipient: event.recipient,
        amount: event.amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, B256, U256};

    fn event(origin: ChainRole) -> DomainEvent {
        DomainEvent {
            origin,
            asset: Address::repeat_byte(0x11),
            recipient: Address::repeat_byte(0x22),
            amount: U256::from(1_000u64),
            block_number: 42,
            tx_hash: B256::repeat_byte(0xaa),
            log_index: 3,
        }
    }

    #[test]
    fn test_source_binding_pairs_deposit_with_wrap() {
        let binding = binding_for(ChainRole::Source);
        assert_eq!(binding.event_name, "Deposit");
        assert_eq!(binding.call_kind, CallKind::Wrap);
        assert_eq!(binding.target, ChainRole::Destination);
        assert_eq!(binding.event_topic(), contracts::deposit_topic());
    }

    #[test]
    fn test_destination_binding_pairs_unwrap_with_withdraw() {
        let binding = binding_for(ChainRole::Destination);
        assert_eq!(binding.event_name, "Unwrap");
        assert_eq!(binding.call_kind, CallKind::Withdraw);
        assert_eq!(binding.target, ChainRole::Source);
        assert_eq!(binding.event_topic(), contracts::unwrap_topic());
    }

    #[test]
    fn test_translate_targets_opposite_chain() {
        let call = translate(&event(ChainRole::Source));
        assert_eq!(call.target, ChainRole::Destination);
        assert_eq!(call.kind, CallKind::Wrap);

        let call = translate(&event(ChainRole::Destination));
        assert_eq!(call.target, ChainRole::Source);
        assert_eq!(call.kind, CallKind::Withdraw);
    }

    #[test]
    fn test_translate_preserves_event_fields() {
        let source_event = event(ChainRole::Source);
        let call = translate(&source_event);
        assert_eq!(call.asset, source_event.asset);
        assert_eq!(call.recipient, source_event.recipient);
        assert_eq!(call.amount, source_event.amount);
    }
}
