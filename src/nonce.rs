//! Local nonce reservation for the warden signer.
//!
//! The chain's pending transaction count anchors the sequence; reservations
//! advance a local high-water mark so concurrent submissions from one
//! process stay contiguous. Releasing a reservation drops the anchor, so
//! the next reservation re-reads the chain and fills any gap a failed
//! dispatch left behind.

use std::collections::HashMap;

use alloy::primitives::Address;
use eyre::Result;
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::LedgerClient;

#[derive(Debug, Default, Clone, Copy)]
struct NonceSlot {
    /// Next nonce to hand out while the slot is anchored.
    next: u64,
    /// False until seeded from the chain, and again after a release.
    anchored: bool,
}

/// Tracks reserved nonces per signing address.
#[derive(Default)]
pub struct NonceTracker {
    slots: Mutex<HashMap<Address, NonceSlot>>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next nonce for `address`.
    pub async fn reserve(&self, client: &dyn LedgerClient, address: Address) -> Result<u64> {
        let pending = client.pending_transaction_count(address).await?;
        Ok(self.reserve_anchored(address, pending).await)
    }

    /// Merge a fresh pending count into the slot and hand out one nonce.
    /// An anchored slot never moves backwards past its own reservations.
    async fn reserve_anchored(&self, address: Address, pending: u64) -> u64 {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(address).or_default();

        let nonce = if slot.anchored {
            pending.max(slot.next)
        } else {
            pending
        };
        slot.next = nonce + 1;
        slot.anchored = true;

        debug!(address = %address, nonce, pending, "Reserved nonce");
        nonce
    }

    /// Record a nonce as consumed on chain.
    pub async fn commit(&self, address: Address, nonce: u64) {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(address).or_default();
        slot.next = slot.next.max(nonce + 1);
    }

    /// Return a reserved nonce that never reached the chain. The slot loses
    /// its anchor, forcing the next reservation back to the pending count.
    pub async fn release(&self, address: Address, nonce: u64) {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(address).or_default();
        if slot.next == nonce + 1 {
            slot.next = nonce;
        }
        slot.anchored = false;
        debug!(address = %address, nonce, "Released nonce");
    }
}
