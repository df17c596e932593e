//! Common types for the relay pipeline.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{keccak256, Address, B256, U256};
use serde::Serialize;

use crate::error::RelayError;

/// Logical role of a configured chain. Exactly two exist; there is never
/// a third value past the CLI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainRole {
    Source,
    Destination,
}

impl ChainRole {
    /// Get the role as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainRole::Source => "source",
            ChainRole::Destination => "destination",
        }
    }

    /// The chain a relayed call lands on.
    pub fn opposite(&self) -> ChainRole {
        match self {
            ChainRole::Source => ChainRole::Destination,
            ChainRole::Destination => ChainRole::Source,
        }
    }
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChainRole {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(ChainRole::Source),
            "destination" => Ok(ChainRole::Destination),
            other => Err(RelayError::InvalidRole(other.to_string())),
        }
    }
}

/// A decoded bridge event, normalized across both chains.
///
/// Source chains emit `Deposit(token, recipient, amount)` and destination
/// chains emit `Unwrap(underlying_token, to, amount)`; both collapse into
/// the same asset/recipient/amount triple here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvent {
    pub origin: ChainRole,
    pub asset: Address,
    pub recipient: Address,
    pub amount: U256,
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
}

impl DomainEvent {
    /// Stable relay identifier: keccak256(tx_hash || log_index).
    ///
    /// Block position is not part of the id; a reorged copy of the same
    /// origin transaction keeps its id.
    pub fn relay_id(&self) -> [u8; 32] {
        let mut buf = [0u8; 40];
        buf[..32].copy_from_slice(self.tx_hash.as_slice());
        buf[32..].copy_from_slice(&self.log_index.to_be_bytes());
        keccak256(buf).0
    }
}

/// Which bridge function a relayed event maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Wrap,
    Withdraw,
}

impl CallKind {
    /// Solidity function name on the target contract.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Wrap => "wrap",
            CallKind::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A state-changing call to submit on the target chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCall {
    pub target: ChainRole,
    pub kind: CallKind,
    pub asset: Address,
    pub recipient: Address,
    pub amount: U256,
}

/// How far a dispatched transaction got toward inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Failed,
}

impl ConfirmationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationStatus::Pending => "pending",
            ConfirmationStatus::Confirmed => "confirmed",
            ConfirmationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one dispatched relay call.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub tx_hash: B256,
    pub status: ConfirmationStatus,
    pub nonce: u64,
    /// Attempts consumed, counting the successful one.
    pub attempts: u32,
}

/// Per-event outcome inside a pass report.
#[derive(Debug)]
pub enum EventOutcome {
    /// Call dispatched; status says how far confirmation got.
    Relayed {
        event: DomainEvent,
        result: SubmissionResult,
    },
    /// Relay id already dispatched this process lifetime.
    AlreadyRelayed { event: DomainEvent },
    /// Event stays in the window and is retried on the next pass.
    Failed {
        event: DomainEvent,
        error: RelayError,
    },
}

/// Summary of one scan-and-relay pass.
#[derive(Debug)]
pub struct PassReport {
    pub role: ChainRole,
    pub from_block: u64,
    pub to_block: u64,
    pub outcomes: Vec<EventOutcome>,
}

impl PassReport {
    pub fn relayed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EventOutcome::Relayed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EventOutcome::AlreadyRelayed { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EventOutcome::Failed { .. }))
            .count()
    }
}
