//! Error types for the relay pipeline.
//!
//! Pass-level failures (config, scan) abort a pass; per-event failures
//! (decode, submission) are caught at the driver boundary and reported
//! without stopping the batch.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    // ========================================================================
    // Pass-Level Errors (abort the current pass)
    // ========================================================================
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid chain role '{0}', expected 'source' or 'destination'")]
    InvalidRole(String),

    #[error("scan failed: {0}")]
    Scan(String),

    // ========================================================================
    // Per-Event Errors (skip and log, never fatal to the batch)
    // ========================================================================
    #[error("malformed event log: {0}")]
    Decode(String),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Failures while building, signing, or dispatching a relay call.
///
/// Only nonce conflicts are retriable; everything else propagates to the
/// per-event boundary unchanged.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("signing failed: {0}")]
    Signing(String),

    #[error("nonce conflict: {0}")]
    NonceConflict(String),

    #[error("endpoint rejected transaction: {0}")]
    Rejected(String),

    #[error("transaction reverted: {tx_hash}")]
    Reverted { tx_hash: String },

    #[error("nonce conflict persisted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl SubmissionError {
    /// Whether the submitter may re-reserve a nonce and try again.
    pub fn is_retriable(&self) -> bool {
        matches!(self, SubmissionError::NonceConflict(_))
    }
}
