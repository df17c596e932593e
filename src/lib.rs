//! Bridge Warden - Library interface
//!
//! Re-exports internal modules for use in integration tests.

pub mod api;
pub mod client;
pub mod config;
pub mod contracts;
pub mod dedup;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod nonce;
pub mod registry;
pub mod scanner;
pub mod submitter;
pub mod translator;
pub mod types;
