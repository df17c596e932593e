//! Pass orchestration.
//!
//! One pass scans the origin chain's lookback window and relays every
//! decoded event to the opposite chain, producing one outcome per event.
//! Submission failures stay inside the event that caused them; only
//! configuration, role, and scan failures abort the pass.

use std::sync::Arc;

use alloy::sol_types::SolCall;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::contracts::{self, AccessControl};
use crate::dedup::RelayCache;
use crate::error::RelayError;
use crate::metrics;
use crate::nonce::NonceTracker;
use crate::registry::{ChainEndpoint, ChainRegistry};
use crate::scanner::EventScanner;
use crate::submitter::{SubmitterConfig, TransactionSubmitter};
use crate::translator;
use crate::types::{ChainRole, EventOutcome, PassReport};

/// Runs scan-and-relay passes against a pair of configured chains.
pub struct RelayDriver {
    registry: ChainRegistry,
    scanner: EventScanner,
    submitter: TransactionSubmitter,
    seen: RelayCache,
}

impl RelayDriver {
    pub fn new(
        registry: ChainRegistry,
        scanner: EventScanner,
        submitter: TransactionSubmitter,
        seen: RelayCache,
    ) -> Self {
        Self {
            registry,
            scanner,
            submitter,
            seen,
        }
    }

    /// Wire up a driver from configuration.
    pub fn from_config(config: &Config) -> Result<Self, RelayError> {
        let registry = ChainRegistry::from_config(config)?;
        let scanner = EventScanner::new(config.relay.scan_window);
        let nonces = Arc::new(NonceTracker::new());
        let submitter = TransactionSubmitter::new(
            &config.warden.private_key,
            SubmitterConfig::from_relay(&config.relay),
            nonces,
        )?;
        let seen = RelayCache::from_env();

        Ok(Self::new(registry, scanner, submitter, seen))
    }

    /// Run one pass with `origin` as the scanned chain.
    pub async fn run(&mut self, origin: ChainRole) -> Result<PassReport, RelayError> {
        let origin_endpoint = self.registry.resolve(origin);
        let target_endpoint = self.registry.resolve(origin.opposite());

        // Withdrawals move real funds on the source chain, so prove the
        // signer holds the warden role there before scanning anything.
        if origin == ChainRole::Destination {
            if let Err(e) = self.check_warden_role(&target_endpoint).await {
                metrics::record_error(origin.as_str(), "warden");
                return Err(e);
            }
        }

        let window = match self.scanner.scan(&origin_endpoint).await {
            Ok(window) => window,
            Err(e) => {
                metrics::record_error(origin.as_str(), "scan");
                return Err(e);
            }
        };
        metrics::record_scan(origin.as_str(), window.to_block, window.events.len());

        let mut outcomes = Vec::with_capacity(window.events.len());
        for event in window.events {
            let id = event.relay_id();
            if self.seen.contains(&id) {
                debug!(
                    chain = %origin,
                    tx_hash = %event.tx_hash,
                    log_index = event.log_index,
                    "Event already relayed; skipping"
                );
                metrics::record_skip(origin.as_str());
                outcomes.push(EventOutcome::AlreadyRelayed { event });
                continue;
            }

            let call = translator::translate(&event);
            info!(
                chain = %origin,
                kind = %call.kind,
                asset = %call.asset,
                recipient = %call.recipient,
                amount = %call.amount,
                tx_hash = %event.tx_hash,
                log_index = event.log_index,
                "Relaying event"
            );

            match self.submitter.submit(&target_endpoint, &call).await {
                Ok(result) => {
                    self.seen.insert(id);
                    metrics::record_call_submitted(call.target.as_str(), result.status.as_str());
                    if result.attempts > 1 {
                        metrics::record_retries(call.target.as_str(), result.attempts - 1);
                    }
                    outcomes.push(EventOutcome::Relayed { event, result });
                }
                Err(e) => {
                    error!(
                        chain = %origin,
                        tx_hash = %event.tx_hash,
                        log_index = event.log_index,
                        error = %e,
                        "Failed to relay event"
                    );
                    metrics::record_call_submitted(call.target.as_str(), "rejected");
                    metrics::record_error(call.target.as_str(), "submit");
                    outcomes.push(EventOutcome::Failed {
                        event,
                        error: RelayError::Submission(e),
                    });
                }
            }
        }

        let report = PassReport {
            role: origin,
            from_block: window.from_block,
            to_block: window.to_block,
            outcomes,
        };

        info!(
            chain = %origin,
            from_block = report.from_block,
            to_block = report.to_block,
            relayed = report.relayed_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            cache_entries = self.seen.len(),
            "Pass complete"
        );
        metrics::record_pass(origin.as_str());

        Ok(report)
    }

    /// Confirm the signer holds BRIDGE_WARDEN_ROLE on the call target.
    async fn check_warden_role(&self, target: &ChainEndpoint) -> Result<(), RelayError> {
        let account = self.submitter.signer_address();
        let calldata = AccessControl::hasRoleCall {
            role: contracts::bridge_warden_role(),
            account,
        }
        .abi_encode();

        let ret = target
            .client
            .call(target.contract, calldata.into())
            .await
            .map_err(|e| RelayError::Config(format!("warden role query failed: {}", e)))?;

        let granted = AccessControl::hasRoleCall::abi_decode_returns(&ret, true)
            .map_err(|e| {
                RelayError::Config(format!("warden role query returned malformed data: {}", e))
            })?
            ._0;

        if !granted {
            return Err(RelayError::Config(format!(
                "signer {} lacks BRIDGE_WARDEN_ROLE on the {} contract",
                account, target.role
            )));
        }

        debug!(signer = %account, chain = %target.role, "Warden role confirmed");
        Ok(())
    }
}
