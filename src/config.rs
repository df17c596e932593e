use eyre::{eyre, Result, WrapErr};
use std::env;
use std::fmt;
use std::path::Path;

/// Main configuration for the warden
#[derive(Debug, Clone)]
pub struct Config {
    pub source: EndpointConfig,
    pub destination: EndpointConfig,
    pub warden: WardenConfig,
    pub relay: RelayConfig,
    /// Bind address for the health/metrics server (watch mode only)
    pub metrics_addr: String,
}

/// RPC endpoint for one chain role
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub rpc_url: String,
    pub chain_id: u64,
}

/// Signing account configuration
#[derive(Clone)]
pub struct WardenConfig {
    pub private_key: String,
    /// Path to the role-keyed contract document
    pub contract_info_path: String,
}

/// Custom Debug that redacts private_key to prevent accidental log leakage.
impl fmt::Debug for WardenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WardenConfig")
            .field("private_key", &"<redacted>")
            .field("contract_info_path", &self.contract_info_path)
            .finish()
    }
}

/// Relay engine tuning
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Lookback window in blocks; each pass scans [latest - window, latest]
    pub scan_window: u64,
    /// Fixed gas ceiling per relay call
    pub gas_limit: u64,
    /// Submission attempts per event on nonce conflicts
    pub retry_attempts: u32,
    /// Initial backoff between nonce-conflict retries
    pub retry_delay_ms: u64,
    /// Wait for a receipt after dispatch, or fire and forget
    pub wait_for_receipt: bool,
    /// Receipt wait ceiling; expiry reports the call as pending
    pub confirmation_timeout_secs: u64,
    /// Pass spacing in watch mode
    pub poll_interval_ms: u64,
}

/// Default functions
fn default_scan_window() -> u64 {
    5
}

fn default_gas_limit() -> u64 {
    300_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    500
}

fn default_wait_for_receipt() -> bool {
    true
}

fn default_confirmation_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_contract_info_path() -> String {
    "contract_info.json".to_string()
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

impl Config {
    /// Load configuration from environment variables
    /// Loads .env file if present, then reads from environment
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env").or_else(|_| Self::load_from_env())
    }

    /// Load from a specific .env file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        Self::load_from_env()
    }

    /// Load configuration from environment variables
    fn load_from_env() -> Result<Self> {
        let source = EndpointConfig {
            rpc_url: env::var("SOURCE_RPC_URL")
                .map_err(|_| eyre!("SOURCE_RPC_URL environment variable is required"))?,
            chain_id: env::var("SOURCE_CHAIN_ID")
                .map_err(|_| eyre!("SOURCE_CHAIN_ID environment variable is required"))?
                .parse()
                .wrap_err("SOURCE_CHAIN_ID must be a valid u64")?,
        };

        let destination = EndpointConfig {
            rpc_url: env::var("DESTINATION_RPC_URL")
                .map_err(|_| eyre!("DESTINATION_RPC_URL environment variable is required"))?,
            chain_id: env::var("DESTINATION_CHAIN_ID")
                .map_err(|_| eyre!("DESTINATION_CHAIN_ID environment variable is required"))?
                .parse()
                .wrap_err("DESTINATION_CHAIN_ID must be a valid u64")?,
        };

        let warden = WardenConfig {
            private_key: env::var("WARDEN_PRIVATE_KEY")
                .map_err(|_| eyre!("WARDEN_PRIVATE_KEY environment variable is required"))?,
            contract_info_path: env::var("CONTRACT_INFO_PATH")
                .unwrap_or_else(|_| default_contract_info_path()),
        };

        let relay = RelayConfig {
            scan_window: env::var("SCAN_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_scan_window()),
            gas_limit: env::var("GAS_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_gas_limit()),
            retry_attempts: env::var("RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_retry_attempts()),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_retry_delay()),
            wait_for_receipt: env::var("WAIT_FOR_RECEIPT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_wait_for_receipt()),
            confirmation_timeout_secs: env::var("CONFIRMATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_confirmation_timeout()),
            poll_interval_ms: env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_poll_interval()),
        };

        let metrics_addr = env::var("METRICS_ADDR").unwrap_or_else(|_| default_metrics_addr());

        let config = Config {
            source,
            destination,
            warden,
            relay,
            metrics_addr,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.source.rpc_url.is_empty() {
            return Err(eyre!("source.rpc_url cannot be empty"));
        }

        if self.destination.rpc_url.is_empty() {
            return Err(eyre!("destination.rpc_url cannot be empty"));
        }

        if self.warden.private_key.len() != 66 || !self.warden.private_key.starts_with("0x") {
            return Err(eyre!(
                "warden.private_key must be 66 chars (0x + 64 hex chars)"
            ));
        }

        if hex::decode(&self.warden.private_key[2..]).is_err() {
            return Err(eyre!("warden.private_key must be valid hex"));
        }

        if self.warden.contract_info_path.is_empty() {
            return Err(eyre!("warden.contract_info_path cannot be empty"));
        }

        if self.relay.retry_attempts == 0 {
            return Err(eyre!("relay.retry_attempts must be at least 1"));
        }

        if self.relay.gas_limit == 0 {
            return Err(eyre!("relay.gas_limit cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            source: EndpointConfig {
                rpc_url: "http://localhost:8545".to_string(),
                chain_id: 43113,
            },
            destination: EndpointConfig {
                rpc_url: "http://localhost:8546".to_string(),
                chain_id: 97,
            },
            warden: WardenConfig {
                private_key:
                    "0x0000000000000000000000000000000000000000000000000000000000000001"
                        .to_string(),
                contract_info_path: "contract_info.json".to_string(),
            },
            relay: RelayConfig {
                scan_window: 5,
                gas_limit: 300_000,
                retry_attempts: 3,
                retry_delay_ms: 500,
                wait_for_receipt: true,
                confirmation_timeout_secs: 60,
                poll_interval_ms: 5000,
            },
            metrics_addr: "0.0.0.0:9090".to_string(),
        }
    }

    #[test]
    fn test_default_scan_window() {
        assert_eq!(default_scan_window(), 5);
    }

    #[test]
    fn test_default_gas_limit() {
        assert_eq!(default_gas_limit(), 300_000);
    }

    #[test]
    fn test_default_retry_attempts() {
        assert_eq!(default_retry_attempts(), 3);
    }

    #[test]
    fn test_default_retry_delay() {
        assert_eq!(default_retry_delay(), 500);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_private_key_validation() {
        let mut config = valid_config();

        config.warden.private_key = "0x123".to_string();
        assert!(config.validate().is_err());

        config.warden.private_key = format!("0x{}", "zz".repeat(32));
        assert!(config.validate().is_err());

        config.warden.private_key = "1".repeat(66);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_rpc_url_rejected() {
        let mut config = valid_config();
        config.source.rpc_url = String::new();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.destination.rpc_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retry_attempts_rejected() {
        let mut config = valid_config();
        config.relay.retry_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_debug_hides_private_key() {
        let config = valid_config();
        let rendered = format!("{:?}", config.warden);
        assert!(!rendered.contains("0000000000000001"));
        assert!(rendered.contains("<redacted>"));
    }
}
