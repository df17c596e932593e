//! Chain registry: resolves a chain role to a connected endpoint with its
//! contract binding.
//!
//! Contract addresses and interface schemas come from a role-keyed JSON
//! document on disk (`contract_info.json` by default).

use std::fs;
use std::str::FromStr;
use std::sync::Arc;

use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use serde::Deserialize;

use crate::client::{EvmClient, LedgerClient};
use crate::config::Config;
use crate::error::RelayError;
use crate::translator;
use crate::types::ChainRole;

/// One entry in the contract-info document.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractEntry {
    pub address: String,
    pub abi: JsonAbi,
}

/// The on-disk document, keyed by role name.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractStore {
    pub source: ContractEntry,
    pub destination: ContractEntry,
}

impl ContractStore {
    /// Load and parse the role-keyed contract document.
    pub fn load(path: &str) -> Result<Self, RelayError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("cannot read contract info '{}': {}", path, e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            RelayError::Config(format!("malformed contract info '{}': {}", path, e))
        })
    }

    pub fn entry(&self, role: ChainRole) -> &ContractEntry {
        match role {
            ChainRole::Source => &self.source,
            ChainRole::Destination => &self.destination,
        }
    }
}

/// A resolved chain endpoint. Immutable once created; the client handle is
/// shared, everything else is identity.
#[derive(Clone)]
pub struct ChainEndpoint {
    pub role: ChainRole,
    pub client: Arc<dyn LedgerClient>,
    pub contract: Address,
    pub chain_id: u64,
}

/// Resolves chain roles to endpoints.
pub struct ChainRegistry {
    source: ChainEndpoint,
    destination: ChainEndpoint,
}

impl ChainRegistry {
    /// Build both endpoints from configuration, validating each contract
    /// schema against the role table before anything touches the network.
    pub fn from_config(config: &Config) -> Result<Self, RelayError> {
        let store = ContractStore::load(&config.warden.contract_info_path)?;

        let source = Self::build_endpoint(
            ChainRole::Source,
            store.entry(ChainRole::Source),
            &config.source.rpc_url,
            config.source.chain_id,
        )?;
        let destination = Self::build_endpoint(
            ChainRole::Destination,
            store.entry(ChainRole::Destination),
            &config.destination.rpc_url,
            config.destination.chain_id,
        )?;

        Ok(Self::new(source, destination))
    }

    /// Assemble a registry from already-built endpoints.
    pub fn new(source: ChainEndpoint, destination: ChainEndpoint) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Resolve a role to its endpoint.
    pub fn resolve(&self, role: ChainRole) -> ChainEndpoint {
        match role {
            ChainRole::Source => self.source.clone(),
            ChainRole::Destination => self.destination.clone(),
        }
    }

    fn build_endpoint(
        role: ChainRole,
        entry: &ContractEntry,
        rpc_url: &str,
        chain_id: u64,
    ) -> Result<ChainEndpoint, RelayError> {
        validate_schema(role, &entry.abi)?;

        let contract = Address::from_str(&entry.address).map_err(|e| {
            RelayError::Config(format!(
                "invalid {} contract address '{}': {}",
                role, entry.address, e
            ))
        })?;

        let client = EvmClient::new(rpc_url)
            .map_err(|e| RelayError::Config(format!("cannot build {} client: {}", role, e)))?;

        Ok(ChainEndpoint {
            role,
            client: Arc::new(client),
            contract,
            chain_id,
        })
    }
}

/// A role's schema must declare the event that role emits and the call the
/// opposite role relays onto it.
fn validate_schema(role: ChainRole, abi: &JsonAbi) -> Result<(), RelayError> {
    let emitted = translator::binding_for(role);
    if !abi.events.contains_key(emitted.event_name) {
        return Err(RelayError::Config(format!(
            "{} contract schema does not declare event '{}'",
            role, emitted.event_name
        )));
    }

    let provided = translator::binding_for(role.opposite());
    let function_name = provided.call_kind.as_str();
    if !abi.functions.contains_key(function_name) {
        return Err(RelayError::Config(format!(
            "{} contract schema does not declare function '{}'",
            role, function_name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SOURCE_ABI: &str = r#"[
        {"type":"event","name":"Deposit","anonymous":false,"inputs":[
            {"name":"token","type":"address","indexed":true},
            {"name":"recipient","type":"address","indexed":true},
            {"name":"amount","type":"uint256","indexed":false}]},
        {"type":"function","name":"withdraw","stateMutability":"nonpayable","inputs":[
            {"name":"token","type":"address"},
            {"name":"to","type":"address"},
            {"name":"amount","type":"uint256"}],"outputs":[]}
    ]"#;

    const DESTINATION_ABI: &str = r#"[
        {"type":"event","name":"Unwrap","anonymous":false,"inputs":[
            {"name":"underlying_token","type":"address","indexed":true},
            {"name":"to","type":"address","indexed":true},
            {"name":"amount","type":"uint256","indexed":false}]},
        {"type":"function","name":"wrap","stateMutability":"nonpayable","inputs":[
            {"name":"token","type":"address"},
            {"name":"recipient","type":"address"},
            {"name":"amount","type":"uint256"}],"outputs":[]}
    ]"#;

    fn store_json(source_abi: &str, destination_abi: &str) -> String {
        format!(
            r#"{{
                "source": {{"address": "0x0000000000000000000000000000000000000101", "abi": {}}},
                "destination": {{"address": "0x0000000000000000000000000000000000000202", "abi": {}}}
            }}"#,
            source_abi, destination_abi
        )
    }

    fn write_store(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_store_load_parses_both_roles() {
        let file = write_store(&store_json(SOURCE_ABI, DESTINATION_ABI));
        let store = ContractStore::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(
            store.entry(ChainRole::Source).address,
            "0x0000000000000000000000000000000000000101"
        );
        assert!(store
            .entry(ChainRole::Source)
            .abi
            .events
            .contains_key("Deposit"));
        assert!(store
            .entry(ChainRole::Destination)
            .abi
            .functions
            .contains_key("wrap"));
    }

    #[test]
    fn test_store_load_missing_file_is_config_error() {
        let err = ContractStore::load("/nonexistent/contract_info.json").unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn test_store_load_missing_role_is_config_error() {
        let file = write_store(&format!(
            r#"{{"source": {{"address": "0x0000000000000000000000000000000000000101", "abi": {}}}}}"#,
            SOURCE_ABI
        ));
        let err = ContractStore::load(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
        assert!(err.to_string().contains("destination"));
    }

    #[test]
    fn test_schema_missing_event_rejected() {
        // Destination schema on the source slot lacks the Deposit event
        let store: ContractStore =
            serde_json::from_str(&store_json(DESTINATION_ABI, DESTINATION_ABI)).unwrap();
        let err = validate_schema(ChainRole::Source, &store.source.abi).unwrap_err();
        assert!(err.to_string().contains("Deposit"));
    }

    #[test]
    fn test_schema_missing_function_rejected() {
        let abi_without_withdraw = r#"[
            {"type":"event","name":"Deposit","anonymous":false,"inputs":[
                {"name":"token","type":"address","indexed":true},
                {"name":"recipient","type":"address","indexed":true},
                {"name":"amount","type":"uint256","indexed":false}]}
        ]"#;
        let store: ContractStore =
            serde_json::from_str(&store_json(abi_without_withdraw, DESTINATION_ABI)).unwrap();
        let err = validate_schema(ChainRole::Source, &store.source.abi).unwrap_err();
        assert!(err.to_string().contains("withdraw"));
    }

    #[test]
    fn test_schema_accepts_matching_roles() {
        let store: ContractStore =
            serde_json::from_str(&store_json(SOURCE_ABI, DESTINATION_ABI)).unwrap();
        assert!(validate_schema(ChainRole::Source, &store.source.abi).is_ok());
        assert!(validate_schema(ChainRole::Destination, &store.destination.abi).is_ok());
    }
}
