//! Bridge contract interfaces for the two chains.
//!
//! Uses alloy's sol! macro to generate type-safe bindings. Event decoding
//! in the scanner parses topics/data by hand; these declarations drive
//! call encoding and document the on-chain surface.

use alloy::primitives::{keccak256, B256};
use alloy::sol;

sol! {
    /// Bridge face deployed on the source chain. Users lock the underlying
    /// asset (emitting `Deposit`); the warden releases it via `withdraw`.
    contract SourceBridge {
        event Deposit(address indexed token, address indexed recipient, uint256 amount);

        function withdraw(address token, address to, uint256 amount) external;
    }

    /// Bridge face deployed on the destination chain. Users burn wrapped
    /// assets (emitting `Unwrap`); the warden mints via `wrap`.
    contract DestinationBridge {
        event Unwrap(address indexed underlying_token, address indexed to, uint256 amount);

        function wrap(address token, address recipient, uint256 amount) external;
    }

    /// OpenZeppelin-style role check exposed by both bridge faces.
    interface AccessControl {
        function hasRole(bytes32 role, address account) external view returns (bool);
    }
}

/// Compute the event signature hash for `Deposit(address,address,uint256)`
pub fn deposit_topic() -> B256 {
    keccak256(b"Deposit(address,address,uint256)")
}

/// Compute the event signature hash for `Unwrap(address,address,uint256)`
pub fn unwrap_topic() -> B256 {
    keccak256(b"Unwrap(address,address,uint256)")
}

/// Role the signing account must hold on the contract it withdraws from.
pub fn bridge_warden_role() -> B256 {
    keccak256(b"BRIDGE_WARDEN_ROLE")
}
