//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the wallet
//! transaction service. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// Full node connection settings.
    pub node: NodeConfig,

    /// Local wallet settings (addresses, approval gate).
    pub wallet: WalletSection,

    /// External request bridge settings.
    pub bridge: BridgeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Full node connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// REST endpoint of the primary node.
    pub rpc_url: String,

    /// Nodes tried in order when the primary is unreachable.
    pub failover_urls: Vec<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Seconds a submitted transaction stays in the pending list.
    pub pending_ttl_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:22973".to_string(),
            failover_urls: Vec::new(),
            request_timeout_secs: 10,
            pending_ttl_secs: 3600,
        }
    }
}

/// Address entry known to the wallet.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AddressEntry {
    /// Address hash (base58).
    pub hash: String,

    /// Hex-encoded public key.
    pub public_key: String,
}

/// Local wallet settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletSection {
    /// Require the wallet password before every send.
    pub password_required: bool,

    /// Argon2 PHC string of the wallet password.
    pub password_hash: Option<String>,

    /// Addresses available as transaction sources.
    pub addresses: Vec<AddressEntry>,
}

/// External request bridge settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Accept inbound session requests.
    pub enabled: bool,

    /// Approve requests without interaction.
    pub auto_approve: bool,

    /// Largest amount (native units, decimal) approved automatically.
    pub max_auto_approve_amount: Option<String>,

    /// Capacity of the inbound request queue.
    pub queue_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_approve: false,
            max_auto_approve_amount: None,
            queue_capacity: 32,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
