//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! builder. All types derive Serde traits for deserialization from config
//! files.

use serde::{Deserialize, Serialize};

/// Root configuration for the confidential block builder.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BuilderConfig {
    /// Confidential-compute chain connection settings.
    pub chain: ChainConfig,

    /// Beacon node event stream settings.
    pub beacon: BeaconConfig,

    /// Duty-registry (relay) settings.
    pub relay: RelayConfig,

    /// Block-build job settings.
    pub job: JobConfig,
}

/// Connection settings for the confidential-compute chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Expected chain ID; submission aborts on mismatch.
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Maximum time to wait for a submitted transaction to be mined.
    pub confirmation_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 424_242,
            rpc_timeout_secs: 10,
            confirmation_timeout_secs: 60,
        }
    }
}

/// Beacon node event stream settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Beacon node base URL; the listener subscribes to its
    /// `payload_attributes` event topic.
    pub url: String,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5052".to_string(),
        }
    }
}

/// Duty-registry (relay) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Relay base URL; queried for the validator registered to a slot.
    pub url: String,

    /// Lookup request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9062".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Block-build job settings.
///
/// Gas economics are fixed for this transaction class; they live here so
/// no call site carries literals.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JobConfig {
    /// Address of the node authorized to execute confidentially.
    pub execution_node: String,

    /// Address of the block-bid contract. May be overridden per run on
    /// the command line.
    pub builder_contract: String,

    /// Gas limit for every record.
    pub gas: u64,

    /// Gas price in gwei for every record.
    pub gas_price_gwei: u64,

    /// Addresses allowed to read the confidential payload of a bid.
    pub allowed_peekers: Vec<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            execution_node: String::new(),
            builder_contract: String::new(),
            gas: 10_000_000,
            gas_price_gwei: 20,
            allowed_peekers: Vec::new(),
        }
    }
}
