//! Wire types for the beacon node's `payload_attributes` event topic.
//!
//! Beacon-API integers arrive as decimal strings; the `quoted_u64`
//! helper bridges them to native `u64` in both directions.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Serde adapter for u64 fields carried as decimal strings.
pub(crate) mod quoted_u64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }
}

/// Envelope of one `payload_attributes` server-sent event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PayloadAttributesEvent {
    #[serde(default)]
    pub version: String,
    pub data: BeaconEventData,
}

/// Slot metadata the orchestrator builds a block for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BeaconEventData {
    #[serde(with = "quoted_u64")]
    pub proposal_slot: u64,
    pub parent_block_hash: B256,
    #[serde(with = "quoted_u64")]
    pub parent_block_number: u64,
    pub payload_attributes: PayloadAttributes,
}

/// Execution payload attributes attached to the proposal event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PayloadAttributes {
    #[serde(with = "quoted_u64")]
    pub timestamp: u64,
    pub prev_randao: B256,
    #[serde(default)]
    pub suggested_fee_recipient: Option<Address>,
    #[serde(default)]
    pub withdrawals: Vec<Withdrawal>,
}

/// One expected withdrawal in the proposed block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Withdrawal {
    #[serde(with = "quoted_u64")]
    pub index: u64,
    #[serde(with = "quoted_u64")]
    pub validator_index: u64,
    pub address: Address,
    #[serde(with = "quoted_u64")]
    pub amount: u64,
}
