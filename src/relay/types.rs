//! Wire types for the relay's validator duty registry.

use alloy::primitives::{Address, FixedBytes};
use serde::{Deserialize, Serialize};

use crate::beacon::types::quoted_u64;

/// BLS public key of a consensus-layer validator.
pub type BlsPubkey = FixedBytes<48>;

/// Resolved duty for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorMsg {
    pub pubkey: BlsPubkey,
    pub fee_recipient: Address,
    pub gas_limit: u64,
}

/// One entry of `GET /relay/v1/builder/validators`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct RegisteredValidator {
    #[serde(with = "quoted_u64")]
    pub slot: u64,
    pub entry: RegistrationEntry,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct RegistrationEntry {
    pub message: RegistrationMessage,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct RegistrationMessage {
    pub fee_recipient: Address,
    #[serde(with = "quoted_u64")]
    pub gas_limit: u64,
    pub pubkey: BlsPubkey,
}

impl From<RegisteredValidator> for ValidatorMsg {
    fn from(registered: RegisteredValidator) -> Self {
        let message = registered.entry.message;
        Self {
            pubkey: message.pubkey,
            fee_recipient: message.fee_recipient,
            gas_limit: message.gas_limit,
        }
    }
}
