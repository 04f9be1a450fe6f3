//! Confidential-compute typed transactions.
//!
//! # Data Flow
//! ```text
//! RecordBuilder
//!     → ConfidentialComputeRecord (unsigned, immutable)
//!     → Wallet::sign_record → SignedRecord
//!     → ConfidentialComputeRequest (record + confidential payload)
//!     → wire bytes → eth_sendRawTransaction
//! ```
//!
//! # Wire Contract
//! - Type byte `0x42`: bare signed record.
//! - Type byte `0x43`: full request (record list + confidential payload).
//! - All integers are canonical RLP: minimal big-endian, no leading
//!   zeros, zero is the empty byte string.
//! - `confidential_inputs_hash` must equal the keccak256 of the exact
//!   payload bytes carried by the request. The request constructor
//!   enforces this; execution nodes reject it independently.

pub mod record;
pub mod request;

pub use record::{ConfidentialComputeRecord, RecordBuilder, SignedRecord};
pub use request::ConfidentialComputeRequest;

use alloy::primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

/// EIP-2718 type byte for a bare signed record.
pub const CONFIDENTIAL_COMPUTE_RECORD_TYPE: u8 = 0x42;

/// EIP-2718 type byte for a full confidential-compute request.
pub const CONFIDENTIAL_COMPUTE_REQUEST_TYPE: u8 = 0x43;

/// Errors from encoding, decoding, or assembling confidential-compute
/// transactions.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A required record field was never set on the builder.
    #[error("record field not set: {0}")]
    MissingField(&'static str),

    /// The input did not start with the expected type byte.
    #[error("wrong transaction type byte: expected {expected:#04x}, found {found:#04x}")]
    TypeByte { expected: u8, found: u8 },

    /// The input ended before a complete transaction could be read.
    #[error("input truncated")]
    Truncated,

    /// Data left over after the final field of a well-formed payload.
    #[error("trailing bytes after transaction payload")]
    TrailingBytes,

    /// Malformed RLP (non-canonical integer, wrong item kind, bad length).
    #[error("rlp: {0}")]
    Rlp(#[from] alloy::rlp::Error),

    /// Signature v was not a y-parity value (0 or 1).
    #[error("invalid signature parity: {0}")]
    Parity(u8),

    /// The confidential payload does not hash to the record's
    /// `confidential_inputs_hash`.
    #[error("confidential inputs hash mismatch: record has {expected}, payload hashes to {actual}")]
    InputsHashMismatch { expected: B256, actual: B256 },

    /// Signature recovery failed.
    #[error("signature recovery: {0}")]
    Recovery(#[from] alloy::primitives::SignatureError),
}

/// Encoder for one chain's confidential-compute transactions.
///
/// Holds the chain parameters that are fixed for every record this tool
/// produces, so call sites never repeat them.
#[derive(Debug, Clone)]
pub struct TransactionCodec {
    chain_id: u64,
    gas: u64,
    gas_price: U256,
}

impl TransactionCodec {
    pub fn new(chain_id: u64, gas: u64, gas_price: U256) -> Self {
        Self {
            chain_id,
            gas,
            gas_price,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Build an unsigned record for a contract call.
    ///
    /// `confidential_inputs_hash` must be the keccak256 of the payload
    /// that will later accompany the record in the request.
    pub fn build_record(
        &self,
        nonce: u64,
        to: Address,
        data: Bytes,
        execution_node: Address,
        confidential_inputs_hash: B256,
    ) -> Result<ConfidentialComputeRecord, CodecError> {
        ConfidentialComputeRecord::builder()
            .chain_id(self.chain_id)
            .nonce(nonce)
            .to(to)
            .gas(self.gas)
            .gas_price(self.gas_price)
            .data(data)
            .execution_node(execution_node)
            .confidential_inputs_hash(confidential_inputs_hash)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    #[test]
    fn test_codec_carries_chain_params() {
        let codec = TransactionCodec::new(424_242, 10_000_000, U256::from(20_000_000_000u64));
        let record = codec
            .build_record(
                7,
                Address::repeat_byte(0x11),
                Bytes::from(vec![0xde, 0xad]),
                Address::repeat_byte(0x22),
                keccak256([]),
            )
            .unwrap();

        assert_eq!(record.chain_id, 424_242);
        assert_eq!(record.gas, 10_000_000);
        assert_eq!(record.gas_price, U256::from(20_000_000_000u64));
        assert_eq!(record.value, U256::ZERO);
    }
}
