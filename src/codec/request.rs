//! The outer `0x43` request: signed record plus confidential payload.

use alloy::primitives::{keccak256, Bytes};
use alloy::rlp::{BufMut, Decodable, Encodable, Header};

use crate::codec::record::{ConfidentialComputeRecord, SignedRecord};
use crate::codec::{CodecError, CONFIDENTIAL_COMPUTE_REQUEST_TYPE};

/// The submitted transaction: a signed record and the confidential bytes
/// the record's `confidential_inputs_hash` commits to.
///
/// Construction enforces the hash binding; an execution node performs the
/// same check on its side and rejects requests that fail it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidentialComputeRequest {
    record: SignedRecord,
    confidential_data: Bytes,
}

impl ConfidentialComputeRequest {
    pub fn new(record: SignedRecord, confidential_data: Bytes) -> Result<Self, CodecError> {
        let expected = record.record().confidential_inputs_hash;
        let actual = keccak256(&confidential_data);
        if actual != expected {
            return Err(CodecError::InputsHashMismatch { expected, actual });
        }
        Ok(Self {
            record,
            confidential_data,
        })
    }

    pub fn record(&self) -> &SignedRecord {
        &self.record
    }

    pub fn confidential_data(&self) -> &Bytes {
        &self.confidential_data
    }

    /// Check that a payload hashes to a record's inputs hash, without
    /// constructing a request. Independent verifiers use this on decoded
    /// wire bytes.
    pub fn verify_inputs_binding(record: &ConfidentialComputeRecord, payload: &[u8]) -> bool {
        keccak256(payload) == record.confidential_inputs_hash
    }

    /// Encode to the `0x43`-prefixed wire form:
    /// `0x43 || rlp([[record fields...], confidential_data])`.
    pub fn encode(&self) -> Bytes {
        let record_fields_length = self.record.fields_length();
        let record_header = Header {
            list: true,
            payload_length: record_fields_length,
        };
        let payload_length =
            record_header.length() + record_fields_length + self.confidential_data.length();

        let mut buf = Vec::with_capacity(payload_length + 4);
        buf.put_u8(CONFIDENTIAL_COMPUTE_REQUEST_TYPE);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut buf);
        record_header.encode(&mut buf);
        self.record.encode_fields(&mut buf);
        self.confidential_data.encode(&mut buf);
        buf.into()
    }

    /// Decode the `0x43`-prefixed wire form.
    ///
    /// The hash binding is re-checked, so a decoded request carries the
    /// same guarantee as a constructed one.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let (&type_byte, rest) = bytes.split_first().ok_or(CodecError::Truncated)?;
        if type_byte != CONFIDENTIAL_COMPUTE_REQUEST_TYPE {
            return Err(CodecError::TypeByte {
                expected: CONFIDENTIAL_COMPUTE_REQUEST_TYPE,
                found: type_byte,
            });
        }

        let mut buf = rest;
        let outer = Header::decode(&mut buf)?;
        if !outer.list {
            return Err(CodecError::Rlp(alloy::rlp::Error::UnexpectedString));
        }
        if buf.len() < outer.payload_length {
            return Err(CodecError::Truncated);
        }
        if buf.len() > outer.payload_length {
            return Err(CodecError::TrailingBytes);
        }

        let record_header = Header::decode(&mut buf)?;
        if !record_header.list {
            return Err(CodecError::Rlp(alloy::rlp::Error::UnexpectedString));
        }
        if buf.len() < record_header.payload_length {
            return Err(CodecError::Truncated);
        }
        let (mut record_buf, mut remainder) = buf.split_at(record_header.payload_length);
        let record = SignedRecord::decode_fields(&mut record_buf)?;
        if !record_buf.is_empty() {
            return Err(CodecError::TrailingBytes);
        }

        let confidential_data = Bytes::decode(&mut remainder)?;
        if !remainder.is_empty() {
            return Err(CodecError::TrailingBytes);
        }

        Self::new(record, confidential_data)
    }
}
