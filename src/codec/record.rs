//! Record construction, signing hash, and the bare `0x42` wire form.

use alloy::primitives::{keccak256, Address, Bytes, Signature, B256, U256};
use alloy::rlp::{BufMut, Decodable, Encodable, Header};

use crate::codec::{CodecError, CONFIDENTIAL_COMPUTE_RECORD_TYPE};

/// The inner transaction object that is hashed and signed.
///
/// Immutable once built. Signing never mutates a record: it is consumed
/// into a [`SignedRecord`] carrying the signature alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidentialComputeRecord {
    pub chain_id: u64,
    pub nonce: u64,
    pub to: Address,
    pub value: U256,
    pub gas: u64,
    pub gas_price: U256,
    pub data: Bytes,
    pub execution_node: Address,
    pub confidential_inputs_hash: B256,
}

impl ConfidentialComputeRecord {
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// Wire-order encoding of the unsigned fields: `nonce, gas_price,
    /// gas, to, value, data, execution_node, confidential_inputs_hash,
    /// chain_id`. Every consumer of the format shares this one table.
    fn encode_unsigned_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
        self.execution_node.encode(out);
        self.confidential_inputs_hash.encode(out);
        self.chain_id.encode(out);
    }

    fn unsigned_fields_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas.length()
            + self.to.length()
            + self.value.length()
            + self.data.length()
            + self.execution_node.length()
            + self.confidential_inputs_hash.length()
            + self.chain_id.length()
    }

    /// Hash the record's signature commits to:
    /// `keccak256(0x42 || rlp([unsigned fields]))`.
    pub fn signing_hash(&self) -> B256 {
        let payload_length = self.unsigned_fields_length();
        let mut buf = Vec::with_capacity(payload_length + 4);
        buf.put_u8(CONFIDENTIAL_COMPUTE_RECORD_TYPE);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut buf);
        self.encode_unsigned_fields(&mut buf);
        keccak256(&buf)
    }

    /// Attach a signature, consuming the unsigned record.
    pub fn into_signed(self, signature: Signature) -> SignedRecord {
        SignedRecord {
            record: self,
            signature,
        }
    }

    fn decode_fields(buf: &mut &[u8]) -> Result<Self, CodecError> {
        let nonce = u64::decode(buf)?;
        let gas_price = U256::decode(buf)?;
        let gas = u64::decode(buf)?;
        let to = Address::decode(buf)?;
        let value = U256::decode(buf)?;
        let data = Bytes::decode(buf)?;
        let execution_node = Address::decode(buf)?;
        let confidential_inputs_hash = B256::decode(buf)?;
        let chain_id = u64::decode(buf)?;
        Ok(Self {
            chain_id,
            nonce,
            to,
            value,
            gas,
            gas_price,
            data,
            execution_node,
            confidential_inputs_hash,
        })
    }
}

/// A record plus its ECDSA signature (r, s, y-parity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRecord {
    record: ConfidentialComputeRecord,
    signature: Signature,
}

impl SignedRecord {
    pub fn record(&self) -> &ConfidentialComputeRecord {
        &self.record
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn fields_length(&self) -> usize {
        self.record.unsigned_fields_length()
            + (self.signature.v() as u8).length()
            + self.signature.r().length()
            + self.signature.s().length()
    }

    pub(crate) fn encode_fields(&self, out: &mut dyn BufMut) {
        self.record.encode_unsigned_fields(out);
        (self.signature.v() as u8).encode(out);
        self.signature.r().encode(out);
        self.signature.s().encode(out);
    }

    pub(crate) fn decode_fields(buf: &mut &[u8]) -> Result<Self, CodecError> {
        let record = ConfidentialComputeRecord::decode_fields(buf)?;
        let v = u8::decode(buf)?;
        if v > 1 {
            return Err(CodecError::Parity(v));
        }
        let r = U256::decode(buf)?;
        let s = U256::decode(buf)?;
        Ok(Self {
            record,
            signature: Signature::new(r, s, v == 1),
        })
    }

    /// Encode to the bare `0x42`-prefixed wire form.
    pub fn encode(&self) -> Bytes {
        let payload_length = self.fields_length();
        let mut buf = Vec::with_capacity(payload_length + 4);
        buf.put_u8(CONFIDENTIAL_COMPUTE_RECORD_TYPE);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut buf);
        self.encode_fields(&mut buf);
        buf.into()
    }

    /// Decode the bare `0x42`-prefixed wire form.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let (&type_byte, rest) = bytes.split_first().ok_or(CodecError::Truncated)?;
        if type_byte != CONFIDENTIAL_COMPUTE_RECORD_TYPE {
            return Err(CodecError::TypeByte {
                expected: CONFIDENTIAL_COMPUTE_RECORD_TYPE,
                found: type_byte,
            });
        }

        let mut buf = rest;
        let header = Header::decode(&mut buf)?;
        if !header.list {
            return Err(CodecError::Rlp(alloy::rlp::Error::UnexpectedString));
        }
        if buf.len() < header.payload_length {
            return Err(CodecError::Truncated);
        }
        if buf.len() > header.payload_length {
            return Err(CodecError::TrailingBytes);
        }

        let signed = Self::decode_fields(&mut buf)?;
        if !buf.is_empty() {
            return Err(CodecError::TrailingBytes);
        }
        Ok(signed)
    }

    /// Recover the address that produced this record's signature.
    pub fn recover_signer(&self) -> Result<Address, CodecError> {
        Ok(self
            .signature
            .recover_address_from_prehash(&self.record.signing_hash())?)
    }
}

/// Step-wise record construction with field presence enforced at `build`.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    chain_id: Option<u64>,
    nonce: Option<u64>,
    to: Option<Address>,
    value: Option<U256>,
    gas: Option<u64>,
    gas_price: Option<U256>,
    data: Option<Bytes>,
    execution_node: Option<Address>,
    confidential_inputs_hash: Option<B256>,
}

impl RecordBuilder {
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Defaults to zero; confidential-compute calls move no funds.
    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    pub fn execution_node(mut self, execution_node: Address) -> Self {
        self.execution_node = Some(execution_node);
        self
    }

    pub fn confidential_inputs_hash(mut self, hash: B256) -> Self {
        self.confidential_inputs_hash = Some(hash);
        self
    }

    pub fn build(self) -> Result<ConfidentialComputeRecord, CodecError> {
        Ok(ConfidentialComputeRecord {
            chain_id: self.chain_id.ok_or(CodecError::MissingField("chain_id"))?,
            nonce: self.nonce.ok_or(CodecError::MissingField("nonce"))?,
            to: self.to.ok_or(CodecError::MissingField("to"))?,
            value: self.value.unwrap_or(U256::ZERO),
            gas: self.gas.ok_or(CodecError::MissingField("gas"))?,
            gas_price: self.gas_price.ok_or(CodecError::MissingField("gas_price"))?,
            data: self.data.ok_or(CodecError::MissingField("data"))?,
            execution_node: self
                .execution_node
                .ok_or(CodecError::MissingField("execution_node"))?,
            confidential_inputs_hash: self
                .confidential_inputs_hash
                .ok_or(CodecError::MissingField("confidential_inputs_hash"))?,
        })
    }
}
