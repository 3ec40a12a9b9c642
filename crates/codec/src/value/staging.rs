//! Values parked in the ingest holding area before commit.
//!
//! ```text
//! [type_id: 1][hash: 8][value bytes ...]
//! ```
//!
//! The header is enough to route and deduplicate a staged value, so decoding
//! the payload is left to the caller ([`StagingValue::to_ref_value`]).

use buffer::ByteBuffer;
use byteorder::{BigEndian, ByteOrder};
use std::borrow::Cow;

use super::{value_hash, RefValue, ValueSerdeRegistry};
use crate::dedup_key::DedupKey;
use crate::error::{CodecError, Result};
use crate::reader::ByteReader;

const RECORD: &str = "staging value";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingValue<'a> {
    type_id: u8,
    hash: u64,
    value: Cow<'a, [u8]>,
}

impl<'a> StagingValue<'a> {
    pub const TYPE_ID_OFFSET: usize = 0;
    pub const HASH_OFFSET: usize = 1;
    pub const VALUE_OFFSET: usize = 9;
    pub const HEADER_LEN: usize = Self::VALUE_OFFSET;

    /// Wraps already-encoded payload bytes. `hash` is trusted as given.
    pub fn new(type_id: u8, hash: u64, value: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            type_id,
            hash,
            value: value.into(),
        }
    }

    /// Encodes `value` through the registry and hashes the payload.
    ///
    /// The payload borrows from `value` when its codec allows.
    pub fn from_value(registry: &ValueSerdeRegistry, value: &'a RefValue<'_>) -> Result<Self> {
        let bytes = registry.to_bytes(value)?;
        Ok(Self {
            type_id: value.type_id(),
            hash: value_hash(&bytes),
            value: bytes,
        })
    }

    #[must_use]
    pub fn type_id(&self) -> u8 {
        self.type_id
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The encoded payload.
    #[must_use]
    pub fn value_bytes(&self) -> &[u8] {
        &self.value
    }

    /// Whether the stored hash is the hash of the payload.
    #[must_use]
    pub fn hash_matches(&self) -> bool {
        value_hash(&self.value) == self.hash
    }

    /// The first dedup key this value would be stored under.
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(self.hash, 0)
    }

    #[must_use]
    pub fn serialized_size(&self) -> usize {
        Self::HEADER_LEN + self.value.len()
    }

    pub fn serialize(&self, buf: &mut ByteBuffer) -> Result<()> {
        if buf.remaining() < self.serialized_size() {
            return Err(CodecError::overflow(buf, self.serialized_size()));
        }
        buf.put_u8(self.type_id)?;
        buf.put_u64(self.hash)?;
        buf.put_slice(&self.value)?;
        buf.flip();
        Ok(())
    }

    /// Wraps a staged record without copying its payload.
    pub fn deserialize(bytes: &'a [u8]) -> Result<StagingValue<'a>> {
        let mut rdr = ByteReader::new(RECORD, bytes);
        let type_id = rdr.u8()?;
        let hash = rdr.u64()?;
        Ok(Self::new(type_id, hash, rdr.rest()))
    }

    pub fn extract_type_id(bytes: &[u8]) -> Result<u8> {
        CodecError::ensure_len(RECORD, bytes, Self::HEADER_LEN)?;
        Ok(bytes[Self::TYPE_ID_OFFSET])
    }

    pub fn extract_hash(bytes: &[u8]) -> Result<u64> {
        CodecError::ensure_len(RECORD, bytes, Self::HEADER_LEN)?;
        Ok(BigEndian::read_u64(
            &bytes[Self::HASH_OFFSET..Self::VALUE_OFFSET],
        ))
    }

    /// The payload slice of a staged record.
    pub fn extract_value(bytes: &[u8]) -> Result<&[u8]> {
        CodecError::ensure_len(RECORD, bytes, Self::HEADER_LEN)?;
        Ok(&bytes[Self::VALUE_OFFSET..])
    }

    /// Decodes the payload with the codec registered for the header's type id.
    pub fn to_ref_value(&self, registry: &ValueSerdeRegistry) -> Result<RefValue<'_>> {
        registry.deserialize(self.type_id, &self.value)
    }

    pub fn into_owned(self) -> StagingValue<'static> {
        StagingValue {
            type_id: self.type_id,
            hash: self.hash,
            value: Cow::Owned(self.value.into_owned()),
        }
    }
}
