//! Keys of the content-addressed value store.
//!
//! ```text
//! [hash: 8][id: 2]
//! ```
//!
//! `hash` is the content hash of the value bytes. Values whose hashes collide
//! are told apart by `id`, which starts at 0 and is bumped in place until a
//! free slot is found.

use buffer::ByteBuffer;
use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use crate::error::{CodecError, Result};
use crate::reader::ByteReader;
use crate::value::value_hash;

const RECORD: &str = "dedup key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    hash: u64,
    id: u16,
}

impl DedupKey {
    pub const SERIALIZED_SIZE: usize = 8 + 2;
    pub const HASH_OFFSET: usize = 0;
    pub const ID_OFFSET: usize = 8;

    pub fn new(hash: u64, id: u16) -> Self {
        Self { hash, id }
    }

    /// First candidate key for a value: its content hash with id 0.
    pub fn for_value(value_bytes: &[u8]) -> Self {
        Self::new(value_hash(value_bytes), 0)
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[must_use]
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn serialize(&self, buf: &mut ByteBuffer) -> Result<()> {
        if buf.remaining() < Self::SERIALIZED_SIZE {
            return Err(CodecError::overflow(buf, Self::SERIALIZED_SIZE));
        }
        buf.put_u64(self.hash)?;
        buf.put_u16(self.id)?;
        buf.flip();
        Ok(())
    }

    pub fn deserialize(bytes: &[u8]) -> Result<DedupKey> {
        let mut rdr = ByteReader::new(RECORD, bytes);
        let hash = rdr.u64()?;
        let id = rdr.u16()?;
        rdr.finish()?;
        Ok(DedupKey { hash, id })
    }

    pub fn extract_hash(bytes: &[u8]) -> Result<u64> {
        CodecError::ensure_len(RECORD, bytes, Self::ID_OFFSET)?;
        Ok(BigEndian::read_u64(&bytes[Self::HASH_OFFSET..Self::ID_OFFSET]))
    }

    pub fn extract_id(bytes: &[u8]) -> Result<u16> {
        CodecError::ensure_len(RECORD, bytes, Self::SERIALIZED_SIZE)?;
        Ok(BigEndian::read_u16(&bytes[Self::ID_OFFSET..Self::SERIALIZED_SIZE]))
    }

    /// Whether two encoded keys carry the same content hash, ids ignored.
    ///
    /// Used when probing for "any entry with this hash" before resolving a
    /// collision; full equality is plain byte equality.
    pub fn hash_eq(a: &[u8], b: &[u8]) -> Result<bool> {
        Ok(Self::extract_hash(a)? == Self::extract_hash(b)?)
    }

    /// Bumps the id of an encoded key in place, returning the new id.
    ///
    /// Fails, leaving the bytes untouched, once every id is used.
    pub fn increment_id(bytes: &mut [u8]) -> Result<u16> {
        let current = Self::extract_id(bytes)?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| {
                CodecError::range("dedup key id", i128::from(u16::MAX) + 1, 0, i128::from(u16::MAX))
            })?;
        BigEndian::write_u16(&mut bytes[Self::ID_OFFSET..Self::SERIALIZED_SIZE], next);
        trace!(id = next, "dedup key id incremented");
        Ok(next)
    }

    /// Overwrites the id of an encoded key in place.
    pub fn set_id(bytes: &mut [u8], id: u16) -> Result<()> {
        CodecError::ensure_len(RECORD, bytes, Self::SERIALIZED_SIZE)?;
        BigEndian::write_u16(&mut bytes[Self::ID_OFFSET..Self::SERIALIZED_SIZE], id);
        Ok(())
    }
}
