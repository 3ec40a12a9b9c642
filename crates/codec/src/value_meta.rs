//! Metadata stored beside each deduplicated value.
//!
//! ```text
//! [type_id: 1][ref_count: 3]
//! ```
//!
//! `type_id` selects the value codec (see [`crate::value`]); `ref_count` is
//! the number of map entries sharing the value. The counter is a 24-bit
//! unsigned integer and never wraps: stepping past either end is an error.

use buffer::ByteBuffer;
use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use crate::error::{CodecError, Result};
use crate::reader::ByteReader;

/// Largest reference count a 3-byte counter holds.
pub const MAX_REF_COUNT: u32 = 0xFF_FFFF;

const RECORD: &str = "value meta";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueMeta {
    type_id: u8,
    ref_count: u32,
}

impl ValueMeta {
    pub const SERIALIZED_SIZE: usize = 1 + 3;
    pub const TYPE_ID_OFFSET: usize = 0;
    pub const REF_COUNT_OFFSET: usize = 1;

    pub fn new(type_id: u8, ref_count: u32) -> Result<Self> {
        check_ref_count(i128::from(ref_count))?;
        Ok(Self { type_id, ref_count })
    }

    #[must_use]
    pub fn type_id(&self) -> u8 {
        self.type_id
    }

    #[must_use]
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn serialize(&self, buf: &mut ByteBuffer) -> Result<()> {
        write_meta(buf, self.type_id, self.ref_count)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<ValueMeta> {
        let mut rdr = ByteReader::new(RECORD, bytes);
        let type_id = rdr.u8()?;
        let ref_count = rdr.u24()?;
        rdr.finish()?;
        Ok(ValueMeta { type_id, ref_count })
    }

    pub fn extract_type_id(bytes: &[u8]) -> Result<u8> {
        CodecError::ensure_len(RECORD, bytes, Self::REF_COUNT_OFFSET)?;
        Ok(bytes[Self::TYPE_ID_OFFSET])
    }

    pub fn extract_ref_count(bytes: &[u8]) -> Result<u32> {
        CodecError::ensure_len(RECORD, bytes, Self::SERIALIZED_SIZE)?;
        Ok(BigEndian::read_u24(
            &bytes[Self::REF_COUNT_OFFSET..Self::SERIALIZED_SIZE],
        ))
    }

    /// Copies `source` into `dest` with the reference count raised by one.
    ///
    /// The stored page is never touched; `dest` receives the new record and
    /// is flipped. Returns the new count.
    pub fn clone_with_increment(source: &[u8], dest: &mut ByteBuffer) -> Result<u32> {
        Self::clone_with_delta(source, dest, 1)
    }

    /// Copies `source` into `dest` with the reference count lowered by one.
    ///
    /// A count of zero cannot be decremented. Returns the new count.
    pub fn clone_with_decrement(source: &[u8], dest: &mut ByteBuffer) -> Result<u32> {
        Self::clone_with_delta(source, dest, -1)
    }

    fn clone_with_delta(source: &[u8], dest: &mut ByteBuffer, delta: i8) -> Result<u32> {
        CodecError::ensure_exact_len(RECORD, source, Self::SERIALIZED_SIZE)?;
        let type_id = Self::extract_type_id(source)?;
        let current = Self::extract_ref_count(source)?;
        let next = i128::from(current) + i128::from(delta);
        check_ref_count(next)?;
        // bounded to 0..=MAX_REF_COUNT by the check above
        let next = next as u32;
        write_meta(dest, type_id, next)?;
        trace!(type_id, from = current, to = next, "value ref count changed");
        Ok(next)
    }
}

fn check_ref_count(value: i128) -> Result<()> {
    if !(0..=i128::from(MAX_REF_COUNT)).contains(&value) {
        return Err(CodecError::range(
            "reference count",
            value,
            0,
            i128::from(MAX_REF_COUNT),
        ));
    }
    Ok(())
}

fn write_meta(buf: &mut ByteBuffer, type_id: u8, ref_count: u32) -> Result<()> {
    if buf.remaining() < ValueMeta::SERIALIZED_SIZE {
        return Err(CodecError::overflow(buf, ValueMeta::SERIALIZED_SIZE));
    }
    buf.put_u8(type_id)?;
    buf.put_u24(ref_count)?;
    buf.flip();
    Ok(())
}
