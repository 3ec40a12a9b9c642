//! Numeric-range keys: a half-open interval `[from, to)` inside one map.
//!
//! ```text
//! [uid: 4][from: 8][to: 8]
//! ```
//!
//! Bounds are signed 64-bit integers stored big-endian with the sign bit
//! flipped, so unsigned byte-wise comparison of encoded keys (the storage
//! engine's key order) agrees with numeric order, negative bounds included.
//! Within one map, keys therefore sort by `from`, then by `to`.

use buffer::ByteBuffer;
use byteorder::{BigEndian, ByteOrder};

use crate::error::{CodecError, Result};
use crate::uid::{Uid, UidRef, UID_LEN};

const RECORD: &str = "range key";

const SIGN_BIT: u64 = 1 << 63;

/// Maps an `i64` onto a `u64` whose big-endian bytes sort in numeric order.
#[inline]
pub(crate) fn encode_bound(v: i64) -> u64 {
    (v as u64) ^ SIGN_BIT
}

#[inline]
pub(crate) fn decode_bound(v: u64) -> i64 {
    (v ^ SIGN_BIT) as i64
}

/// Half-open interval `[from, to)`. Never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyRange {
    from: i64,
    to: i64,
}

impl KeyRange {
    /// Rejects empty (`from == to`) and inverted intervals.
    pub fn new(from: i64, to: i64) -> Result<Self> {
        if from >= to {
            return Err(CodecError::InvalidInterval { from, to });
        }
        Ok(Self { from, to })
    }

    #[must_use]
    pub fn from(&self) -> i64 {
        self.from
    }

    #[must_use]
    pub fn to(&self) -> i64 {
        self.to
    }

    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        self.from <= value && value < self.to
    }
}

/// Where a probe value falls relative to an encoded range key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeLocation {
    /// The key belongs to another map.
    UidMismatch,
    /// `probe < from`.
    Below,
    /// `from <= probe < to`.
    Within,
    /// `probe >= to`.
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeKey {
    uid: Uid,
    range: KeyRange,
}

impl RangeKey {
    pub const SERIALIZED_SIZE: usize = UID_LEN + 8 + 8;
    pub const FROM_OFFSET: usize = UID_LEN;
    pub const TO_OFFSET: usize = UID_LEN + 8;

    pub fn new(uid: Uid, range: KeyRange) -> Self {
        Self { uid, range }
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    #[must_use]
    pub fn range(&self) -> KeyRange {
        self.range
    }

    pub fn serialize(&self, buf: &mut ByteBuffer) -> Result<()> {
        if buf.remaining() < Self::SERIALIZED_SIZE {
            return Err(CodecError::overflow(buf, Self::SERIALIZED_SIZE));
        }
        self.uid.put(buf)?;
        buf.put_u64(encode_bound(self.range.from))?;
        buf.put_u64(encode_bound(self.range.to))?;
        buf.flip();
        Ok(())
    }

    /// Decodes a key. Stored intervals are re-validated.
    pub fn deserialize(bytes: &[u8]) -> Result<RangeKey> {
        CodecError::ensure_exact_len(RECORD, bytes, Self::SERIALIZED_SIZE)?;
        let uid = Uid::decode(bytes)?.to_uid();
        let (from, to) = read_bounds(bytes);
        let range = KeyRange::new(from, to).map_err(|_| {
            CodecError::format(
                RECORD,
                bytes,
                Self::FROM_OFFSET,
                format!("stored interval [{}, {}) is empty or inverted", from, to),
            )
        })?;
        Ok(RangeKey { uid, range })
    }

    pub fn extract_uid(bytes: &[u8]) -> Result<UidRef<'_>> {
        Uid::extract_prefix(bytes, 0)
    }

    /// Compares `probe` against an encoded key in place.
    ///
    /// Reads by absolute offset only, so it can be called over and over on
    /// the same buffer while walking a cursor.
    pub fn locate(bytes: &[u8], uid: &Uid, probe: i64) -> Result<RangeLocation> {
        CodecError::ensure_len(RECORD, bytes, Self::SERIALIZED_SIZE)?;
        if &bytes[..UID_LEN] != uid.as_bytes() {
            return Ok(RangeLocation::UidMismatch);
        }
        let (from, to) = read_bounds(bytes);
        Ok(if probe < from {
            RangeLocation::Below
        } else if probe < to {
            RangeLocation::Within
        } else {
            RangeLocation::Above
        })
    }

    /// Copies an encoded key into `dest` under a different identifier,
    /// carrying the 16 interval bytes over verbatim. `dest` is flipped.
    pub fn rekey(source: &[u8], dest: &mut ByteBuffer, new_uid: Uid) -> Result<()> {
        CodecError::ensure_exact_len(RECORD, source, Self::SERIALIZED_SIZE)?;
        Uid::rekey_prefix(source, dest, new_uid)
    }
}

fn read_bounds(bytes: &[u8]) -> (i64, i64) {
    let from = decode_bound(BigEndian::read_u64(
        &bytes[RangeKey::FROM_OFFSET..RangeKey::TO_OFFSET],
    ));
    let to = decode_bound(BigEndian::read_u64(
        &bytes[RangeKey::TO_OFFSET..RangeKey::SERIALIZED_SIZE],
    ));
    (from, to)
}
