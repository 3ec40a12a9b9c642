//! Map identifiers.
//!
//! A [`Uid`] is a fixed-width opaque identifier naming one lookup map. It is
//! the leading component of every key belonging to that map, so all of a
//! map's entries sit together in key order and can be found with a prefix
//! scan. UIDs are handed out sequentially and compare as big-endian
//! unsigned integers.
//!
//! ```text
//! [uid: 4 bytes]
//! ```

use buffer::ByteBuffer;
use std::fmt;
use tracing::trace;

use crate::error::{CodecError, Result};

/// Width in bytes of every encoded identifier.
pub const UID_LEN: usize = 4;

const RECORD: &str = "uid";

/// Owned map identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid([u8; UID_LEN]);

impl Uid {
    /// The first identifier ever allocated.
    pub const MIN: Uid = Uid([0; UID_LEN]);

    /// Bytes an encoded identifier occupies.
    pub const SERIALIZED_SIZE: usize = UID_LEN;

    pub const fn from_bytes(bytes: [u8; UID_LEN]) -> Self {
        Uid(bytes)
    }

    pub const fn from_u32(n: u32) -> Self {
        Uid(n.to_be_bytes())
    }

    #[must_use]
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; UID_LEN] {
        &self.0
    }

    /// The identifier allocated after this one.
    pub fn next(self) -> Result<Uid> {
        self.to_u32()
            .checked_add(1)
            .map(Uid::from_u32)
            .ok_or_else(|| {
                CodecError::range("uid", i128::from(u32::MAX) + 1, 0, i128::from(u32::MAX))
            })
    }

    /// Appends the identifier at the buffer's position without flipping.
    pub(crate) fn put(&self, buf: &mut ByteBuffer) -> Result<()> {
        buf.put_slice(&self.0)?;
        Ok(())
    }

    /// Writes the identifier as a standalone record and flips the buffer.
    pub fn serialize(&self, buf: &mut ByteBuffer) -> Result<()> {
        self.put(buf)?;
        buf.flip();
        Ok(())
    }

    /// Writes `new_uid` followed by everything in `source` after its own
    /// identifier, then flips `dest`. Backs the key codecs' rekey operations.
    pub(crate) fn rekey_prefix(source: &[u8], dest: &mut ByteBuffer, new_uid: Uid) -> Result<()> {
        if dest.remaining() < source.len() {
            return Err(CodecError::overflow(dest, source.len()));
        }
        new_uid.put(dest)?;
        dest.put_slice(&source[UID_LEN..])?;
        dest.flip();
        trace!(uid = %new_uid, len = source.len(), "rekeyed record");
        Ok(())
    }

    /// Reads the identifier at the front of `bytes` without consuming anything.
    ///
    /// `bytes` may be longer than [`UID_LEN`]; the rest is ignored.
    pub fn decode(bytes: &[u8]) -> Result<UidRef<'_>> {
        Self::extract_prefix(bytes, 0)
    }

    /// Reads the identifier at the front of `*input` and advances past it.
    pub fn read<'a>(input: &mut &'a [u8]) -> Result<UidRef<'a>> {
        let bytes: &'a [u8] = *input;
        let uid = Self::decode(bytes)?;
        *input = &bytes[UID_LEN..];
        Ok(uid)
    }

    /// Views the identifier stored at `offset` inside a larger record.
    pub fn extract_prefix(bytes: &[u8], offset: usize) -> Result<UidRef<'_>> {
        bytes
            .get(offset..)
            .and_then(|tail| tail.first_chunk::<UID_LEN>())
            .map(UidRef)
            .ok_or_else(|| {
                CodecError::format(
                    RECORD,
                    bytes,
                    offset,
                    format!(
                        "need {} bytes at offset {}, buffer holds {}",
                        UID_LEN,
                        offset,
                        bytes.len()
                    ),
                )
            })
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self)
    }
}

impl From<UidRef<'_>> for Uid {
    fn from(view: UidRef<'_>) -> Self {
        view.to_uid()
    }
}

/// Zero-copy view of an identifier inside a caller-owned buffer.
///
/// Valid only while the buffer is; call [`UidRef::to_uid`] to keep it longer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct UidRef<'a>(&'a [u8; UID_LEN]);

impl<'a> UidRef<'a> {
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8; UID_LEN] {
        self.0
    }

    /// Durable copy that no longer borrows the source buffer.
    #[must_use]
    pub fn to_uid(&self) -> Uid {
        Uid(*self.0)
    }
}

impl PartialEq<Uid> for UidRef<'_> {
    fn eq(&self, other: &Uid) -> bool {
        self.0 == &other.0
    }
}

impl PartialEq<UidRef<'_>> for Uid {
    fn eq(&self, other: &UidRef<'_>) -> bool {
        &self.0 == other.0
    }
}

impl fmt::Debug for UidRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UidRef({})", hex::encode(self.0))
    }
}
