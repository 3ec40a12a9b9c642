//! Exact-match keys: one string key inside one map.
//!
//! ```text
//! [uid: 4][key: UTF-8 ... to end of buffer]
//! ```
//!
//! The key string is always the trailing component, so it carries no length
//! field; its length is whatever remains after the identifier.

use buffer::ByteBuffer;
use std::borrow::Cow;

use crate::error::{CodecError, Result};
use crate::reader::utf8;
use crate::uid::{Uid, UidRef, UID_LEN};

/// Largest key the storage engine accepts, identifier included.
pub const MAX_KEY_BYTES: usize = 511;

const RECORD: &str = "point key";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointKey<'a> {
    uid: Uid,
    key: Cow<'a, str>,
}

impl<'a> PointKey<'a> {
    /// Builds a key, rejecting strings that would push the encoded key past
    /// [`MAX_KEY_BYTES`].
    pub fn new(uid: Uid, key: impl Into<Cow<'a, str>>) -> Result<Self> {
        let key = key.into();
        let encoded = UID_LEN + key.len();
        if encoded > MAX_KEY_BYTES {
            return Err(CodecError::range(
                "point key length",
                encoded as i128,
                UID_LEN as i128,
                MAX_KEY_BYTES as i128,
            ));
        }
        Ok(Self { uid, key })
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn serialized_size(&self) -> usize {
        UID_LEN + self.key.len()
    }

    /// Writes `uid ‖ key` and flips the buffer.
    pub fn serialize(&self, buf: &mut ByteBuffer) -> Result<()> {
        if buf.remaining() < self.serialized_size() {
            return Err(CodecError::overflow(buf, self.serialized_size()));
        }
        self.uid.put(buf)?;
        buf.put_slice(self.key.as_bytes())?;
        buf.flip();
        Ok(())
    }

    /// Writes the key, then narrows the limit to just past the identifier.
    ///
    /// The readable window is the scan prefix for every entry in the map.
    pub fn serialize_prefix_only(&self, buf: &mut ByteBuffer) -> Result<()> {
        self.serialize(buf)?;
        buf.set_limit(UID_LEN)?;
        Ok(())
    }

    /// Decodes a key, borrowing the string from `bytes`.
    pub fn deserialize(bytes: &'a [u8]) -> Result<PointKey<'a>> {
        let uid = Uid::decode(bytes)?.to_uid();
        let key = utf8(RECORD, bytes, UID_LEN, &bytes[UID_LEN..])?;
        Ok(PointKey {
            uid,
            key: Cow::Borrowed(key),
        })
    }

    /// Detaches the key from the buffer it was decoded from.
    #[must_use]
    pub fn into_owned(self) -> PointKey<'static> {
        PointKey {
            uid: self.uid,
            key: Cow::Owned(self.key.into_owned()),
        }
    }

    /// Views the identifier of an encoded key without decoding the string.
    pub fn extract_uid(bytes: &[u8]) -> Result<UidRef<'_>> {
        Uid::extract_prefix(bytes, 0)
    }

    /// Copies an encoded key into `dest` under a different identifier.
    ///
    /// The string bytes are copied verbatim, never decoded. `dest` is flipped.
    pub fn rekey(source: &[u8], dest: &mut ByteBuffer, new_uid: Uid) -> Result<()> {
        CodecError::ensure_len(RECORD, source, UID_LEN)?;
        Uid::rekey_prefix(source, dest, new_uid)
    }
}
