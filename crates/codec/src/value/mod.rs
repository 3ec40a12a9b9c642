//! Value payloads and the type-id dispatch that selects their codec.
//!
//! A payload never carries its own type id. The id lives next to it, in a
//! [`ValueMeta`](crate::ValueMeta) or a [`StagingValue`] header, and is used to
//! pick a [`ValueSerde`] from a [`ValueSerdeRegistry`].
//!
//! | Type id | Codec                    | Payload            |
//! |---------|--------------------------|--------------------|
//! | 0       | [`StringValueSerde`]     | UTF-8 bytes        |
//! | 1       | [`FastInfosetValueSerde`]| opaque document    |
//! | 2       | [`NullValueSerde`]       | empty              |

use buffer::ByteBuffer;
use std::borrow::Cow;
use std::fmt;
use xxhash_rust::xxh64::xxh64;

use crate::error::{CodecError, Result};

mod fast_infoset;
mod generic;
mod null;
mod registry;
mod staging;
mod string;

pub use fast_infoset::FastInfosetValueSerde;
pub use generic::GenericValueSerde;
pub use null::NullValueSerde;
pub use registry::{ValueSerdeRegistry, ValueSerdeRegistryBuilder};
pub use staging::StagingValue;
pub use string::StringValueSerde;

pub const STRING_TYPE_ID: u8 = 0;
pub const FAST_INFOSET_TYPE_ID: u8 = 1;
pub const NULL_TYPE_ID: u8 = 2;

/// Highest type id the dispatch table has a slot for.
pub const MAX_TYPE_ID: u8 = 15;

const HASH_SEED: u64 = 0;

/// Content hash shared by dedup keys and staging headers.
#[must_use]
pub fn value_hash(bytes: &[u8]) -> u64 {
    xxh64(bytes, HASH_SEED)
}

/// A reference data value, decoded or about to be encoded.
///
/// Decoded values borrow the buffer they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefValue<'a> {
    String(Cow<'a, str>),
    /// A document that is already serialized; its bytes are the payload.
    FastInfoset(Cow<'a, [u8]>),
    Null,
    /// Bytes tagged with a type id no registered codec understands.
    Unknown { type_id: u8, bytes: Cow<'a, [u8]> },
}

impl<'a> RefValue<'a> {
    pub fn string(s: impl Into<Cow<'a, str>>) -> Self {
        RefValue::String(s.into())
    }

    pub fn fast_infoset(bytes: impl Into<Cow<'a, [u8]>>) -> Self {
        RefValue::FastInfoset(bytes.into())
    }

    #[must_use]
    pub fn type_id(&self) -> u8 {
        match self {
            RefValue::String(_) => STRING_TYPE_ID,
            RefValue::FastInfoset(_) => FAST_INFOSET_TYPE_ID,
            RefValue::Null => NULL_TYPE_ID,
            RefValue::Unknown { type_id, .. } => *type_id,
        }
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            RefValue::String(_) => "string",
            RefValue::FastInfoset(_) => "fast infoset",
            RefValue::Null => "null",
            RefValue::Unknown { .. } => "unknown",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, RefValue::Null)
    }

    pub fn into_owned(self) -> RefValue<'static> {
        match self {
            RefValue::String(s) => RefValue::String(Cow::Owned(s.into_owned())),
            RefValue::FastInfoset(b) => RefValue::FastInfoset(Cow::Owned(b.into_owned())),
            RefValue::Null => RefValue::Null,
            RefValue::Unknown { type_id, bytes } => RefValue::Unknown {
                type_id,
                bytes: Cow::Owned(bytes.into_owned()),
            },
        }
    }
}

impl fmt::Display for RefValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefValue::String(s) => write!(f, "{:?}", s),
            RefValue::FastInfoset(b) => write!(f, "fast infoset ({} bytes)", b.len()),
            RefValue::Null => f.write_str("null"),
            RefValue::Unknown { type_id, bytes } => {
                write!(f, "unknown type {} ({} bytes)", type_id, bytes.len())
            }
        }
    }
}

/// Codec for the payload of one value type.
pub trait ValueSerde: Send + Sync {
    fn type_id(&self) -> u8;

    fn name(&self) -> &'static str;

    /// Decodes a whole payload, borrowing from `bytes` where possible.
    fn deserialize<'a>(&self, bytes: &'a [u8]) -> Result<RefValue<'a>>;

    /// The payload bytes of `value`.
    ///
    /// Values that already hold their encoded form hand it back borrowed
    /// instead of copying it.
    fn to_bytes<'v>(&self, value: &'v RefValue<'_>) -> Result<Cow<'v, [u8]>>;

    /// Copies the payload into `buf` at its position, then flips it.
    fn serialize_into(&self, value: &RefValue<'_>, buf: &mut ByteBuffer) -> Result<()> {
        let bytes = self.to_bytes(value)?;
        put_payload(buf, &bytes)
    }
}

pub(crate) fn put_payload(buf: &mut ByteBuffer, bytes: &[u8]) -> Result<()> {
    if buf.remaining() < bytes.len() {
        return Err(CodecError::overflow(buf, bytes.len()));
    }
    buf.put_slice(bytes)?;
    buf.flip();
    Ok(())
}

pub(crate) fn mismatch(expected: &'static str, value: &RefValue<'_>) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        actual: value.kind_name(),
    }
}
