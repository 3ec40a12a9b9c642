use buffer::ByteBuffer;
use std::borrow::Cow;

use super::{put_payload, RefValue, ValueSerdeRegistry};
use crate::error::Result;

/// Codec for call sites that handle values of any type.
///
/// Reads dispatch on the type id stored beside the payload. When no codec is
/// registered for that id the payload comes back as [`RefValue::Unknown`]
/// holding the raw bytes, so a record written by a newer version can still be
/// inspected or copied. Writes dispatch on the value's own type id and pass
/// `Unknown` bytes through untouched.
#[derive(Debug, Clone, Copy)]
pub struct GenericValueSerde<'r> {
    registry: &'r ValueSerdeRegistry,
}

impl<'r> GenericValueSerde<'r> {
    pub fn new(registry: &'r ValueSerdeRegistry) -> Self {
        Self { registry }
    }

    pub fn deserialize<'a>(&self, type_id: u8, bytes: &'a [u8]) -> Result<RefValue<'a>> {
        if self.registry.contains(type_id) {
            self.registry.deserialize(type_id, bytes)
        } else {
            Ok(RefValue::Unknown {
                type_id,
                bytes: Cow::Borrowed(bytes),
            })
        }
    }

    pub fn to_bytes<'v>(&self, value: &'v RefValue<'_>) -> Result<Cow<'v, [u8]>> {
        match value {
            RefValue::Unknown { bytes, .. } => Ok(Cow::Borrowed(bytes.as_ref())),
            known => self.registry.to_bytes(known),
        }
    }

    pub fn serialize_into(&self, value: &RefValue<'_>, buf: &mut ByteBuffer) -> Result<()> {
        let bytes = self.to_bytes(value)?;
        put_payload(buf, &bytes)
    }
}
