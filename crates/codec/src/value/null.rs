use std::borrow::Cow;

use super::{mismatch, RefValue, ValueSerde, NULL_TYPE_ID};
use crate::error::{CodecError, Result};

/// The "no value" marker. Its payload is always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullValueSerde;

impl ValueSerde for NullValueSerde {
    fn type_id(&self) -> u8 {
        NULL_TYPE_ID
    }

    fn name(&self) -> &'static str {
        "null"
    }

    fn deserialize<'a>(&self, bytes: &'a [u8]) -> Result<RefValue<'a>> {
        if !bytes.is_empty() {
            return Err(CodecError::format(
                "null value",
                bytes,
                0,
                format!("expected an empty payload, found {} bytes", bytes.len()),
            ));
        }
        Ok(RefValue::Null)
    }

    fn to_bytes<'v>(&self, value: &'v RefValue<'_>) -> Result<Cow<'v, [u8]>> {
        match value {
            RefValue::Null => Ok(Cow::Borrowed(&[])),
            other => Err(mismatch(self.name(), other)),
        }
    }
}
