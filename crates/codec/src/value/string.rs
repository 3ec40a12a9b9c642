use std::borrow::Cow;

use super::{mismatch, RefValue, ValueSerde, STRING_TYPE_ID};
use crate::error::Result;
use crate::reader::utf8;

/// Plain text values, stored as their UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringValueSerde;

impl ValueSerde for StringValueSerde {
    fn type_id(&self) -> u8 {
        STRING_TYPE_ID
    }

    fn name(&self) -> &'static str {
        "string"
    }

    fn deserialize<'a>(&self, bytes: &'a [u8]) -> Result<RefValue<'a>> {
        let s = utf8("string value", bytes, 0, bytes)?;
        Ok(RefValue::String(Cow::Borrowed(s)))
    }

    fn to_bytes<'v>(&self, value: &'v RefValue<'_>) -> Result<Cow<'v, [u8]>> {
        match value {
            RefValue::String(s) => Ok(Cow::Borrowed(s.as_bytes())),
            other => Err(mismatch(self.name(), other)),
        }
    }
}
