use std::borrow::Cow;

use super::{mismatch, RefValue, ValueSerde, FAST_INFOSET_TYPE_ID};
use crate::error::Result;

/// Pre-serialized binary documents.
///
/// The codec never looks inside the document: the payload is the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastInfosetValueSerde;

impl ValueSerde for FastInfosetValueSerde {
    fn type_id(&self) -> u8 {
        FAST_INFOSET_TYPE_ID
    }

    fn name(&self) -> &'static str {
        "fast infoset"
    }

    fn deserialize<'a>(&self, bytes: &'a [u8]) -> Result<RefValue<'a>> {
        Ok(RefValue::FastInfoset(Cow::Borrowed(bytes)))
    }

    fn to_bytes<'v>(&self, value: &'v RefValue<'_>) -> Result<Cow<'v, [u8]>> {
        match value {
            RefValue::FastInfoset(doc) => Ok(Cow::Borrowed(doc.as_ref())),
            other => Err(mismatch(self.name(), other)),
        }
    }
}
