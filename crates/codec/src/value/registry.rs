use buffer::ByteBuffer;
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

use super::{
    FastInfosetValueSerde, NullValueSerde, RefValue, StringValueSerde, ValueSerde, MAX_TYPE_ID,
};
use crate::error::{CodecError, Result};

const SLOTS: usize = MAX_TYPE_ID as usize + 1;

type Slots = Vec<Option<Box<dyn ValueSerde>>>;

fn empty_slots() -> Slots {
    (0..SLOTS).map(|_| None).collect()
}

/// Type-id dispatch table for value codecs.
///
/// Built once at start-up and then only read, so one instance can be shared
/// across threads by reference. A lookup for an id with no codec is an
/// [`CodecError::UnknownTag`] error, never a fallback.
pub struct ValueSerdeRegistry {
    slots: Slots,
}

impl ValueSerdeRegistry {
    pub fn builder() -> ValueSerdeRegistryBuilder {
        ValueSerdeRegistryBuilder::new()
    }

    /// A table holding the string, binary document and null codecs.
    pub fn with_defaults() -> Self {
        ValueSerdeRegistryBuilder::with_defaults().build()
    }

    pub fn get(&self, type_id: u8) -> Result<&dyn ValueSerde> {
        self.slots
            .get(usize::from(type_id))
            .and_then(|slot| slot.as_deref())
            .ok_or(CodecError::UnknownTag { type_id })
    }

    #[must_use]
    pub fn contains(&self, type_id: u8) -> bool {
        self.get(type_id).is_ok()
    }

    /// Registered type ids in ascending order.
    pub fn type_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.slots
            .iter()
            .zip(0u8..)
            .filter(|(slot, _)| slot.is_some())
            .map(|(_, id)| id)
    }

    pub fn deserialize<'a>(&self, type_id: u8, bytes: &'a [u8]) -> Result<RefValue<'a>> {
        self.get(type_id)?.deserialize(bytes)
    }

    /// Encodes `value` with the codec registered for its own type id.
    pub fn serialize_into(&self, value: &RefValue<'_>, buf: &mut ByteBuffer) -> Result<()> {
        self.get(value.type_id())?.serialize_into(value, buf)
    }

    pub fn to_bytes<'v>(&self, value: &'v RefValue<'_>) -> Result<Cow<'v, [u8]>> {
        self.get(value.type_id())?.to_bytes(value)
    }
}

impl Default for ValueSerdeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ValueSerdeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .enumerate()
                    .filter_map(|(id, slot)| slot.as_ref().map(|s| (id, s.name()))),
            )
            .finish()
    }
}

pub struct ValueSerdeRegistryBuilder {
    slots: Slots,
}

impl ValueSerdeRegistryBuilder {
    pub fn new() -> Self {
        Self {
            slots: empty_slots(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut slots = empty_slots();
        let defaults: [Box<dyn ValueSerde>; 3] = [
            Box::new(StringValueSerde),
            Box::new(FastInfosetValueSerde),
            Box::new(NullValueSerde),
        ];
        for serde in defaults {
            let id = usize::from(serde.type_id());
            slots[id] = Some(serde);
        }
        Self { slots }
    }

    /// Adds a codec under its own type id.
    ///
    /// Ids above [`MAX_TYPE_ID`] are a range error; an id that already has a
    /// codec is [`CodecError::DuplicateTag`].
    pub fn register(mut self, serde: Box<dyn ValueSerde>) -> Result<Self> {
        let type_id = serde.type_id();
        let slot = self.slots.get_mut(usize::from(type_id)).ok_or_else(|| {
            CodecError::range("value type id", i128::from(type_id), 0, i128::from(MAX_TYPE_ID))
        })?;
        if slot.is_some() {
            return Err(CodecError::DuplicateTag { type_id });
        }
        *slot = Some(serde);
        Ok(self)
    }

    pub fn build(self) -> ValueSerdeRegistry {
        let registry = ValueSerdeRegistry { slots: self.slots };
        debug!(codecs = ?registry, "value codec registry built");
        registry
    }
}

impl Default for ValueSerdeRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
