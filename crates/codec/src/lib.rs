//! # Codec - reference data record encodings
//!
//! Binary layouts for every record the reference data store keeps: map
//! identifiers, the three key families, value metadata, stream and map
//! identities, stream processing info and the value payloads themselves.
//!
//! ## Records
//!
//! ```text
//! ┌────────────────┬───────────────────────────────────────────────┬──────────┐
//! │ Record         │ Layout                                        │ Size     │
//! ├────────────────┼───────────────────────────────────────────────┼──────────┤
//! │ Uid            │ uid (4)                                       │ 4        │
//! │ PointKey       │ uid (4) | key (UTF-8, rest)                   │ 4..=511  │
//! │ RangeKey       │ uid (4) | from (i64) | to (i64)               │ 20       │
//! │ DedupKey       │ hash (u64) | id (u16)                         │ 10       │
//! │ ValueMeta      │ type_id (u8) | ref_count (u24)                │ 4        │
//! │ StreamIdentity │ uuid (str) | version (str) | stream | part    │ variable │
//! │ MapIdentity    │ StreamIdentity | [name (str)]                 │ variable │
//! │ ProcessingInfo │ 3 x time (i64) | state (u8) | [suffix]        │ 25 + ... │
//! │ StagingValue   │ type_id (u8) | hash (u64) | payload (rest)    │ 9 + ...  │
//! └────────────────┴───────────────────────────────────────────────┴──────────┘
//! ```
//!
//! Integers are big-endian so that byte order sorts like numeric order; range
//! bounds also have their sign bit flipped. `(str)` is a varint length then
//! UTF-8 bytes and bare stream/part numbers are varints.
//!
//! ## Buffers
//!
//! `serialize` writes at the buffer's position and flips it, leaving exactly
//! the record between position and limit. `deserialize` takes the record as a
//! slice and borrows from it wherever a field is variable length; call
//! `into_owned` to keep a value after the slice goes away. The `extract_*`,
//! `update_*` and other absolute helpers read or patch one field of a stored
//! record without decoding the rest.
//!
//! No codec keeps state between calls. The only shared object is the
//! [`ValueSerdeRegistry`], which is read-only once built.

mod dedup_key;
mod error;
mod identity;
mod point_key;
mod processing_info;
mod range_key;
mod reader;
mod uid;
mod value_meta;

pub mod value;
pub mod varint;

pub use dedup_key::DedupKey;
pub use error::{BufferSummary, CodecError, Result};
pub use identity::{MapIdentity, StreamIdentity};
pub use point_key::{PointKey, MAX_KEY_BYTES};
pub use processing_info::{
    MapFeatureEntry, MapFeatures, ProcessingInfo, ProcessingInfoExtension, ProcessingState,
    StreamFeatures, CREATE_TIME_OFFSET, CURRENT_STRUCTURE_VERSION, EFFECTIVE_TIME_OFFSET,
    LAST_ACCESSED_TIME_OFFSET, MAP_ENTRY_LEN, PREFIX_LEN as PROCESSING_INFO_PREFIX_LEN,
    STATE_OFFSET,
};
pub use range_key::{KeyRange, RangeKey, RangeLocation};
pub use uid::{Uid, UidRef, UID_LEN};
pub use value::{
    value_hash, GenericValueSerde, RefValue, StagingValue, ValueSerde, ValueSerdeRegistry,
};
pub use value_meta::{ValueMeta, MAX_REF_COUNT};

#[cfg(test)]
mod tests;
