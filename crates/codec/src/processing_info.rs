//! Lifecycle record of one reference stream.
//!
//! ## Layout
//!
//! ```text
//! prefix (always present, 25 bytes):
//!   [create_time_ms: i64][last_accessed_time_ms: i64][effective_time_ms: i64][state: u8]
//!
//! suffix (records written with structure version >= 1 only):
//!   [structure_version: u8][stream_features: u8]
//!   ([uid: 4][map_features: u8])*      repeated until the end of the buffer
//! ```
//!
//! Legacy records stop after the prefix. Whether a suffix exists is decided by
//! the bytes remaining after the prefix, not by any flag inside it, so the
//! prefix-only mutators below work on every record ever written. A suffix
//! from a newer structure version is read for the fields this codec knows and
//! keeps its version number.
//!
//! ## Partial access
//!
//! | Field             | Offset | Width |
//! |-------------------|--------|-------|
//! | create time       | 0      | 8     |
//! | last accessed     | 8      | 8     |
//! | effective time    | 16     | 8     |
//! | processing state  | 24     | 1     |

use bitflags::bitflags;
use buffer::ByteBuffer;
use byteorder::{BigEndian, ByteOrder};
use std::fmt;
use tracing::{debug, trace};

use crate::error::{CodecError, Result};
use crate::reader::ByteReader;
use crate::uid::{Uid, UID_LEN};

pub const CREATE_TIME_OFFSET: usize = 0;
pub const LAST_ACCESSED_TIME_OFFSET: usize = 8;
pub const EFFECTIVE_TIME_OFFSET: usize = 16;
pub const STATE_OFFSET: usize = 24;

/// Length of the fixed prefix every record has.
pub const PREFIX_LEN: usize = STATE_OFFSET + 1;

/// Width of one `(uid, map_features)` entry in the suffix.
pub const MAP_ENTRY_LEN: usize = UID_LEN + 1;

/// Structure version written by this codec.
pub const CURRENT_STRUCTURE_VERSION: u8 = 1;

const RECORD: &str = "processing info";

/// Load lifecycle stage of a reference stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProcessingState {
    LoadInProgress = 0,
    PurgeInProgress = 1,
    Complete = 2,
    Failed = 3,
    Terminated = 4,
    PurgeFailed = 5,
    ReadyForPurge = 6,
}

impl ProcessingState {
    pub const ALL: [ProcessingState; 7] = [
        ProcessingState::LoadInProgress,
        ProcessingState::PurgeInProgress,
        ProcessingState::Complete,
        ProcessingState::Failed,
        ProcessingState::Terminated,
        ProcessingState::PurgeFailed,
        ProcessingState::ReadyForPurge,
    ];

    #[must_use]
    pub fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            ProcessingState::LoadInProgress => "Load in progress",
            ProcessingState::PurgeInProgress => "Purge in progress",
            ProcessingState::Complete => "Complete",
            ProcessingState::Failed => "Failed",
            ProcessingState::Terminated => "Terminated",
            ProcessingState::PurgeFailed => "Purge failed",
            ProcessingState::ReadyForPurge => "Ready for purge",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

bitflags! {
    /// What a whole stream's reference data contains.
    ///
    /// Bits this version does not know are kept as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StreamFeatures: u8 {
        const KEY_VALUES = 0b0000_0001;
        const RANGE_VALUES = 0b0000_0010;
        const NULL_VALUES = 0b0000_0100;
    }
}

bitflags! {
    /// What one map within a stream contains.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapFeatures: u8 {
        const KEY_VALUES = 0b0000_0001;
        const RANGE_VALUES = 0b0000_0010;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapFeatureEntry {
    pub uid: Uid,
    pub features: MapFeatures,
}

/// The part of a record after the fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingInfoExtension {
    /// Written before the suffix existed. Features are unknown, not empty.
    Legacy,
    /// `version` may be newer than [`CURRENT_STRUCTURE_VERSION`].
    Versioned {
        version: u8,
        features: StreamFeatures,
        maps: Vec<MapFeatureEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInfo {
    pub create_time_ms: i64,
    pub last_accessed_time_ms: i64,
    pub effective_time_ms: i64,
    pub state: ProcessingState,
    pub extension: ProcessingInfoExtension,
}

impl ProcessingInfo {
    /// A fresh current-version record with no features and no maps.
    ///
    /// The last-accessed time starts at the create time.
    pub fn new(create_time_ms: i64, effective_time_ms: i64, state: ProcessingState) -> Self {
        Self {
            create_time_ms,
            last_accessed_time_ms: create_time_ms,
            effective_time_ms,
            state,
            extension: ProcessingInfoExtension::Versioned {
                version: CURRENT_STRUCTURE_VERSION,
                features: StreamFeatures::empty(),
                maps: Vec::new(),
            },
        }
    }

    /// A prefix-only record, as older writers produced.
    pub fn legacy(
        create_time_ms: i64,
        last_accessed_time_ms: i64,
        effective_time_ms: i64,
        state: ProcessingState,
    ) -> Self {
        Self {
            create_time_ms,
            last_accessed_time_ms,
            effective_time_ms,
            state,
            extension: ProcessingInfoExtension::Legacy,
        }
    }

    /// Records features for the stream and for one of its maps.
    ///
    /// A legacy record is upgraded to the current structure version first.
    pub fn add_map_features(
        &mut self,
        uid: Uid,
        map_features: MapFeatures,
        stream_features: StreamFeatures,
    ) {
        if self.extension == ProcessingInfoExtension::Legacy {
            self.extension = ProcessingInfoExtension::Versioned {
                version: CURRENT_STRUCTURE_VERSION,
                features: StreamFeatures::empty(),
                maps: Vec::new(),
            };
        }
        if let ProcessingInfoExtension::Versioned { features, maps, .. } = &mut self.extension {
            *features |= stream_features;
            match maps.iter_mut().find(|e| e.uid == uid) {
                Some(entry) => entry.features |= map_features,
                None => maps.push(MapFeatureEntry {
                    uid,
                    features: map_features,
                }),
            }
        }
    }

    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.extension == ProcessingInfoExtension::Legacy
    }

    #[must_use]
    pub fn serialized_size(&self) -> usize {
        match &self.extension {
            ProcessingInfoExtension::Legacy => PREFIX_LEN,
            ProcessingInfoExtension::Versioned { maps, .. } => {
                PREFIX_LEN + 2 + maps.len() * MAP_ENTRY_LEN
            }
        }
    }

    pub fn serialize(&self, buf: &mut ByteBuffer) -> Result<()> {
        if buf.remaining() < self.serialized_size() {
            return Err(CodecError::overflow(buf, self.serialized_size()));
        }
        buf.put_i64(self.create_time_ms)?;
        buf.put_i64(self.last_accessed_time_ms)?;
        buf.put_i64(self.effective_time_ms)?;
        buf.put_u8(self.state.id())?;
        if let ProcessingInfoExtension::Versioned {
            version,
            features,
            maps,
        } = &self.extension
        {
            buf.put_u8(*version)?;
            buf.put_u8(features.bits())?;
            for entry in maps {
                entry.uid.put(buf)?;
                buf.put_u8(entry.features.bits())?;
            }
        }
        buf.flip();
        Ok(())
    }

    pub fn deserialize(bytes: &[u8]) -> Result<ProcessingInfo> {
        let mut rdr = ByteReader::new(RECORD, bytes);
        let create_time_ms = rdr.i64()?;
        let last_accessed_time_ms = rdr.i64()?;
        let effective_time_ms = rdr.i64()?;
        let state_id = rdr.u8()?;
        let state = ProcessingState::from_id(state_id).ok_or_else(|| {
            CodecError::format(
                RECORD,
                bytes,
                STATE_OFFSET,
                format!("unknown processing state {}", state_id),
            )
        })?;

        let extension = if rdr.is_empty() {
            ProcessingInfoExtension::Legacy
        } else {
            read_extension(&mut rdr)?
        };

        Ok(ProcessingInfo {
            create_time_ms,
            last_accessed_time_ms,
            effective_time_ms,
            state,
            extension,
        })
    }

    // ---- Prefix-only accessors (no suffix knowledge needed) ----

    pub fn extract_create_time(bytes: &[u8]) -> Result<i64> {
        read_i64_at(bytes, CREATE_TIME_OFFSET)
    }

    pub fn extract_last_accessed_time(bytes: &[u8]) -> Result<i64> {
        read_i64_at(bytes, LAST_ACCESSED_TIME_OFFSET)
    }

    pub fn extract_effective_time(bytes: &[u8]) -> Result<i64> {
        read_i64_at(bytes, EFFECTIVE_TIME_OFFSET)
    }

    pub fn extract_state(bytes: &[u8]) -> Result<ProcessingState> {
        CodecError::ensure_len(RECORD, bytes, PREFIX_LEN)?;
        let id = bytes[STATE_OFFSET];
        ProcessingState::from_id(id).ok_or_else(|| {
            CodecError::format(
                RECORD,
                bytes,
                STATE_OFFSET,
                format!("unknown processing state {}", id),
            )
        })
    }

    /// Scan filter: was the record accessed strictly after the big-endian
    /// `i64` timestamp held in `threshold`?
    pub fn was_accessed_after(bytes: &[u8], threshold: &[u8]) -> Result<bool> {
        CodecError::ensure_exact_len("access threshold", threshold, 8)?;
        let last_accessed = Self::extract_last_accessed_time(bytes)?;
        Ok(last_accessed > BigEndian::read_i64(threshold))
    }

    /// Overwrites the state byte in place.
    pub fn update_state(bytes: &mut [u8], state: ProcessingState) -> Result<()> {
        CodecError::ensure_len(RECORD, bytes, PREFIX_LEN)?;
        bytes[STATE_OFFSET] = state.id();
        debug!(state = %state, "processing state updated in place");
        Ok(())
    }

    /// Overwrites the last-accessed time in place. Nothing else is touched.
    pub fn update_last_accessed_time(bytes: &mut [u8], time_ms: i64) -> Result<()> {
        CodecError::ensure_len(RECORD, bytes, PREFIX_LEN)?;
        BigEndian::write_i64(
            &mut bytes[LAST_ACCESSED_TIME_OFFSET..EFFECTIVE_TIME_OFFSET],
            time_ms,
        );
        trace!(time_ms, "last accessed time updated in place");
        Ok(())
    }
}

fn read_extension(rdr: &mut ByteReader<'_>) -> Result<ProcessingInfoExtension> {
    let version = rdr.u8()?;
    if version == 0 {
        return Err(rdr.error("structure version 0 is not valid"));
    }
    if version > CURRENT_STRUCTURE_VERSION {
        trace!(version, "decoding newer processing info with known fields only");
    }
    let features = StreamFeatures::from_bits_retain(rdr.u8()?);

    if rdr.remaining() % MAP_ENTRY_LEN != 0 {
        return Err(rdr.error(format!(
            "{} trailing bytes are not a whole number of {}-byte map entries",
            rdr.remaining(),
            MAP_ENTRY_LEN
        )));
    }
    let mut maps = Vec::with_capacity(rdr.remaining() / MAP_ENTRY_LEN);
    while !rdr.is_empty() {
        let uid = Uid::from_bytes(*rdr.take_array::<UID_LEN>()?);
        let features = MapFeatures::from_bits_retain(rdr.u8()?);
        maps.push(MapFeatureEntry { uid, features });
    }

    Ok(ProcessingInfoExtension::Versioned {
        version,
        features,
        maps,
    })
}

fn read_i64_at(bytes: &[u8], offset: usize) -> Result<i64> {
    CodecError::ensure_len(RECORD, bytes, PREFIX_LEN)?;
    Ok(BigEndian::read_i64(&bytes[offset..offset + 8]))
}
