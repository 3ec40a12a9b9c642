//! Identities of reference streams and of the maps loaded from them.
//!
//! ```text
//! StreamIdentity: [len: varint][pipeline_uuid][len: varint][pipeline_version]
//!                 [stream_id: varint][part_index: varint]
//! MapIdentity:    StreamIdentity [len: varint][map_name]    (named map)
//!                 StreamIdentity                            (anonymous map)
//! ```
//!
//! Strings are UTF-8 behind a varint length; integers are varints, so the
//! common small values take one or two bytes. A map identity begins with its
//! stream identity's exact bytes, which makes an encoded stream identity the
//! scan prefix for all of that stream's maps.
//!
//! An anonymous map has *no* bytes after the stream identity. A map named
//! `""` has a single zero length byte. The two are different maps.

use buffer::ByteBuffer;
use std::borrow::Cow;

use crate::error::{CodecError, Result};
use crate::reader::ByteReader;
use crate::varint;

const STREAM_RECORD: &str = "stream identity";
const MAP_RECORD: &str = "map identity";

/// Which pipeline (and version of it) processed which stream part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamIdentity<'a> {
    pipeline_uuid: Cow<'a, str>,
    pipeline_version: Cow<'a, str>,
    stream_id: u64,
    part_index: u64,
}

impl<'a> StreamIdentity<'a> {
    pub fn new(
        pipeline_uuid: impl Into<Cow<'a, str>>,
        pipeline_version: impl Into<Cow<'a, str>>,
        stream_id: u64,
        part_index: u64,
    ) -> Self {
        Self {
            pipeline_uuid: pipeline_uuid.into(),
            pipeline_version: pipeline_version.into(),
            stream_id,
            part_index,
        }
    }

    #[must_use]
    pub fn pipeline_uuid(&self) -> &str {
        &self.pipeline_uuid
    }

    #[must_use]
    pub fn pipeline_version(&self) -> &str {
        &self.pipeline_version
    }

    #[must_use]
    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    #[must_use]
    pub fn part_index(&self) -> u64 {
        self.part_index
    }

    /// Exact encoded length.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        prefixed_len(&self.pipeline_uuid)
            + prefixed_len(&self.pipeline_version)
            + varint::encoded_len(self.stream_id)
            + varint::encoded_len(self.part_index)
    }

    pub fn serialize(&self, buf: &mut ByteBuffer) -> Result<()> {
        if buf.remaining() < self.serialized_size() {
            return Err(CodecError::overflow(buf, self.serialized_size()));
        }
        self.put(buf)?;
        buf.flip();
        Ok(())
    }

    pub fn deserialize(bytes: &'a [u8]) -> Result<StreamIdentity<'a>> {
        let mut rdr = ByteReader::new(STREAM_RECORD, bytes);
        let identity = Self::read(&mut rdr)?;
        rdr.finish()?;
        Ok(identity)
    }

    #[must_use]
    pub fn into_owned(self) -> StreamIdentity<'static> {
        StreamIdentity {
            pipeline_uuid: Cow::Owned(self.pipeline_uuid.into_owned()),
            pipeline_version: Cow::Owned(self.pipeline_version.into_owned()),
            stream_id: self.stream_id,
            part_index: self.part_index,
        }
    }

    fn put(&self, buf: &mut ByteBuffer) -> Result<()> {
        put_prefixed(buf, &self.pipeline_uuid)?;
        put_prefixed(buf, &self.pipeline_version)?;
        varint::put(buf, self.stream_id)?;
        varint::put(buf, self.part_index)?;
        Ok(())
    }

    fn read(rdr: &mut ByteReader<'a>) -> Result<StreamIdentity<'a>> {
        let pipeline_uuid = rdr.prefixed_str()?;
        let pipeline_version = rdr.prefixed_str()?;
        let stream_id = rdr.varint()?;
        let part_index = rdr.varint()?;
        Ok(StreamIdentity::new(
            pipeline_uuid,
            pipeline_version,
            stream_id,
            part_index,
        ))
    }
}

/// One lookup map within a reference stream. `map_name == None` is the
/// stream's single anonymous map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapIdentity<'a> {
    stream: StreamIdentity<'a>,
    map_name: Option<Cow<'a, str>>,
}

impl<'a> MapIdentity<'a> {
    pub fn named(stream: StreamIdentity<'a>, map_name: impl Into<Cow<'a, str>>) -> Self {
        Self {
            stream,
            map_name: Some(map_name.into()),
        }
    }

    pub fn anonymous(stream: StreamIdentity<'a>) -> Self {
        Self {
            stream,
            map_name: None,
        }
    }

    #[must_use]
    pub fn stream(&self) -> &StreamIdentity<'a> {
        &self.stream
    }

    #[must_use]
    pub fn map_name(&self) -> Option<&str> {
        self.map_name.as_deref()
    }

    #[must_use]
    pub fn serialized_size(&self) -> usize {
        self.stream.serialized_size() + self.map_name.as_deref().map_or(0, prefixed_len)
    }

    pub fn serialize(&self, buf: &mut ByteBuffer) -> Result<()> {
        if buf.remaining() < self.serialized_size() {
            return Err(CodecError::overflow(buf, self.serialized_size()));
        }
        self.stream.put(buf)?;
        if let Some(name) = &self.map_name {
            put_prefixed(buf, name)?;
        }
        buf.flip();
        Ok(())
    }

    pub fn deserialize(bytes: &'a [u8]) -> Result<MapIdentity<'a>> {
        let mut rdr = ByteReader::new(MAP_RECORD, bytes);
        let stream = StreamIdentity::read(&mut rdr)?;
        let map_name = if rdr.is_empty() {
            None
        } else {
            Some(Cow::Borrowed(rdr.prefixed_str()?))
        };
        rdr.finish()?;
        Ok(MapIdentity { stream, map_name })
    }

    #[must_use]
    pub fn into_owned(self) -> MapIdentity<'static> {
        MapIdentity {
            stream: self.stream.into_owned(),
            map_name: self.map_name.map(|n| Cow::Owned(n.into_owned())),
        }
    }
}

fn prefixed_len(s: &str) -> usize {
    varint::encoded_len(s.len() as u64) + s.len()
}

fn put_prefixed(buf: &mut ByteBuffer, s: &str) -> Result<()> {
    varint::put(buf, s.len() as u64)?;
    buf.put_slice(s.as_bytes())?;
    Ok(())
}
