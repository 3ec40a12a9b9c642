use byteorder::{BigEndian, ByteOrder};

use crate::error::{CodecError, Result};
use crate::varint;

/// Forward cursor over a borrowed record.
///
/// Every read is bounds-checked and failures become [`CodecError::Format`]
/// carrying the record name, the offset and a summary of the whole record.
/// Slices handed out borrow the source, never copy it.
pub(crate) struct ByteReader<'a> {
    record: &'static str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(record: &'static str, bytes: &'a [u8]) -> Self {
        Self {
            record,
            bytes,
            pos: 0,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn error(&self, detail: impl Into<String>) -> CodecError {
        CodecError::format(self.record, self.bytes, self.pos, detail)
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.error(format!(
                "need {} bytes, {} remaining",
                n,
                self.remaining()
            )));
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn take_array<const N: usize>(&mut self) -> Result<&'a [u8; N]> {
        let slice = self.take(N)?;
        slice
            .first_chunk::<N>()
            .ok_or_else(|| self.error("short fixed-width field"))
    }

    /// Everything left, consuming it.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let out = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        out
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub(crate) fn u24(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u24(self.take(3)?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    pub(crate) fn i64(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }

    pub(crate) fn varint(&mut self) -> Result<u64> {
        match varint::decode(&self.bytes[self.pos..]) {
            Ok((value, used)) => {
                self.pos += used;
                Ok(value)
            }
            Err(detail) => Err(self.error(detail)),
        }
    }

    /// A varint length followed by that many UTF-8 bytes.
    pub(crate) fn prefixed_str(&mut self) -> Result<&'a str> {
        let len = self.varint()?;
        let len = usize::try_from(len)
            .ok()
            .filter(|&n| n <= self.remaining())
            .ok_or_else(|| {
                self.error(format!(
                    "string length {} exceeds {} remaining bytes",
                    len,
                    self.remaining()
                ))
            })?;
        let start = self.pos;
        let raw = self.take(len)?;
        utf8(self.record, self.bytes, start, raw)
    }

    /// Fails if any bytes are left over.
    pub(crate) fn finish(self) -> Result<()> {
        if !self.is_empty() {
            return Err(self.error(format!("{} unexpected trailing bytes", self.remaining())));
        }
        Ok(())
    }
}

/// Validates `raw` (found at `offset` inside `whole`) as UTF-8 without copying.
pub(crate) fn utf8<'a>(
    record: &'static str,
    whole: &[u8],
    offset: usize,
    raw: &'a [u8],
) -> Result<&'a str> {
    std::str::from_utf8(raw).map_err(|e| {
        CodecError::format(
            record,
            whole,
            offset + e.valid_up_to(),
            "invalid UTF-8",
        )
    })
}
