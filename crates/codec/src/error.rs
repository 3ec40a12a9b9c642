use buffer::{BufferError, ByteBuffer};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

/// Enough of a buffer to recognise it in a log line without dumping it whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSummary {
    pub len: usize,
    pub crc32: u32,
    /// Hex of at most the first [`BufferSummary::HEAD_BYTES`] bytes.
    pub head: String,
}

impl BufferSummary {
    pub const HEAD_BYTES: usize = 16;

    pub fn of(bytes: &[u8]) -> Self {
        let head_len = bytes.len().min(Self::HEAD_BYTES);
        Self {
            len: bytes.len(),
            crc32: crc32fast::hash(bytes),
            head: hex::encode(&bytes[..head_len]),
        }
    }
}

impl fmt::Display for BufferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ellipsis = if self.len > Self::HEAD_BYTES { ".." } else { "" };
        write!(
            f,
            "len={} crc32={:#010x} head={}{}",
            self.len, self.crc32, self.head, ellipsis
        )
    }
}

/// Every failure the codec layer can report. None of them are retried here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The bytes do not match the record layout: too short, trailing bytes,
    /// bad varint, bad UTF-8, unknown enum byte.
    #[error("malformed {record} at offset {offset}: {detail} [{summary}]")]
    Format {
        record: &'static str,
        offset: usize,
        detail: String,
        summary: BufferSummary,
    },

    /// A value codec was handed a value of another type.
    #[error("value type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A bounded counter or length would leave its range.
    #[error("{what} out of range: {value} not in [{min}, {max}]")]
    Range {
        what: &'static str,
        value: i128,
        min: i128,
        max: i128,
    },

    /// A range key whose interval is empty or inverted.
    #[error("invalid interval [{from}, {to}): from must be below to")]
    InvalidInterval { from: i64, to: i64 },

    /// Dispatch was asked for a type id with no registered codec.
    #[error("no value codec registered for type id {type_id}")]
    UnknownTag { type_id: u8 },

    #[error("value type id {type_id} registered twice")]
    DuplicateTag { type_id: u8 },

    /// The caller's buffer cannot hold the record.
    #[error("buffer: {0}")]
    Buffer(#[from] BufferError),
}

impl CodecError {
    pub(crate) fn format(
        record: &'static str,
        bytes: &[u8],
        offset: usize,
        detail: impl Into<String>,
    ) -> Self {
        CodecError::Format {
            record,
            offset,
            detail: detail.into(),
            summary: BufferSummary::of(bytes),
        }
    }

    pub(crate) fn range(what: &'static str, value: i128, min: i128, max: i128) -> Self {
        CodecError::Range {
            what,
            value,
            min,
            max,
        }
    }

    /// Overflow error for a record of `needed` bytes that does not fit `buf`.
    ///
    /// Codecs check capacity up front so a failed write leaves no partial record.
    pub(crate) fn overflow(buf: &ByteBuffer, needed: usize) -> Self {
        CodecError::Buffer(BufferError::Overflow {
            needed,
            remaining: buf.remaining(),
            capacity: buf.capacity(),
        })
    }

    /// Checks that `bytes` is at least `needed` long before an absolute read.
    pub(crate) fn ensure_len(record: &'static str, bytes: &[u8], needed: usize) -> Result<()> {
        if bytes.len() < needed {
            return Err(Self::format(
                record,
                bytes,
                bytes.len(),
                format!("need at least {} bytes, have {}", needed, bytes.len()),
            ));
        }
        Ok(())
    }

    /// Checks that `bytes` is exactly `expected` long.
    pub(crate) fn ensure_exact_len(
        record: &'static str,
        bytes: &[u8],
        expected: usize,
    ) -> Result<()> {
        Self::ensure_len(record, bytes, expected)?;
        if bytes.len() > expected {
            return Err(Self::format(
                record,
                bytes,
                expected,
                format!("{} unexpected trailing bytes", bytes.len() - expected),
            ));
        }
        Ok(())
    }
}
