use anyhow::Result;
use buffer::ByteBuffer;

use crate::CodecError;

/// Runs a serializer against a fresh buffer and returns the flipped record.
pub fn encode<F>(capacity: usize, write: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut ByteBuffer) -> crate::Result<()>,
{
    let mut buf = ByteBuffer::with_capacity(capacity);
    write(&mut buf)?;
    Ok(buf.to_vec())
}

pub fn is_format(err: &CodecError) -> bool {
    matches!(err, CodecError::Format { .. })
}

pub fn is_range(err: &CodecError) -> bool {
    matches!(err, CodecError::Range { .. })
}
