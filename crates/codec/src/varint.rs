//! Unsigned LEB128 variable-length integers.
//!
//! Seven payload bits per byte, least significant group first, high bit set
//! on every byte except the last. A `u64` needs at most 10 bytes.

use buffer::ByteBuffer;

use crate::error::Result;

pub const MAX_VARINT_LEN: usize = 10;

/// Number of bytes `value` occupies when encoded.
#[must_use]
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Encodes `value` into `out`, returning the number of bytes used.
pub fn encode(mut value: u64, out: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        out[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    out[i] = value as u8;
    i + 1
}

/// Appends the encoding of `value` at the buffer's position.
pub fn put(buf: &mut ByteBuffer, value: u64) -> Result<()> {
    let mut scratch = [0u8; MAX_VARINT_LEN];
    let n = encode(value, &mut scratch);
    buf.put_slice(&scratch[..n])?;
    Ok(())
}

/// Decodes a varint from the front of `bytes`, returning `(value, bytes_used)`.
///
/// The error is a short description suitable for a format error detail.
pub fn decode(bytes: &[u8]) -> std::result::Result<(u64, usize), &'static str> {
    let mut value = 0u64;
    for (i, &b) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        let group = u64::from(b & 0x7F);
        if i == MAX_VARINT_LEN - 1 && group > 1 {
            return Err("varint overflows 64 bits");
        }
        value |= group << (7 * i);
        if b & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if bytes.len() >= MAX_VARINT_LEN {
        Err("varint longer than 10 bytes")
    } else {
        Err("truncated varint")
    }
}
