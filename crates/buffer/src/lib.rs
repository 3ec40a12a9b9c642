//! # Buffer
//!
//! The buffer interface the codec layer consumes from the storage engine.
//!
//! A [`ByteBuffer`] is a fixed-capacity byte region with a `position` and a
//! `limit`, in the style of the engine's pooled direct buffers:
//!
//! ```text
//!  0 <= position <= limit <= capacity
//!
//!  write mode: [ written | free space ........ ]
//!              0         position              limit == capacity
//!
//!  after flip: [ record bytes | stale ........ ]
//!              position == 0  limit
//! ```
//!
//! Relative `put_*` calls write at `position` and advance it. Once a record is
//! written, [`ByteBuffer::flip`] turns the written region into the readable
//! window returned by [`ByteBuffer::as_slice`]. All multi-byte integers are
//! big-endian so that byte order matches numeric order.
//!
//! [`BufferPool`] hands out reusable buffers grouped by power-of-two capacity.

mod pool;

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

pub use pool::{BufferPool, PooledBuffer};

/// Errors raised by buffer bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// A write needed more space than the buffer has left.
    #[error("buffer overflow: need {needed} bytes, {remaining} remaining (capacity {capacity})")]
    Overflow {
        needed: usize,
        remaining: usize,
        capacity: usize,
    },

    /// A position or limit outside the allowed bounds.
    #[error("invalid {what} {value} (bound {bound})")]
    InvalidBound {
        what: &'static str,
        value: usize,
        bound: usize,
    },
}

/// Fixed-capacity byte buffer with position/limit bookkeeping.
///
/// The default buffer has zero capacity and owns no allocation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    position: usize,
    limit: usize,
}

impl ByteBuffer {
    /// Allocates a zero-filled buffer ready for writing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            position: 0,
            limit: capacity,
        }
    }

    /// Wraps existing bytes as a readable buffer (`position = 0`, `limit = len`).
    pub fn from_vec(data: Vec<u8>) -> Self {
        let limit = data.len();
        Self {
            data,
            position: 0,
            limit,
        }
    }

    /// Copies `bytes` into a new readable buffer.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self::from_vec(bytes.to_vec())
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes between `position` and `limit`.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    #[must_use]
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    pub fn set_position(&mut self, position: usize) -> Result<(), BufferError> {
        if position > self.limit {
            return Err(BufferError::InvalidBound {
                what: "position",
                value: position,
                bound: self.limit,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Moves the limit. The position is pulled back if it would exceed it.
    pub fn set_limit(&mut self, limit: usize) -> Result<(), BufferError> {
        if limit > self.capacity() {
            return Err(BufferError::InvalidBound {
                what: "limit",
                value: limit,
                bound: self.capacity(),
            });
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    /// Resets to write mode over the whole capacity. Contents are not zeroed.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity();
    }

    /// Ends a write: the bytes written so far become the readable window.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    /// The readable window `[position, limit)`.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.position..self.limit]
    }

    /// Mutable view of `[position, limit)`, used by the absolute-offset mutators.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[self.position..self.limit]
    }

    /// Copies the readable window out of the buffer.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    // ---- Relative puts ----

    pub fn put_u8(&mut self, v: u8) -> Result<(), BufferError> {
        let at = self.reserve(1)?;
        self.data[at] = v;
        Ok(())
    }

    pub fn put_u16(&mut self, v: u16) -> Result<(), BufferError> {
        let at = self.reserve(2)?;
        BigEndian::write_u16(&mut self.data[at..at + 2], v);
        Ok(())
    }

    /// Writes the low 24 bits of `v`. Callers are responsible for range-checking.
    pub fn put_u24(&mut self, v: u32) -> Result<(), BufferError> {
        let at = self.reserve(3)?;
        BigEndian::write_u24(&mut self.data[at..at + 3], v);
        Ok(())
    }

    pub fn put_u32(&mut self, v: u32) -> Result<(), BufferError> {
        let at = self.reserve(4)?;
        BigEndian::write_u32(&mut self.data[at..at + 4], v);
        Ok(())
    }

    pub fn put_u64(&mut self, v: u64) -> Result<(), BufferError> {
        let at = self.reserve(8)?;
        BigEndian::write_u64(&mut self.data[at..at + 8], v);
        Ok(())
    }

    pub fn put_i64(&mut self, v: i64) -> Result<(), BufferError> {
        let at = self.reserve(8)?;
        BigEndian::write_i64(&mut self.data[at..at + 8], v);
        Ok(())
    }

    pub fn put_slice(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let at = self.reserve(bytes.len())?;
        self.data[at..at + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Claims `n` bytes at the current position, returning where they start.
    fn reserve(&mut self, n: usize) -> Result<usize, BufferError> {
        if n > self.remaining() {
            return Err(BufferError::Overflow {
                needed: n,
                remaining: self.remaining(),
                capacity: self.capacity(),
            });
        }
        let at = self.position;
        self.position += n;
        Ok(at)
    }
}

impl std::fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("capacity", &self.capacity())
            .field("position", &self.position)
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests;
