use std::collections::BTreeMap;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use config::RefDataConfig;
use tracing::{debug, trace};

use crate::ByteBuffer;

/// Pool of reusable [`ByteBuffer`]s keyed by power-of-two capacity.
///
/// `acquire` returns a [`PooledBuffer`] guard that derefs to a cleared
/// buffer of at least the requested capacity and hands it back to the pool
/// on drop. At most `max_per_bucket` idle buffers are kept per capacity
/// class; extras are simply freed.
pub struct BufferPool {
    buckets: Mutex<BTreeMap<usize, Vec<ByteBuffer>>>,
    max_per_bucket: usize,
}

impl BufferPool {
    pub fn new(max_per_bucket: usize) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            max_per_bucket,
        }
    }

    pub fn from_config(config: &RefDataConfig) -> Self {
        Self::new(config.pool_max_per_bucket)
    }

    /// Takes a buffer with capacity `>= min_capacity` out of the pool,
    /// allocating one if the capacity class is empty.
    pub fn acquire(&self, min_capacity: usize) -> PooledBuffer<'_> {
        let class = min_capacity.max(1).next_power_of_two();
        let reused = self
            .buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&class)
            .and_then(Vec::pop);

        let buf = match reused {
            Some(mut buf) => {
                buf.clear();
                buf
            }
            None => {
                debug!(capacity = class, "buffer pool miss, allocating");
                ByteBuffer::with_capacity(class)
            }
        };

        PooledBuffer { pool: self, buf }
    }

    /// Number of idle buffers currently held, across all capacity classes.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    fn release(&self, buf: ByteBuffer) {
        let class = buf.capacity();
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(class).or_default();
        if bucket.len() < self.max_per_bucket {
            bucket.push(buf);
        } else {
            trace!(capacity = class, "buffer pool bucket full, dropping buffer");
        }
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("max_per_bucket", &self.max_per_bucket)
            .field("idle", &self.idle_count())
            .finish()
    }
}

/// A buffer on loan from a [`BufferPool`]; returned to it on drop.
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    buf: ByteBuffer,
}

impl PooledBuffer<'_> {
    /// Detaches the buffer from the pool so it can outlive the guard.
    pub fn into_inner(self) -> ByteBuffer {
        // skip Drop so nothing goes back to the pool
        let mut guard = ManuallyDrop::new(self);
        mem::take(&mut guard.buf)
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = ByteBuffer;

    fn deref(&self) -> &ByteBuffer {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut ByteBuffer {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(mem::take(&mut self.buf));
    }
}
