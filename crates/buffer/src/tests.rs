use super::*;

// -------------------- Position / limit bookkeeping --------------------

#[test]
fn new_buffer_is_in_write_mode() {
    let buf = ByteBuffer::with_capacity(16);
    assert_eq!(buf.capacity(), 16);
    assert_eq!(buf.position(), 0);
    assert_eq!(buf.limit(), 16);
    assert_eq!(buf.remaining(), 16);
}

#[test]
fn flip_exposes_written_bytes() -> anyhow::Result<()> {
    let mut buf = ByteBuffer::with_capacity(16);
    buf.put_u8(0xAB)?;
    buf.put_u16(0x0102)?;
    buf.flip();

    assert_eq!(buf.position(), 0);
    assert_eq!(buf.limit(), 3);
    assert_eq!(buf.as_slice(), &[0xAB, 0x01, 0x02]);
    Ok(())
}

#[test]
fn clear_resets_to_full_capacity() -> anyhow::Result<()> {
    let mut buf = ByteBuffer::with_capacity(8);
    buf.put_u32(7)?;
    buf.flip();
    buf.clear();
    assert_eq!(buf.position(), 0);
    assert_eq!(buf.limit(), 8);
    Ok(())
}

#[test]
fn set_limit_beyond_capacity_is_rejected() {
    let mut buf = ByteBuffer::with_capacity(4);
    let err = buf.set_limit(5).unwrap_err();
    assert_eq!(
        err,
        BufferError::InvalidBound {
            what: "limit",
            value: 5,
            bound: 4
        }
    );
}

#[test]
fn set_limit_pulls_position_back() -> anyhow::Result<()> {
    let mut buf = ByteBuffer::with_capacity(8);
    buf.put_u64(1)?;
    buf.set_limit(4)?;
    assert_eq!(buf.position(), 4);
    Ok(())
}

#[test]
fn set_position_past_limit_is_rejected() {
    let mut buf = ByteBuffer::from_vec(vec![1, 2, 3]);
    assert!(buf.set_position(4).is_err());
    assert!(buf.set_position(3).is_ok());
    assert!(!buf.has_remaining());
}

// -------------------- Puts --------------------

#[test]
fn integers_are_big_endian() -> anyhow::Result<()> {
    let mut buf = ByteBuffer::with_capacity(32);
    buf.put_u24(0x0A0B0C)?;
    buf.put_u32(0x01020304)?;
    buf.put_u64(0x1122334455667788)?;
    buf.put_i64(-1)?;
    buf.flip();

    let bytes = buf.as_slice();
    assert_eq!(&bytes[0..3], &[0x0A, 0x0B, 0x0C]);
    assert_eq!(&bytes[3..7], &[1, 2, 3, 4]);
    assert_eq!(&bytes[7..15], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
    assert_eq!(&bytes[15..23], &[0xFF; 8]);
    Ok(())
}

#[test]
fn overflow_is_reported_and_position_unchanged() -> anyhow::Result<()> {
    let mut buf = ByteBuffer::with_capacity(6);
    buf.put_u32(1)?;
    let err = buf.put_u64(2).unwrap_err();
    assert_eq!(
        err,
        BufferError::Overflow {
            needed: 8,
            remaining: 2,
            capacity: 6
        }
    );
    assert_eq!(buf.position(), 4);
    Ok(())
}

#[test]
fn put_slice_copies_bytes() -> anyhow::Result<()> {
    let mut buf = ByteBuffer::with_capacity(4);
    buf.put_slice(b"abcd")?;
    assert!(buf.put_slice(b"e").is_err());
    buf.flip();
    assert_eq!(buf.to_vec(), b"abcd".to_vec());
    Ok(())
}

#[test]
fn as_mut_slice_allows_in_place_edits() {
    let mut buf = ByteBuffer::copy_from_slice(&[0, 0, 0]);
    buf.as_mut_slice()[1] = 9;
    assert_eq!(buf.as_slice(), &[0, 9, 0]);
}

// -------------------- Pool --------------------

#[test]
fn pool_rounds_capacity_up_to_power_of_two() {
    let pool = BufferPool::new(4);
    let buf = pool.acquire(100);
    assert_eq!(buf.capacity(), 128);
}

#[test]
fn pooled_buffer_returns_on_drop_and_is_reused() -> anyhow::Result<()> {
    let pool = BufferPool::new(4);
    {
        let mut buf = pool.acquire(16);
        buf.put_u64(42)?;
        buf.flip();
    }
    assert_eq!(pool.idle_count(), 1);

    let buf = pool.acquire(16);
    assert_eq!(pool.idle_count(), 0);
    // reused buffers come back cleared
    assert_eq!(buf.position(), 0);
    assert_eq!(buf.limit(), 16);
    Ok(())
}

#[test]
fn pool_caps_idle_buffers_per_bucket() {
    let pool = BufferPool::new(1);
    let a = pool.acquire(8);
    let b = pool.acquire(8);
    drop(a);
    drop(b);
    assert_eq!(pool.idle_count(), 1);
}

#[test]
fn into_inner_detaches_from_pool() {
    let pool = BufferPool::new(4);
    let owned = pool.acquire(8).into_inner();
    assert_eq!(owned.capacity(), 8);
    assert_eq!(pool.idle_count(), 0);
}

#[test]
fn detached_buffer_leaves_pool_usable() {
    let pool = BufferPool::new(4);
    let _owned = pool.acquire(8).into_inner();
    drop(pool.acquire(8));
    assert_eq!(pool.idle_count(), 1);
    assert_eq!(pool.acquire(8).capacity(), 8);
}

#[test]
fn default_buffer_is_empty() {
    let buf = ByteBuffer::default();
    assert_eq!(buf.capacity(), 0);
    assert_eq!(buf.remaining(), 0);
    assert!(buf.as_slice().is_empty());
}

#[test]
fn pool_from_config_uses_bucket_limit() {
    let cfg = config::RefDataConfig {
        pool_max_per_bucket: 0,
        ..Default::default()
    };
    let pool = BufferPool::from_config(&cfg);
    drop(pool.acquire(4));
    assert_eq!(pool.idle_count(), 0);
}
