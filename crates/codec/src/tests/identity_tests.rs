use super::helpers::*;
use crate::*;
use anyhow::Result;

fn stream() -> StreamIdentity<'static> {
    StreamIdentity::new("2f1b3c4d-uuid", "v7", 1234, 0)
}

// -------------------- Stream identity --------------------

#[test]
fn stream_identity_round_trip() -> Result<()> {
    let id = stream();
    let bytes = encode(128, |buf| id.serialize(buf))?;
    assert_eq!(bytes.len(), id.serialized_size());
    let decoded = StreamIdentity::deserialize(&bytes)?;
    assert_eq!(decoded, id);
    assert_eq!(decoded.stream_id(), 1234);
    assert_eq!(decoded.part_index(), 0);
    Ok(())
}

#[test]
fn stream_identity_small_values_are_compact() -> Result<()> {
    let id = StreamIdentity::new("u", "1", 5, 1);
    let bytes = encode(16, |buf| id.serialize(buf))?;
    assert_eq!(bytes, [1, b'u', 1, b'1', 5, 1]);
    Ok(())
}

#[test]
fn stream_identity_large_numbers() -> Result<()> {
    let id = StreamIdentity::new("p", "v", u64::MAX, 1 << 40);
    let bytes = encode(64, |buf| id.serialize(buf))?;
    assert_eq!(StreamIdentity::deserialize(&bytes)?, id);
    Ok(())
}

#[test]
fn stream_identity_trailing_bytes_rejected() -> Result<()> {
    let mut bytes = encode(64, |buf| stream().serialize(buf))?;
    bytes.push(0);
    assert!(is_format(&StreamIdentity::deserialize(&bytes).unwrap_err()));
    Ok(())
}

#[test]
fn stream_identity_truncated_rejected() -> Result<()> {
    let bytes = encode(64, |buf| stream().serialize(buf))?;
    for cut in 0..bytes.len() {
        assert!(StreamIdentity::deserialize(&bytes[..cut]).is_err(), "cut at {cut}");
    }
    Ok(())
}

#[test]
fn stream_identity_string_length_past_end_rejected() {
    let bytes = [10, b'a', b'b'];
    assert!(is_format(&StreamIdentity::deserialize(&bytes).unwrap_err()));
}

// -------------------- Map identity --------------------

#[test]
fn map_identity_named_round_trip() -> Result<()> {
    let id = MapIdentity::named(stream(), "country-codes");
    let bytes = encode(128, |buf| id.serialize(buf))?;
    let decoded = MapIdentity::deserialize(&bytes)?;
    assert_eq!(decoded, id);
    assert_eq!(decoded.map_name(), Some("country-codes"));
    Ok(())
}

#[test]
fn anonymous_and_empty_name_are_distinct() -> Result<()> {
    let anonymous = MapIdentity::anonymous(stream());
    let empty = MapIdentity::named(stream(), "");

    let a = encode(128, |buf| anonymous.serialize(buf))?;
    let e = encode(128, |buf| empty.serialize(buf))?;
    let s = encode(128, |buf| stream().serialize(buf))?;

    assert_eq!(a, s);
    assert_eq!(e.len(), s.len() + 1);
    assert_eq!(e.last(), Some(&0));

    assert_eq!(MapIdentity::deserialize(&a)?.map_name(), None);
    assert_eq!(MapIdentity::deserialize(&e)?.map_name(), Some(""));
    Ok(())
}

#[test]
fn map_identity_starts_with_stream_identity() -> Result<()> {
    let s = encode(128, |buf| stream().serialize(buf))?;
    let m = encode(128, |buf| MapIdentity::named(stream(), "m").serialize(buf))?;
    assert!(m.starts_with(&s));
    Ok(())
}

#[test]
fn map_identity_into_owned_outlives_buffer() -> Result<()> {
    let bytes = encode(128, |buf| MapIdentity::named(stream(), "m").serialize(buf))?;
    let owned = MapIdentity::deserialize(&bytes)?.into_owned();
    drop(bytes);
    assert_eq!(owned.stream().pipeline_uuid(), "2f1b3c4d-uuid");
    assert_eq!(owned.stream().pipeline_version(), "v7");
    assert_eq!(owned.map_name(), Some("m"));
    Ok(())
}
