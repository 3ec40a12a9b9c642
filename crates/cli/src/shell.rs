//! Command interpreter behind the `refdata` shell.
//!
//! Records travel as hex strings so that bytes copied out of a storage dump
//! can be pasted straight in. Every command is a pure function of its
//! arguments: nothing is stored between lines.

use anyhow::{anyhow, bail, Context, Result};
use buffer::{BufferPool, ByteBuffer};
use codec::{
    DedupKey, GenericValueSerde, KeyRange, MapIdentity, PointKey, ProcessingInfo,
    ProcessingInfoExtension, ProcessingState, RangeKey, RangeLocation, RefValue, StagingValue,
    StreamIdentity, Uid, ValueMeta, ValueSerdeRegistry,
};
use config::RefDataConfig;
use std::fmt::Write as _;
use std::str::FromStr;
use tracing::debug;

/// Result of one command line.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Empty,
    Exit,
}

pub struct Shell {
    registry: ValueSerdeRegistry,
    pool: BufferPool,
    buffer_capacity: usize,
}

impl Shell {
    pub fn new(config: &RefDataConfig) -> Self {
        Self {
            registry: ValueSerdeRegistry::with_defaults(),
            pool: BufferPool::from_config(config),
            buffer_capacity: config.buffer_capacity,
        }
    }

    pub fn execute(&self, line: &str) -> Result<Reply> {
        let mut parts = Args::new(line);
        let Some(cmd) = parts.next() else {
            return Ok(Reply::Empty);
        };
        debug!(command = cmd, "executing");
        let out = match cmd.to_uppercase().as_str() {
            "ENCODE" => self.encode(&mut parts)?,
            "DECODE" => self.decode(&mut parts)?,
            "LOCATE" => {
                let bytes = hex_arg(&mut parts, "range-hex")?;
                let uid = uid_arg(&mut parts)?;
                let probe: i64 = parse_arg(&mut parts, "probe")?;
                let location = match RangeKey::locate(&bytes, &uid, probe)? {
                    RangeLocation::UidMismatch => "uid-mismatch",
                    RangeLocation::Below => "below",
                    RangeLocation::Within => "within",
                    RangeLocation::Above => "above",
                };
                location.to_string()
            }
            "REFCOUNT" => {
                let op = arg(&mut parts, "INC|DEC")?.to_uppercase();
                let source = hex_arg(&mut parts, "meta-hex")?;
                let mut dest = self.pool.acquire(ValueMeta::SERIALIZED_SIZE);
                let count = match op.as_str() {
                    "INC" => ValueMeta::clone_with_increment(&source, &mut dest)?,
                    "DEC" => ValueMeta::clone_with_decrement(&source, &mut dest)?,
                    other => bail!("unknown REFCOUNT operation: {}", other),
                };
                format!("{} (ref_count={})", hex::encode(dest.as_slice()), count)
            }
            "TOUCH" => {
                let mut bytes = hex_arg(&mut parts, "info-hex")?;
                let time: i64 = parse_arg(&mut parts, "timestamp")?;
                ProcessingInfo::update_last_accessed_time(&mut bytes, time)?;
                hex::encode(bytes)
            }
            "STATE" => {
                let mut bytes = hex_arg(&mut parts, "info-hex")?;
                let state = parse_state(arg(&mut parts, "state")?)?;
                ProcessingInfo::update_state(&mut bytes, state)?;
                hex::encode(bytes)
            }
            "EXIT" | "QUIT" => return Ok(Reply::Exit),
            other => bail!("unknown command: {}", other),
        };
        Ok(Reply::Output(out))
    }

    fn encode(&self, parts: &mut Args<'_>) -> Result<String> {
        let kind = arg(parts, "record kind")?.to_uppercase();
        match kind.as_str() {
            "POINT" => {
                let uid = uid_arg(parts)?;
                let key = PointKey::new(uid, parts.rest())?;
                self.encode_with(key.serialized_size(), |buf| key.serialize(buf))
            }
            "RANGE" => {
                let uid = uid_arg(parts)?;
                let from = parse_arg(parts, "from")?;
                let to = parse_arg(parts, "to")?;
                let key = RangeKey::new(uid, KeyRange::new(from, to)?);
                self.encode_with(RangeKey::SERIALIZED_SIZE, |buf| key.serialize(buf))
            }
            "DEDUP" => {
                let key = DedupKey::for_value(parts.rest().as_bytes());
                self.encode_with(DedupKey::SERIALIZED_SIZE, |buf| key.serialize(buf))
            }
            "META" => {
                let type_id = parse_arg(parts, "type_id")?;
                let meta = ValueMeta::new(type_id, parse_arg(parts, "ref_count")?)?;
                self.encode_with(ValueMeta::SERIALIZED_SIZE, |buf| meta.serialize(buf))
            }
            "STREAM" => {
                let stream = stream_args(parts)?;
                self.encode_with(stream.serialized_size(), |buf| stream.serialize(buf))
            }
            "MAP" => {
                let stream = stream_args(parts)?;
                let map = match parts.next() {
                    Some(name) => MapIdentity::named(stream, name),
                    None => MapIdentity::anonymous(stream),
                };
                self.encode_with(map.serialized_size(), |buf| map.serialize(buf))
            }
            "INFO" => {
                let create = parse_arg(parts, "create")?;
                let access = parse_arg(parts, "access")?;
                let effective = parse_arg(parts, "effective")?;
                let state = parse_state(arg(parts, "state")?)?;
                let mut info = ProcessingInfo::new(create, effective, state);
                info.last_accessed_time_ms = access;
                self.encode_with(info.serialized_size(), |buf| info.serialize(buf))
            }
            "STAGING" => {
                let value = RefValue::string(parts.rest());
                let staged = StagingValue::from_value(&self.registry, &value)?;
                self.encode_with(staged.serialized_size(), |buf| staged.serialize(buf))
            }
            other => bail!("cannot encode {}", other),
        }
    }

    fn decode(&self, parts: &mut Args<'_>) -> Result<String> {
        let kind = arg(parts, "record kind")?.to_uppercase();
        let bytes = hex_arg(parts, "hex")?;
        let out = match kind.as_str() {
            "POINT" => {
                let key = PointKey::deserialize(&bytes)?;
                format!("uid={} key={:?}", key.uid(), key.key())
            }
            "RANGE" => {
                let key = RangeKey::deserialize(&bytes)?;
                format!(
                    "uid={} from={} to={}",
                    key.uid(),
                    key.range().from(),
                    key.range().to()
                )
            }
            "DEDUP" => {
                let key = DedupKey::deserialize(&bytes)?;
                format!("hash={:016x} id={}", key.hash(), key.id())
            }
            "META" => {
                let meta = ValueMeta::deserialize(&bytes)?;
                format!("type_id={} ref_count={}", meta.type_id(), meta.ref_count())
            }
            "STREAM" => describe_stream(&StreamIdentity::deserialize(&bytes)?),
            "MAP" => {
                let map = MapIdentity::deserialize(&bytes)?;
                match map.map_name() {
                    Some(name) => format!("{} map={:?}", describe_stream(map.stream()), name),
                    None => format!("{} map=(anonymous)", describe_stream(map.stream())),
                }
            }
            "INFO" => describe_info(&ProcessingInfo::deserialize(&bytes)?),
            "STAGING" => {
                let staged = StagingValue::deserialize(&bytes)?;
                let value = GenericValueSerde::new(&self.registry)
                    .deserialize(staged.type_id(), staged.value_bytes())?;
                format!(
                    "type_id={} hash={:016x}{} value={}",
                    staged.type_id(),
                    staged.hash(),
                    if staged.hash_matches() { "" } else { " (mismatch)" },
                    value
                )
            }
            other => bail!("cannot decode {}", other),
        };
        Ok(out)
    }

    fn encode_with<F>(&self, size: usize, write: F) -> Result<String>
    where
        F: FnOnce(&mut ByteBuffer) -> codec::Result<()>,
    {
        let mut buf = self.pool.acquire(size.max(self.buffer_capacity));
        write(&mut *buf)?;
        Ok(hex::encode(buf.as_slice()))
    }
}

fn describe_stream(stream: &StreamIdentity<'_>) -> String {
    format!(
        "pipeline={} version={} stream={} part={}",
        stream.pipeline_uuid(),
        stream.pipeline_version(),
        stream.stream_id(),
        stream.part_index()
    )
}

fn describe_info(info: &ProcessingInfo) -> String {
    let mut out = format!(
        "created={} accessed={} effective={} state={:?}",
        info.create_time_ms, info.last_accessed_time_ms, info.effective_time_ms, info.state
    );
    match &info.extension {
        ProcessingInfoExtension::Legacy => out.push_str(" legacy"),
        ProcessingInfoExtension::Versioned {
            version,
            features,
            maps,
        } => {
            let _ = write!(out, " version={} features={:#04x} maps=[", version, features.bits());
            for (i, entry) in maps.iter().enumerate() {
                let sep = if i == 0 { "" } else { " " };
                let _ = write!(out, "{}{}:{:#04x}", sep, entry.uid, entry.features.bits());
            }
            out.push(']');
        }
    }
    out
}

fn arg<'a>(parts: &mut Args<'a>, name: &str) -> Result<&'a str> {
    parts.next().ok_or_else(|| anyhow!("missing <{}>", name))
}

/// Whitespace-separated words of one command line.
///
/// Unlike `split_whitespace`, the unread tail stays available verbatim, so
/// free-text arguments keep their inner spacing.
struct Args<'a> {
    tail: &'a str,
}

impl<'a> Args<'a> {
    fn new(line: &'a str) -> Self {
        Self { tail: line }
    }

    fn next(&mut self) -> Option<&'a str> {
        let trimmed = self.tail.trim_start();
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (word, tail) = trimmed.split_at(end);
        self.tail = tail;
        (!word.is_empty()).then_some(word)
    }

    /// Everything after the last word read and its single separator, as
    /// typed. Line terminators are dropped.
    fn rest(&mut self) -> &'a str {
        let mut chars = self.tail.chars();
        let tail = match chars.next() {
            Some(c) if c.is_whitespace() => chars.as_str(),
            _ => self.tail,
        };
        self.tail = "";
        tail.trim_end_matches(['\r', '\n'])
    }
}

fn parse_arg<T>(parts: &mut Args<'_>, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = arg(parts, name)?;
    raw.parse()
        .with_context(|| format!("invalid <{}>: {}", name, raw))
}

fn hex_arg(parts: &mut Args<'_>, name: &str) -> Result<Vec<u8>> {
    let raw = arg(parts, name)?;
    hex::decode(raw).with_context(|| format!("invalid <{}>: not hex", name))
}

fn uid_arg(parts: &mut Args<'_>) -> Result<Uid> {
    parse_arg(parts, "uid").map(Uid::from_u32)
}

fn stream_args<'a>(parts: &mut Args<'a>) -> Result<StreamIdentity<'a>> {
    let pipeline = arg(parts, "pipeline")?;
    let version = arg(parts, "version")?;
    let stream_id = parse_arg(parts, "stream")?;
    let part = parse_arg(parts, "part")?;
    Ok(StreamIdentity::new(pipeline, version, stream_id, part))
}

/// Accepts a numeric state id or a state name in any case, with or without
/// separators (`complete`, `ReadyForPurge`, `ready-for-purge`).
fn parse_state(raw: &str) -> Result<ProcessingState> {
    if let Ok(id) = raw.parse::<u8>() {
        return ProcessingState::from_id(id).ok_or_else(|| anyhow!("unknown state id {}", id));
    }
    let wanted = normalize(raw);
    ProcessingState::ALL
        .into_iter()
        .find(|state| normalize(state.display_name()) == wanted)
        .ok_or_else(|| anyhow!("unknown state {}", raw))
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(shell: &Shell, line: &str) -> String {
        match shell.execute(line) {
            Ok(Reply::Output(out)) => out,
            Ok(other) => panic!("unexpected reply {other:?}"),
            Err(e) => format!("ERR {e:#}"),
        }
    }

    fn shell() -> Shell {
        Shell::new(&RefDataConfig::default())
    }

    // -------------------- Encode / decode --------------------

    #[test]
    fn point_key_round_trip() {
        let shell = shell();
        let hex = run(&shell, "ENCODE POINT 1 hello world");
        assert_eq!(hex, "0000000168656c6c6f20776f726c64");
        assert_eq!(
            run(&shell, &format!("DECODE POINT {hex}")),
            "uid=00000001 key=\"hello world\""
        );
    }

    #[test]
    fn free_text_keeps_inner_spacing() {
        let shell = shell();
        let hex = run(&shell, "ENCODE POINT 1 a  b\tc ");
        assert_eq!(
            run(&shell, &format!("DECODE POINT {hex}")),
            "uid=00000001 key=\"a  b\\tc \""
        );
        let staged = run(&shell, "encode staging  two  spaces");
        let decoded = run(&shell, &format!("DECODE STAGING {staged}"));
        assert!(decoded.ends_with("value=\" two  spaces\""), "{decoded}");
    }

    #[test]
    fn args_split_words_and_keep_tail() {
        let mut args = Args::new("  ONE two   three  four\r\n");
        assert_eq!(args.next(), Some("ONE"));
        assert_eq!(args.next(), Some("two"));
        assert_eq!(args.rest(), "  three  four");
        assert_eq!(args.next(), None);
        assert_eq!(args.rest(), "");
    }

    #[test]
    fn range_key_round_trip() {
        let shell = shell();
        let hex = run(&shell, "ENCODE RANGE 2 -5 5");
        assert_eq!(hex.len(), RangeKey::SERIALIZED_SIZE * 2);
        assert_eq!(
            run(&shell, &format!("DECODE RANGE {hex}")),
            "uid=00000002 from=-5 to=5"
        );
    }

    #[test]
    fn map_identity_named_and_anonymous() {
        let shell = shell();
        let named = run(&shell, "ENCODE MAP pipe v1 3 0 colours");
        let anonymous = run(&shell, "ENCODE MAP pipe v1 3 0");
        let stream = run(&shell, "ENCODE STREAM pipe v1 3 0");
        assert_eq!(anonymous, stream);
        assert!(named.starts_with(&stream));
        assert_eq!(
            run(&shell, &format!("DECODE MAP {named}")),
            "pipeline=pipe version=v1 stream=3 part=0 map=\"colours\""
        );
        assert!(run(&shell, &format!("DECODE MAP {anonymous}")).ends_with("map=(anonymous)"));
    }

    #[test]
    fn staging_value_decodes_lazily() {
        let shell = shell();
        let hex = run(&shell, "ENCODE STAGING some text");
        let out = run(&shell, &format!("DECODE STAGING {hex}"));
        assert!(out.starts_with("type_id=0 hash="), "{out}");
        assert!(out.ends_with("value=\"some text\""), "{out}");
    }

    #[test]
    fn staging_with_unknown_type_still_decodes() {
        let shell = shell();
        let hex = format!("0e{}{}", "00".repeat(8), hex::encode("raw"));
        let out = run(&shell, &format!("DECODE STAGING {hex}"));
        assert!(out.contains("(mismatch)"));
        assert!(out.ends_with("value=unknown type 14 (3 bytes)"));
    }

    // -------------------- Mutators --------------------

    #[test]
    fn refcount_inc_and_dec() {
        let shell = shell();
        let meta = run(&shell, "ENCODE META 1 0");
        assert_eq!(meta, "01000000");
        assert_eq!(run(&shell, "REFCOUNT INC 01000000"), "01000001 (ref_count=1)");
        assert!(run(&shell, &format!("REFCOUNT DEC {meta}")).starts_with("ERR "));
    }

    #[test]
    fn touch_and_state_patch_in_place() {
        let shell = shell();
        let info = run(&shell, "ENCODE INFO 1 2 3 load-in-progress");
        let touched = run(&shell, &format!("TOUCH {info} 99"));
        let done = run(&shell, &format!("STATE {touched} complete"));
        assert_eq!(done.len(), info.len());
        assert_eq!(
            run(&shell, &format!("DECODE INFO {done}")),
            "created=1 accessed=99 effective=3 state=Complete version=1 features=0x00 maps=[]"
        );
    }

    #[test]
    fn legacy_info_decodes() {
        let shell = shell();
        let info = run(&shell, "ENCODE INFO 1 2 3 2");
        let prefix = &info[..codec::PROCESSING_INFO_PREFIX_LEN * 2];
        assert!(run(&shell, &format!("DECODE INFO {prefix}")).ends_with(" legacy"));
    }

    #[test]
    fn locate_reports_position() {
        let shell = shell();
        let key = run(&shell, "ENCODE RANGE 7 10 20");
        assert_eq!(run(&shell, &format!("LOCATE {key} 7 9")), "below");
        assert_eq!(run(&shell, &format!("LOCATE {key} 7 10")), "within");
        assert_eq!(run(&shell, &format!("LOCATE {key} 7 20")), "above");
        assert_eq!(run(&shell, &format!("LOCATE {key} 8 15")), "uid-mismatch");
    }

    // -------------------- Errors --------------------

    #[test]
    fn bad_input_is_reported() {
        let shell = shell();
        assert!(run(&shell, "DECODE META zz").contains("not hex"));
        assert!(run(&shell, "DECODE META 0102").contains("malformed value meta"));
        assert!(run(&shell, "ENCODE RANGE 1 5 5").contains("invalid interval"));
        assert!(run(&shell, "ENCODE INFO 1 2 3 sleeping").contains("unknown state"));
        assert!(run(&shell, "FROB").contains("unknown command"));
    }

    #[test]
    fn blank_and_exit() {
        let shell = shell();
        assert_eq!(shell.execute("   ").ok(), Some(Reply::Empty));
        assert_eq!(shell.execute("quit").ok(), Some(Reply::Exit));
    }

    #[test]
    fn state_names_parse() {
        assert_eq!(parse_state("ReadyForPurge").ok(), Some(ProcessingState::ReadyForPurge));
        assert_eq!(parse_state("purge_failed").ok(), Some(ProcessingState::PurgeFailed));
        assert_eq!(parse_state("4").ok(), Some(ProcessingState::Terminated));
        assert!(parse_state("9").is_err());
    }
}
