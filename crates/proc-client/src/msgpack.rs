//! MessagePack response decoding.
//!
//! Responses are read as `rmpv` values first so that the extension types the
//! evaluator emits survive conversion to JSON:
//!
//! - `-1` (timestamp) becomes an RFC 3339 string.
//! - `0` (decimal) becomes the decimal's text, unchanged.

use chrono::{DateTime, SecondsFormat};
use proc_core::{ProcError, ProcResult};
use rmpv::Value as Pack;
use serde_json::{Map, Number, Value};

pub const TIMESTAMP_EXT: i8 = -1;
pub const DECIMAL_EXT: i8 = 0;

/// Decodes a MessagePack document into a JSON tree.
pub fn decode(bytes: &[u8]) -> ProcResult<Value> {
    let mut reader = bytes;
    let pack = rmpv::decode::read_value(&mut reader).map_err(|e| ProcError::Protocol(e.to_string()))?;
    to_json(pack)
}

fn to_json(pack: Pack) -> ProcResult<Value> {
    let value = match pack {
        Pack::Nil => Value::Null,
        Pack::Boolean(b) => Value::Bool(b),
        Pack::Integer(n) => match (n.as_u64(), n.as_i64()) {
            (Some(n), _) => Value::from(n),
            (None, Some(n)) => Value::from(n),
            (None, None) => Value::Null,
        },
        Pack::F32(n) => float(f64::from(n)),
        Pack::F64(n) => float(n),
        Pack::String(s) => Value::String(String::from_utf8_lossy(s.as_bytes()).into_owned()),
        Pack::Binary(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        Pack::Array(items) => Value::Array(items.into_iter().map(to_json).collect::<ProcResult<_>>()?),
        Pack::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                let key = match key {
                    Pack::String(s) => String::from_utf8_lossy(s.as_bytes()).into_owned(),
                    other => to_json(other)?.to_string(),
                };
                map.insert(key, to_json(value)?);
            }
            Value::Object(map)
        }
        Pack::Ext(TIMESTAMP_EXT, data) => Value::String(timestamp(&data)?),
        Pack::Ext(DECIMAL_EXT, data) => Value::String(String::from_utf8_lossy(&data).into_owned()),
        Pack::Ext(kind, _) => {
            return Err(ProcError::Protocol(format!("unsupported msgpack extension type {kind}")));
        }
    };
    Ok(value)
}

fn float(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Timestamp extension in its 32, 64 or 96 bit layout.
fn timestamp(data: &[u8]) -> ProcResult<String> {
    let (seconds, nanos) = match data.len() {
        4 => (i64::from(u32::from_be_bytes(bytes(data, 0)?)), 0),
        8 => {
            let packed = u64::from_be_bytes(bytes(data, 0)?);
            ((packed & 0x3_ffff_ffff) as i64, (packed >> 34) as u32)
        }
        12 => (
            i64::from_be_bytes(bytes(data, 4)?),
            u32::from_be_bytes(bytes(data, 0)?),
        ),
        len => return Err(ProcError::Protocol(format!("invalid timestamp length {len}"))),
    };
    DateTime::from_timestamp(seconds, nanos)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .ok_or_else(|| ProcError::Protocol(format!("timestamp out of range: {seconds}")))
}

fn bytes<const N: usize>(data: &[u8], offset: usize) -> ProcResult<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| ProcError::Protocol("truncated timestamp".into()))
}
