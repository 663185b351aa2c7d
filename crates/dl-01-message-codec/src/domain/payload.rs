//! # Payload Encoding
//!
//! A payload is a run of `key u32 | len u32 | value[len]` entries. Entries
//! are written in key order; readers accept any order and keep the last
//! occurrence of a repeated key.

use bytes::{Buf, BufMut};
use shared_types::{KeyType, Message, Value, ValueKind};
use tracing::trace;

use super::errors::CodecError;
use super::header::{FrameHeader, MAX_PAYLOAD_LEN};

/// Serialise a message body.
pub fn encode_payload(msg: &Message) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for (key, value) in msg.iter() {
        if value.kind() != key.kind() {
            return Err(CodecError::KindMismatch { key: *key });
        }
        let body = encode_value(*key, value)?;
        out.put_u32(key.code());
        out.put_u32(len_u32(*key, body.len())?);
        out.extend_from_slice(&body);
    }
    Ok(out)
}

/// Serialise a complete frame (header + payload).
pub fn encode_frame(msg: &Message) -> Result<Vec<u8>, CodecError> {
    let payload = encode_payload(msg)?;
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::FrameTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }
    let header = FrameHeader::binary(payload.len() as u32);
    let mut out = Vec::with_capacity(header.frame_len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Parse a message body. Unknown keys are skipped.
pub fn decode_payload(mut buf: &[u8]) -> Result<Message, CodecError> {
    let mut msg = Message::new();
    while buf.has_remaining() {
        let code = read_u32(&mut buf, "entry key")?;
        let len = read_u32(&mut buf, "entry length")? as usize;
        if buf.remaining() < len {
            return Err(CodecError::Truncated { what: "entry value" });
        }
        let (value_bytes, rest) = buf.split_at(len);
        buf = rest;

        let Some(key) = KeyType::from_code(code) else {
            trace!(code, len, "Skipping unknown key");
            continue;
        };
        msg.insert(key, decode_value(key, value_bytes)?);
    }
    Ok(msg)
}

fn encode_value(key: KeyType, value: &Value) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    match value {
        Value::Bytes(b) => out.extend_from_slice(b),
        Value::Text(s) => out.extend_from_slice(s.as_bytes()),
        Value::Int(v) => out.put_i64(*v),
        Value::Bool(v) => out.put_u8(u8::from(*v)),
        Value::List(items) => put_list(&mut out, key, items)?,
        Value::Tree(layers) => {
            out.put_u32(len_u32(key, layers.len())?);
            for layer in layers {
                put_list(&mut out, key, layer)?;
            }
        }
    }
    Ok(out)
}

fn decode_value(key: KeyType, mut bytes: &[u8]) -> Result<Value, CodecError> {
    let value = match key.kind() {
        ValueKind::Bytes => Value::Bytes(bytes.to_vec()),
        ValueKind::Text => match std::str::from_utf8(bytes) {
            Ok(s) => Value::Text(s.to_string()),
            Err(_) => {
                return Err(CodecError::MalformedValue {
                    key,
                    detail: "invalid UTF-8",
                })
            }
        },
        ValueKind::Int => {
            let array: [u8; 8] = bytes.try_into().map_err(|_| CodecError::MalformedValue {
                key,
                detail: "integer must be 8 bytes",
            })?;
            Value::Int(i64::from_be_bytes(array))
        }
        ValueKind::Bool => match bytes {
            [0] => Value::Bool(false),
            [1] => Value::Bool(true),
            _ => {
                return Err(CodecError::MalformedValue {
                    key,
                    detail: "boolean must be a single 0/1 byte",
                })
            }
        },
        ValueKind::List => {
            let items = get_list(&mut bytes)?;
            ensure_consumed(key, bytes)?;
            Value::List(items)
        }
        ValueKind::Tree => {
            let layer_count = read_u32(&mut bytes, "tree layer count")?;
            let mut layers = Vec::new();
            for _ in 0..layer_count {
                layers.push(get_list(&mut bytes)?);
            }
            ensure_consumed(key, bytes)?;
            Value::Tree(layers)
        }
    };
    Ok(value)
}

fn put_list(out: &mut Vec<u8>, key: KeyType, items: &[Vec<u8>]) -> Result<(), CodecError> {
    out.put_u32(len_u32(key, items.len())?);
    for item in items {
        out.put_u32(len_u32(key, item.len())?);
        out.extend_from_slice(item);
    }
    Ok(())
}

fn get_list(buf: &mut &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
    let count = read_u32(buf, "list count")? as usize;
    // Each item needs at least its 4-byte length prefix.
    if count > buf.remaining() / 4 {
        return Err(CodecError::Truncated { what: "list items" });
    }
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let len = read_u32(buf, "list item length")? as usize;
        if buf.remaining() < len {
            return Err(CodecError::Truncated { what: "list item" });
        }
        items.push(buf[..len].to_vec());
        buf.advance(len);
    }
    Ok(items)
}

fn read_u32(buf: &mut &[u8], what: &'static str) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Truncated { what });
    }
    Ok(buf.get_u32())
}

fn ensure_consumed(key: KeyType, rest: &[u8]) -> Result<(), CodecError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CodecError::MalformedValue {
            key,
            detail: "trailing bytes",
        })
    }
}

fn len_u32(key: KeyType, len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::ValueTooLong { key })
}
