//! Option codec: typed host values ↔ the library's option byte buffers.
//!
//! The library's option buffers do not describe their own type, so the
//! codec dispatches on *which* option is addressed:
//!
//! | (level, option)                         | Kind    | Wire form                 |
//! |-----------------------------------------|---------|---------------------------|
//! | `NN_SOL_SOCKET`, `NN_SOCKET_NAME`       | `Str`   | UTF-8 bytes, NUL-trimmed  |
//! | `NN_SUB`, `NN_SUB_(UN)SUBSCRIBE`        | `Topic` | raw bytes (write-only)    |
//! | everything else                         | `Int`   | native-endian `i32`       |

use crate::consts::*;
use crate::error::{BridgeError, Result};

/// Size of the retrieval buffer handed to `getsockopt`.
pub const GET_BUFFER_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Int,
    Str,
    Topic,
}

/// Determine how an option is represented on the wire.
pub fn kind_of(level: i32, option: i32) -> OptionKind {
    match (level, option) {
        (NN_SOL_SOCKET, NN_SOCKET_NAME) => OptionKind::Str,
        (NN_SUB, NN_SUB_SUBSCRIBE | NN_SUB_UNSUBSCRIBE) => OptionKind::Topic,
        _ => OptionKind::Int,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Int(i32),
    Str(String),
    Bytes(Vec<u8>),
}

impl OptionValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            OptionValue::Int(_) => "integer",
            OptionValue::Str(_) => "string",
            OptionValue::Bytes(_) => "bytes",
        }
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        OptionValue::Int(v)
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Int(v as i32)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Str(v.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

impl From<&[u8]> for OptionValue {
    fn from(v: &[u8]) -> Self {
        OptionValue::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for OptionValue {
    fn from(v: Vec<u8>) -> Self {
        OptionValue::Bytes(v)
    }
}

/// Encode `value` for `setsockopt`.
///
/// A value whose shape does not fit the option is rejected before the
/// library sees it.
pub fn encode(level: i32, option: i32, value: &OptionValue) -> Result<Vec<u8>> {
    match (kind_of(level, option), value) {
        (OptionKind::Int, OptionValue::Int(v)) => Ok(v.to_ne_bytes().to_vec()),
        (OptionKind::Str, OptionValue::Str(s)) => Ok(s.as_bytes().to_vec()),
        (OptionKind::Topic, OptionValue::Str(s)) => Ok(s.as_bytes().to_vec()),
        (OptionKind::Topic, OptionValue::Bytes(b)) => Ok(b.clone()),
        (kind, value) => Err(BridgeError::Argument(format!(
            "option {level}/{option} takes {} values, got {}",
            kind_name(kind),
            value.shape()
        ))),
    }
}

/// Decode a buffer filled by `getsockopt`.
pub fn decode(level: i32, option: i32, buf: &[u8]) -> Result<OptionValue> {
    match kind_of(level, option) {
        OptionKind::Int => {
            let bytes: [u8; 4] = buf
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| {
                    BridgeError::Argument(format!(
                        "option {level}/{option} returned {} bytes, expected 4",
                        buf.len()
                    ))
                })?;
            Ok(OptionValue::Int(i32::from_ne_bytes(bytes)))
        }
        OptionKind::Str => {
            let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            Ok(OptionValue::Str(String::from_utf8_lossy(&buf[..end]).into_owned()))
        }
        OptionKind::Topic => Ok(OptionValue::Bytes(buf.to_vec())),
    }
}

fn kind_name(kind: OptionKind) -> &'static str {
    match kind {
        OptionKind::Int => "integer",
        OptionKind::Str => "string",
        OptionKind::Topic => "topic",
    }
}
