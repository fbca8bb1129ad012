//! RESP wire types.
//!
//! The server speaks a subset of the RESP family. Every reply is one of
//! five types, identified by its first byte and terminated by CRLF:
//!
//! - `+` simple string: `+OK\r\n`
//! - `-` error: `-ERR wrong number of arguments\r\n`
//! - `:` integer: `:42\r\n`
//! - `$` bulk string: `$5\r\nhello\r\n` (null: `$-1\r\n`)
//! - `*` array: `*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n`
//!
//! Requests arrive as arrays of bulk strings; the first element is the
//! command name.

use bytes::Bytes;

/// The CRLF terminator every RESP frame ends with.
pub const CRLF: &[u8] = b"\r\n";

/// RESP type prefix bytes.
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// Constant replies, pre-serialized so hot paths can write them without
/// going through [`RespValue::serialize`].
pub mod wire {
    pub const OK: &[u8] = b"+OK\r\n";
    pub const PONG: &[u8] = b"+PONG\r\n";
    pub const NIL: &[u8] = b"$-1\r\n";
    pub const ZERO: &[u8] = b":0\r\n";
    pub const ONE: &[u8] = b":1\r\n";
    /// TTL reply for a key that exists but carries no expiry.
    pub const TTL_PERSISTENT: &[u8] = b":-1\r\n";
    /// TTL reply for a key that is absent or already expired.
    pub const TTL_MISSING: &[u8] = b":-2\r\n";
}

/// A value in the RESP protocol, used for both parsed requests and
/// outgoing replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Non-binary-safe string; must not contain CRLF.
    SimpleString(String),
    /// Error condition, rendered with a `-` prefix.
    Error(String),
    /// 64-bit signed integer.
    Integer(i64),
    /// Binary-safe string with an explicit length header.
    BulkString(Bytes),
    /// Null bulk string (`$-1\r\n`).
    Null,
    /// Array of any RESP values.
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    pub fn null() -> Self {
        RespValue::Null
    }

    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    /// Serializes this value to its wire form.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes this value into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Null => {
                buf.extend_from_slice(wire::NIL);
            }
            RespValue::Array(values) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(values.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for value in values {
                    value.serialize_into(buf);
                }
            }
        }
    }

    /// Returns the payload if this is a bulk string.
    pub fn as_bulk(&self) -> Option<&[u8]> {
        match self {
            RespValue::BulkString(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the payload as UTF-8 if this is a simple or bulk string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) => Some(s),
            RespValue::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}
