//! Core value and identifier types
//!
//! A shard is a logical row-group addressed by a 64-bit id; each of its
//! columns holds a sequence of typed values persisted as blocks. The value
//! type is fixed per column for the lifetime of a shard and selects the
//! codec on both the encode and decode paths.

use serde::{Deserialize, Serialize};

/// Unique identifier of a shard
pub type ShardId = u64;

/// Identifier of a column, scoped to one shard
pub type ColumnId = u64;

/// Byte width of a fixed-width value on disk
pub const FIXED_WIDTH_BYTES: usize = 8;

/// Byte width of a variable-length value's length prefix
pub const LENGTH_PREFIX_BYTES: usize = 4;

/// The closed set of supported column value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// 8-byte little-endian signed integers
    FixedWidth,

    /// Length-prefixed byte strings (text or binary)
    VariableLength,
}

impl ValueType {
    /// Single-byte tag persisted in block file headers
    pub(crate) fn tag(self) -> u8 {
        match self {
            ValueType::FixedWidth => 0x01,
            ValueType::VariableLength => 0x02,
        }
    }

    /// Inverse of `tag`; `None` for an unknown byte
    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(ValueType::FixedWidth),
            0x02 => Some(ValueType::VariableLength),
            _ => None,
        }
    }
}

/// A single typed column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Fixed-width 64-bit integer
    Int64(i64),

    /// Variable-length byte string
    Bytes(Vec<u8>),
}

impl Value {
    /// The type this value encodes as
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int64(_) => ValueType::FixedWidth,
            Value::Bytes(_) => ValueType::VariableLength,
        }
    }

    /// Serialized size of this value in a block payload
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Int64(_) => FIXED_WIDTH_BYTES,
            Value::Bytes(b) => LENGTH_PREFIX_BYTES + b.len(),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Bytes(v.as_bytes().to_vec())
    }
}

/// One tuple of an import stream, projected into column order
pub type Row = Vec<Value>;
