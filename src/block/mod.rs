//! Block Codec Module
//!
//! Encodes and decodes one column's typed values into size-bounded binary
//! blocks. A block is the unit of transfer between storage and the execution
//! layer; blocks of a column concatenate in order to reconstruct the full
//! value sequence. This module knows nothing about shards or files.
//!
//! ## Payload Format
//! ```text
//! FixedWidth                      VariableLength
//! ┌──────────────────────┐        ┌───────────────────────────┐
//! │ Value 1: i64 LE (8)  │        │ Len: u32 LE (4) │ Bytes   │
//! ├──────────────────────┤        ├─────────────────┴─────────┤
//! │ Value 2: i64 LE (8)  │        │ Len: u32 LE (4) │ Bytes   │
//! │ ...                  │        │ ...                       │
//! └──────────────────────┘        └───────────────────────────┘
//! ```
//!
//! ## Chunking Rules
//! - FixedWidth: a block holds `floor(max_block_bytes / 8)` values (at least
//!   one); the final block of a stream may be shorter.
//! - VariableLength: a value is appended only while the accumulated payload
//!   (including the value) stays within `max_block_bytes`; a single value
//!   larger than the whole budget still forms its own oversized block (the
//!   limit controls chunking cadence, it is not a rejection threshold).
//! - Empty input produces no blocks, never a zero-length block.

mod builder;
mod decoder;
mod encoder;

use bytes::Bytes;

pub use builder::BlockBuilder;
pub use encoder::BlockEncoder;

use crate::error::Result;
use crate::types::{Value, ValueType};

/// A size-bounded, ordered run of serialized values for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Type of every value in this block
    value_type: ValueType,

    /// Number of values in the payload
    value_count: u32,

    /// Packed value payload (layout per `value_type`)
    data: Bytes,
}

impl Block {
    /// Assemble a block from already-encoded parts.
    ///
    /// Callers are responsible for `data` actually containing `value_count`
    /// values of `value_type`; `decode` verifies the layout and reports
    /// `CorruptBlock` on any inconsistency.
    pub fn new(value_type: ValueType, value_count: u32, data: Bytes) -> Self {
        Self {
            value_type,
            value_count,
            data,
        }
    }

    /// The type of every value in this block
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Number of values in this block
    pub fn value_count(&self) -> u32 {
        self.value_count
    }

    /// Serialized payload size in bytes
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// The raw packed payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decode the payload back into the original value sequence.
    ///
    /// Fails with `CorruptBlock` if the byte layout is inconsistent with the
    /// declared type (length prefix overrunning the buffer, trailing bytes,
    /// value count mismatch).
    pub fn decode(&self) -> Result<Vec<Value>> {
        decoder::decode(self)
    }
}
