//! Block Builder
//!
//! Accumulates typed values into the current block's payload and seals a
//! block whenever the next value would start a new one. The importer keeps
//! one builder per column, so working memory stays at one block per column
//! regardless of shard size.

use bytes::BytesMut;

use crate::error::{Result, StoreError};
use crate::types::{Value, ValueType, FIXED_WIDTH_BYTES};

use super::Block;

/// Incremental builder for one column's block sequence
pub struct BlockBuilder {
    /// Declared type; every pushed value must match
    value_type: ValueType,

    /// Maximum serialized payload size per block
    max_block_bytes: usize,

    /// Payload of the block currently being filled
    data: BytesMut,

    /// Number of values in the current payload
    value_count: u32,
}

impl BlockBuilder {
    /// Create a builder for a column of the given type
    pub fn new(value_type: ValueType, max_block_bytes: usize) -> Self {
        Self {
            value_type,
            max_block_bytes,
            data: BytesMut::new(),
            value_count: 0,
        }
    }

    /// Append a value to the current block.
    ///
    /// Returns `Ok(Some(block))` when the value did not fit and the previous
    /// block was sealed (the value itself went into the fresh one). Returns
    /// `TypeMismatch` if the value's type differs from the builder's.
    pub fn push(&mut self, value: Value) -> Result<Option<Block>> {
        if value.value_type() != self.value_type {
            return Err(StoreError::TypeMismatch {
                expected: self.value_type,
                actual: value.value_type(),
            });
        }

        let sealed = if self.is_full_for(&value) {
            Some(self.seal())
        } else {
            None
        };

        match value {
            Value::Int64(v) => {
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            Value::Bytes(b) => {
                self.data.extend_from_slice(&(b.len() as u32).to_le_bytes());
                self.data.extend_from_slice(&b);
            }
        }
        self.value_count += 1;

        Ok(sealed)
    }

    /// Seal whatever remains; `None` if no values were pushed since the last
    /// sealed block (empty input yields no blocks)
    pub fn finish(mut self) -> Option<Block> {
        if self.value_count == 0 {
            return None;
        }
        Some(self.seal())
    }

    /// Would appending `value` overflow the current block?
    ///
    /// An empty block always accepts one value, which keeps a fixed-width
    /// budget below one value width and an oversized variable-length value
    /// from wedging the stream.
    fn is_full_for(&self, value: &Value) -> bool {
        if self.value_count == 0 {
            return false;
        }
        match self.value_type {
            ValueType::FixedWidth => {
                let per_block = (self.max_block_bytes / FIXED_WIDTH_BYTES).max(1);
                self.value_count as usize >= per_block
            }
            ValueType::VariableLength => {
                self.data.len() + value.encoded_len() > self.max_block_bytes
            }
        }
    }

    /// Detach the current payload as a finished block and reset
    fn seal(&mut self) -> Block {
        let data = self.data.split().freeze();
        let value_count = self.value_count;
        self.value_count = 0;
        Block::new(self.value_type, value_count, data)
    }
}
