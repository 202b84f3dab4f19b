//! Row Sources
//!
//! The pull interface the importer consumes. A source yields tuples already
//! projected into the column order of the import, and carries the block byte
//! budget so the producer and the storage layer chunk consistently.

use crate::error::{Result, StoreError};
use crate::types::{Row, ValueType};

/// A pull-based stream of projected rows feeding one shard import
pub trait RowSource {
    /// Per-column value types, order-matching the import's column ids
    fn schema(&self) -> &[ValueType];

    /// Maximum serialized block size this source was configured with
    fn max_block_bytes(&self) -> usize;

    /// The next row, or `None` when the source is exhausted.
    ///
    /// An exhausted source stays exhausted; a zero-row source is valid.
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// In-memory row source, for embedders with materialized batches and tests
pub struct MemorySource {
    schema: Vec<ValueType>,
    max_block_bytes: usize,
    rows: std::vec::IntoIter<Row>,
}

impl MemorySource {
    /// Wrap a batch of rows. Every row must match `schema` in arity and
    /// types; violations surface from `next_row` during the import.
    pub fn new(schema: Vec<ValueType>, max_block_bytes: usize, rows: Vec<Row>) -> Self {
        Self {
            schema,
            max_block_bytes,
            rows: rows.into_iter(),
        }
    }
}

impl RowSource for MemorySource {
    fn schema(&self) -> &[ValueType] {
        &self.schema
    }

    fn max_block_bytes(&self) -> usize {
        self.max_block_bytes
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        let row = match self.rows.next() {
            Some(row) => row,
            None => return Ok(None),
        };

        if row.len() != self.schema.len() {
            return Err(StoreError::Import(format!(
                "row has {} values, schema has {} columns",
                row.len(),
                self.schema.len()
            )));
        }
        for (value, expected) in row.iter().zip(&self.schema) {
            if value.value_type() != *expected {
                return Err(StoreError::TypeMismatch {
                    expected: *expected,
                    actual: value.value_type(),
                });
            }
        }

        Ok(Some(row))
    }
}
