//! Error types for shardstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::types::ValueType;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for shardstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Block Codec Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt block: {0}")]
    CorruptBlock(String),

    #[error("Value type mismatch: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },

    // -------------------------------------------------------------------------
    // Addressing Errors
    // -------------------------------------------------------------------------
    #[error("Shard {shard_id} already exists")]
    DuplicateShard { shard_id: u64 },

    #[error("Shard {shard_id} not found")]
    ShardNotFound { shard_id: u64 },

    #[error("Column {column_id} not found in shard {shard_id}")]
    ColumnNotFound { shard_id: u64, column_id: u64 },

    // -------------------------------------------------------------------------
    // Import Errors
    // -------------------------------------------------------------------------
    #[error("Import failed: {0}")]
    Import(String),

    // -------------------------------------------------------------------------
    // Catalog Errors
    // -------------------------------------------------------------------------
    #[error("Catalog error: {0}")]
    Catalog(String),
}
