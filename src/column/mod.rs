//! Column Store Module
//!
//! Maps `(shard, column)` to an ordered sequence of block files on durable
//! storage. Pure file, path, and sequence management; value encoding is the
//! block codec's job.
//!
//! ## File Format (one file per block)
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (15 bytes)                                            │
//! │   Magic: "SBLK" (4) | Version: u16 (2) | Type: u8 (1)        │
//! │   ValueCount: u32 (4) | PayloadLen: u32 (4)                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Payload (variable): packed values, layout per type tag       │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                             │
//! │   PayloadCRC32: u32 (4)                                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Layout
//! ```text
//! {root}/shard_{shardId}/column_{columnId}/block_{seq}.blk
//! ```
//! Block order is carried by the sequence number in the filename, never by
//! filesystem iteration order. A column directory with no block files is a
//! valid empty column.

mod reader;
mod writer;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::Result;
use crate::types::{ColumnId, ShardId};

pub use reader::BlockIterator;
pub use writer::ColumnWriter;

// =============================================================================
// Shared Constants (used by writer and reader)
// =============================================================================

/// Magic bytes identifying a shardstore block file
pub(crate) const MAGIC: &[u8; 4] = b"SBLK";

/// Current block file format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + Type (1) + ValueCount (4) + PayloadLen (4)
pub(crate) const HEADER_SIZE: u64 = 15;

/// Footer size: PayloadCRC32 (4)
pub(crate) const FOOTER_SIZE: u64 = 4;

// =============================================================================
// Column Locator
// =============================================================================

/// Opaque handle identifying where a column's blocks live, recorded in the
/// shard catalog at import time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLocator {
    /// Directory of the column's block files, relative to the store root
    pub path: String,

    /// Number of block files written for the column
    pub block_count: u64,
}

// =============================================================================
// Column Store
// =============================================================================

/// File and path management for per-column block sequences
pub struct ColumnStore {
    /// Root directory for all column data
    root: PathBuf,
}

impl ColumnStore {
    /// Open or create a column store rooted at the given directory
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start writing a column for the given shard.
    ///
    /// Creates the column directory immediately, so an import with zero rows
    /// still leaves a readable (empty) column behind. A `(shard, column)`
    /// pair is written exactly once, at import time.
    pub fn writer(&self, shard_id: ShardId, column_id: ColumnId) -> Result<ColumnWriter> {
        let dir = self.column_dir(shard_id, column_id);
        fs::create_dir_all(&dir)?;
        Ok(ColumnWriter::new(
            dir,
            Self::column_rel_path(shard_id, column_id),
        ))
    }

    /// Write a full block sequence for a column and return its locator
    pub fn write_column<I>(
        &self,
        shard_id: ShardId,
        column_id: ColumnId,
        blocks: I,
    ) -> Result<ColumnLocator>
    where
        I: IntoIterator<Item = Result<Block>>,
    {
        let mut writer = self.writer(shard_id, column_id)?;
        for block in blocks {
            writer.append(&block?)?;
        }
        writer.finish()
    }

    /// Read a column's blocks back, lazily and in original order.
    ///
    /// Block files are discovered by parsing the sequence number out of each
    /// filename and sorting numerically. One file is opened, validated, and
    /// decoded per iterator step, so working memory stays at one block. A
    /// column with zero blocks yields an empty iterator without error.
    pub fn read_column(&self, shard_id: ShardId, column_id: ColumnId) -> Result<BlockIterator> {
        let dir = self.column_dir(shard_id, column_id);
        if !dir.is_dir() {
            return Ok(BlockIterator::empty());
        }

        let mut files: Vec<(u32, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                if let Some(seq) = Self::parse_block_seq(&path) {
                    files.push((seq, path));
                }
            }
        }
        files.sort_by_key(|(seq, _)| *seq);

        Ok(BlockIterator::new(
            files.into_iter().map(|(_, path)| path).collect(),
        ))
    }

    /// Whether a column directory exists for `(shard, column)`
    pub fn exists(&self, shard_id: ShardId, column_id: ColumnId) -> bool {
        self.column_dir(shard_id, column_id).is_dir()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Absolute directory for a column's block files
    fn column_dir(&self, shard_id: ShardId, column_id: ColumnId) -> PathBuf {
        self.root.join(Self::column_rel_path(shard_id, column_id))
    }

    /// Directory for a column's block files, relative to the store root
    fn column_rel_path(shard_id: ShardId, column_id: ColumnId) -> String {
        format!("shard_{:06}/column_{:06}", shard_id, column_id)
    }

    /// Filename for a block with the given sequence number
    pub(crate) fn block_file_name(seq: u32) -> String {
        format!("block_{:06}.blk", seq)
    }

    /// Parse a block sequence number from a filename
    /// "block_000042.blk" → Some(42)
    fn parse_block_seq(path: &Path) -> Option<u32> {
        if path.extension()?.to_str()? != "blk" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        let seq_str = name.strip_prefix("block_")?;
        seq_str.parse().ok()
    }
}
