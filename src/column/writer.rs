//! Column Writer
//!
//! Writes one column's block sequence to numbered block files. Each block
//! becomes its own checksummed file, synced before the writer moves on, so a
//! catalog commit never points at data that is not on disk.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::block::Block;
use crate::error::Result;

use super::{ColumnLocator, ColumnStore, MAGIC, VERSION};

/// Appends blocks for a single `(shard, column)` pair
pub struct ColumnWriter {
    /// Directory receiving the block files
    dir: PathBuf,

    /// Same directory, relative to the store root (recorded in the locator)
    rel_path: String,

    /// Sequence number of the next block file
    next_seq: u32,
}

impl ColumnWriter {
    pub(super) fn new(dir: PathBuf, rel_path: String) -> Self {
        Self {
            dir,
            rel_path,
            next_seq: 0,
        }
    }

    /// Write the next block in the sequence to its own file
    pub fn append(&mut self, block: &Block) -> Result<()> {
        let path = self.dir.join(ColumnStore::block_file_name(self.next_seq));
        write_block_file(&path, block)?;
        self.next_seq += 1;
        Ok(())
    }

    /// Finish the column and return the locator the catalog records
    pub fn finish(self) -> Result<ColumnLocator> {
        Ok(ColumnLocator {
            path: self.rel_path,
            block_count: self.next_seq as u64,
        })
    }

    /// Number of blocks written so far
    pub fn block_count(&self) -> u32 {
        self.next_seq
    }
}

/// Write a single block file: header, payload, CRC footer, then fsync
fn write_block_file(path: &Path, block: &Block) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    let mut writer = BufWriter::new(file);

    // Header: magic + version + type tag + value count + payload length
    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&[block.value_type().tag()])?;
    writer.write_all(&block.value_count().to_le_bytes())?;
    writer.write_all(&(block.byte_size() as u32).to_le_bytes())?;

    // Payload + CRC footer
    writer.write_all(block.data())?;
    writer.write_all(&crc32fast::hash(block.data()).to_le_bytes())?;

    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    Ok(())
}
