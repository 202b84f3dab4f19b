//! Column Reader
//!
//! Lazy iteration over a column's block files. One file is read and
//! validated per step; the whole column is never materialized.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::block::Block;
use crate::error::{Result, StoreError};
use crate::types::ValueType;

use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Iterator over a column's blocks, in sequence order
pub struct BlockIterator {
    files: std::vec::IntoIter<PathBuf>,
}

impl BlockIterator {
    pub(super) fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files: files.into_iter(),
        }
    }

    /// An iterator over zero blocks (empty column)
    pub(super) fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of block files remaining
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl Iterator for BlockIterator {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        self.files.next().map(|path| read_block_file(&path))
    }
}

/// Read and validate a single block file
fn read_block_file(path: &Path) -> Result<Block> {
    let bytes = fs::read(path)?;

    if (bytes.len() as u64) < HEADER_SIZE + FOOTER_SIZE {
        return Err(StoreError::CorruptBlock(format!(
            "block file {} is {} bytes, smaller than header + footer",
            path.display(),
            bytes.len()
        )));
    }

    // Validate header
    if &bytes[0..4] != MAGIC {
        return Err(StoreError::CorruptBlock(format!(
            "invalid block magic in {}: expected SBLK, got {:?}",
            path.display(),
            &bytes[0..4]
        )));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(StoreError::CorruptBlock(format!(
            "unsupported block version {} in {}",
            version,
            path.display()
        )));
    }

    let value_type = ValueType::from_tag(bytes[6]).ok_or_else(|| {
        StoreError::CorruptBlock(format!(
            "unknown value type tag 0x{:02x} in {}",
            bytes[6],
            path.display()
        ))
    })?;

    let value_count = u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]);
    let payload_len = u32::from_le_bytes([bytes[11], bytes[12], bytes[13], bytes[14]]) as u64;

    if bytes.len() as u64 != HEADER_SIZE + payload_len + FOOTER_SIZE {
        return Err(StoreError::CorruptBlock(format!(
            "block file {} is {} bytes, header declares {}",
            path.display(),
            bytes.len(),
            HEADER_SIZE + payload_len + FOOTER_SIZE
        )));
    }

    let payload_start = HEADER_SIZE as usize;
    let payload_end = payload_start + payload_len as usize;
    let payload = &bytes[payload_start..payload_end];

    // Validate payload CRC
    let stored_crc = u32::from_le_bytes([
        bytes[payload_end],
        bytes[payload_end + 1],
        bytes[payload_end + 2],
        bytes[payload_end + 3],
    ]);
    let actual_crc = crc32fast::hash(payload);
    if stored_crc != actual_crc {
        return Err(StoreError::CorruptBlock(format!(
            "CRC mismatch in {}: stored {:08x}, computed {:08x}",
            path.display(),
            stored_crc,
            actual_crc
        )));
    }

    Ok(Block::new(
        value_type,
        value_count,
        Bytes::from(payload.to_vec()),
    ))
}
