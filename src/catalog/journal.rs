//! Journal Catalog
//!
//! Append-only file backend for the shard catalog. One commit is one framed
//! record holding every column entry of the shard, so commit atomicity falls
//! out of the framing: a torn or CRC-invalid tail frame is truncated at open
//! and the commit it belonged to never becomes visible.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Record 1                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ Seq (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ Seq (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//! Data is a bincode-serialized record `{shard_id, [(column_id, locator)]}`;
//! the CRC covers the data section.

use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::column::ColumnLocator;
use crate::error::{Result, StoreError};
use crate::types::{ColumnId, ShardId};

use super::{CatalogTx, ShardCatalog};

/// Frame header size: Seq (8) + CRC (4) + Len (4)
const FRAME_HEADER_SIZE: usize = 16;

/// One committed shard, as persisted in the journal
#[derive(Debug, Serialize, Deserialize)]
struct JournalRecord {
    shard_id: ShardId,
    columns: Vec<(ColumnId, ColumnLocator)>,
}

/// Mutable catalog state, guarded by one RwLock
struct CatalogState {
    /// Committed shards: shard id → column id → locator
    shards: HashMap<ShardId, HashMap<ColumnId, ColumnLocator>>,

    /// Append handle to the journal file
    journal: File,

    /// Byte offset of the journal's clean tail
    end_offset: u64,

    /// Sequence number for the next committed record
    next_seq: u64,
}

impl CatalogState {
    /// Append a frame and make it durable
    fn append_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.journal.write_all(frame)?;
        self.journal.sync_all()?;
        Ok(())
    }
}

/// Journal-file shard catalog
///
/// ## Concurrency:
/// - All state behind one RwLock: many concurrent existence/schema reads,
///   exclusive commits
/// - Duplicate detection happens under the write lock, before the append
pub struct JournalCatalog {
    state: RwLock<CatalogState>,
}

impl JournalCatalog {
    /// Open or create a catalog journal at the given path.
    ///
    /// Replays every valid record to rebuild the shard map. Replay stops at
    /// the first torn or CRC-invalid frame; the file is truncated there so
    /// later appends land on a clean tail.
    pub fn open(path: &Path) -> Result<Self> {
        let mut journal = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        let mut buf = Vec::new();
        journal.read_to_end(&mut buf)?;

        let mut shards: HashMap<ShardId, HashMap<ColumnId, ColumnLocator>> = HashMap::new();
        let mut pos = 0usize;
        let mut next_seq = 1u64;

        while buf.len() - pos >= FRAME_HEADER_SIZE {
            let seq = u64::from_le_bytes(buf[pos..pos + 8].try_into().unwrap());
            let crc = u32::from_le_bytes(buf[pos + 8..pos + 12].try_into().unwrap());
            let len =
                u32::from_le_bytes(buf[pos + 12..pos + 16].try_into().unwrap()) as usize;

            // Torn frame: the write behind it never committed
            if buf.len() - pos - FRAME_HEADER_SIZE < len {
                break;
            }

            let payload = &buf[pos + FRAME_HEADER_SIZE..pos + FRAME_HEADER_SIZE + len];
            if crc32fast::hash(payload) != crc {
                break;
            }

            // A CRC-valid record that does not decode is not a torn write
            let record: JournalRecord = bincode::deserialize(payload).map_err(|e| {
                StoreError::Catalog(format!(
                    "undecodable journal record at offset {}: {}",
                    pos, e
                ))
            })?;

            shards.insert(record.shard_id, record.columns.into_iter().collect());
            next_seq = seq + 1;
            pos += FRAME_HEADER_SIZE + len;
        }

        let end_offset = pos as u64;
        if pos < buf.len() {
            tracing::warn!(
                valid_bytes = pos,
                total_bytes = buf.len(),
                "truncating torn catalog journal tail"
            );
            journal.set_len(end_offset)?;
        }
        journal.seek(SeekFrom::Start(end_offset))?;

        if !shards.is_empty() {
            tracing::debug!(shards = shards.len(), "catalog journal replayed");
        }

        Ok(Self {
            state: RwLock::new(CatalogState {
                shards,
                journal,
                end_offset,
                next_seq,
            }),
        })
    }

    /// Number of committed shards
    pub fn shard_count(&self) -> usize {
        self.state.read().shards.len()
    }
}

impl ShardCatalog for JournalCatalog {
    fn commit(&self, shard_id: ShardId, tx: CatalogTx) -> Result<()> {
        let mut state = self.state.write();

        if state.shards.contains_key(&shard_id) {
            return Err(StoreError::DuplicateShard { shard_id });
        }

        let record = JournalRecord {
            shard_id,
            columns: tx.into_entries(),
        };
        let payload = bincode::serialize(&record)
            .map_err(|e| StoreError::Catalog(format!("journal record encoding failed: {}", e)))?;

        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.extend_from_slice(&state.next_seq.to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);

        if let Err(e) = state.append_frame(&frame) {
            // Roll the file back so later commits land on a clean tail
            let end_offset = state.end_offset;
            let _ = state.journal.set_len(end_offset);
            let _ = state.journal.seek(SeekFrom::Start(end_offset));
            return Err(e);
        }

        state.end_offset += frame.len() as u64;
        state.next_seq += 1;
        state
            .shards
            .insert(shard_id, record.columns.into_iter().collect());

        Ok(())
    }

    fn shard_exists(&self, shard_id: ShardId) -> Result<bool> {
        Ok(self.state.read().shards.contains_key(&shard_id))
    }

    fn columns_of(&self, shard_id: ShardId) -> Result<HashSet<ColumnId>> {
        let state = self.state.read();
        let columns = state
            .shards
            .get(&shard_id)
            .ok_or(StoreError::ShardNotFound { shard_id })?;
        Ok(columns.keys().copied().collect())
    }

    fn locator(&self, shard_id: ShardId, column_id: ColumnId) -> Result<ColumnLocator> {
        let state = self.state.read();
        let columns = state
            .shards
            .get(&shard_id)
            .ok_or(StoreError::ShardNotFound { shard_id })?;
        columns
            .get(&column_id)
            .cloned()
            .ok_or(StoreError::ColumnNotFound {
                shard_id,
                column_id,
            })
    }
}
