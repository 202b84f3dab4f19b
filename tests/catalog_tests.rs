//! Tests for the journal catalog
//!
//! These tests verify:
//! - Shard existence before/after commit
//! - Atomic all-columns-together visibility
//! - Duplicate shard rejection
//! - Persistence across reopen (journal replay)
//! - Torn-tail recovery (truncate, keep committed records)

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use shardstore::{ColumnLocator, JournalCatalog, ShardCatalog, StoreError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_catalog() -> (TempDir, PathBuf, JournalCatalog) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.journal");
    let catalog = JournalCatalog::open(&path).unwrap();
    (temp_dir, path, catalog)
}

fn locator(shard_id: u64, column_id: u64, block_count: u64) -> ColumnLocator {
    ColumnLocator {
        path: format!("shard_{:06}/column_{:06}", shard_id, column_id),
        block_count,
    }
}

/// Commit a shard with the given columns, one staged entry per column
fn commit_shard(catalog: &JournalCatalog, shard_id: u64, column_ids: &[u64]) {
    let mut tx = catalog.begin();
    for &column_id in column_ids {
        tx.stage(column_id, locator(shard_id, column_id, 3));
    }
    catalog.commit(shard_id, tx).unwrap();
}

// =============================================================================
// Commit Tests
// =============================================================================

#[test]
fn test_shard_exists_false_before_commit() {
    let (_temp, _path, catalog) = setup_catalog();

    assert!(!catalog.shard_exists(123).unwrap());
    assert!(matches!(
        catalog.columns_of(123),
        Err(StoreError::ShardNotFound { shard_id: 123 })
    ));
}

#[test]
fn test_commit_makes_all_columns_visible_together() {
    let (_temp, _path, catalog) = setup_catalog();

    commit_shard(&catalog, 123, &[7, 11]);

    assert!(catalog.shard_exists(123).unwrap());
    let columns = catalog.columns_of(123).unwrap();
    assert_eq!(columns.len(), 2);
    assert!(columns.contains(&7) && columns.contains(&11));
}

#[test]
fn test_locator_round_trip() {
    let (_temp, _path, catalog) = setup_catalog();

    commit_shard(&catalog, 5, &[2]);

    assert_eq!(catalog.locator(5, 2).unwrap(), locator(5, 2, 3));
    assert!(matches!(
        catalog.locator(5, 99),
        Err(StoreError::ColumnNotFound {
            shard_id: 5,
            column_id: 99,
        })
    ));
    assert!(matches!(
        catalog.locator(6, 2),
        Err(StoreError::ShardNotFound { shard_id: 6 })
    ));
}

#[test]
fn test_duplicate_commit_rejected() {
    let (_temp, _path, catalog) = setup_catalog();

    commit_shard(&catalog, 42, &[1]);

    let mut tx = catalog.begin();
    tx.stage(1, locator(42, 1, 0));
    let result = catalog.commit(42, tx);

    assert!(matches!(
        result,
        Err(StoreError::DuplicateShard { shard_id: 42 })
    ));

    // Rejection changed nothing
    assert_eq!(catalog.locator(42, 1).unwrap(), locator(42, 1, 3));
}

#[test]
fn test_commits_for_distinct_shards_are_independent() {
    let (_temp, _path, catalog) = setup_catalog();

    commit_shard(&catalog, 1, &[10]);
    commit_shard(&catalog, 2, &[10, 20]);
    commit_shard(&catalog, 3, &[30]);

    assert_eq!(catalog.shard_count(), 3);
    assert_eq!(catalog.columns_of(2).unwrap().len(), 2);
}

#[test]
fn test_zero_block_columns_commit() {
    let (_temp, _path, catalog) = setup_catalog();

    let mut tx = catalog.begin();
    tx.stage(13, locator(456, 13, 0));
    catalog.commit(456, tx).unwrap();

    assert!(catalog.shard_exists(456).unwrap());
    assert_eq!(catalog.locator(456, 13).unwrap().block_count, 0);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_persistence_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.journal");

    // Commit and close
    {
        let catalog = JournalCatalog::open(&path).unwrap();
        commit_shard(&catalog, 123, &[7, 11]);
        commit_shard(&catalog, 456, &[13]);
    }

    // Reopen and verify replay
    {
        let catalog = JournalCatalog::open(&path).unwrap();
        assert_eq!(catalog.shard_count(), 2);
        assert!(catalog.shard_exists(123).unwrap());
        assert!(catalog.shard_exists(456).unwrap());
        assert_eq!(catalog.locator(123, 11).unwrap(), locator(123, 11, 3));
    }
}

#[test]
fn test_reopen_continues_accepting_commits() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.journal");

    {
        let catalog = JournalCatalog::open(&path).unwrap();
        commit_shard(&catalog, 1, &[1]);
    }
    {
        let catalog = JournalCatalog::open(&path).unwrap();
        commit_shard(&catalog, 2, &[1]);
    }
    {
        let catalog = JournalCatalog::open(&path).unwrap();
        assert_eq!(catalog.shard_count(), 2);
    }
}

// =============================================================================
// Recovery Tests
// =============================================================================

/// Append raw bytes to the journal, simulating a torn commit
fn append_garbage(path: &Path, garbage: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(garbage).unwrap();
}

#[test]
fn test_torn_tail_shorter_than_frame_header_is_truncated() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.journal");

    {
        let catalog = JournalCatalog::open(&path).unwrap();
        commit_shard(&catalog, 123, &[7]);
    }
    let clean_len = std::fs::metadata(&path).unwrap().len();

    append_garbage(&path, &[0xDE, 0xAD, 0xBE]);

    let catalog = JournalCatalog::open(&path).unwrap();
    assert!(catalog.shard_exists(123).unwrap());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), clean_len);
}

#[test]
fn test_torn_frame_with_bad_crc_is_truncated() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.journal");

    {
        let catalog = JournalCatalog::open(&path).unwrap();
        commit_shard(&catalog, 123, &[7]);
    }

    // A full frame header followed by payload bytes that fail the CRC
    let mut garbage = Vec::new();
    garbage.extend_from_slice(&99u64.to_le_bytes()); // seq
    garbage.extend_from_slice(&0u32.to_le_bytes()); // wrong crc
    garbage.extend_from_slice(&4u32.to_le_bytes()); // len
    garbage.extend_from_slice(b"junk");
    append_garbage(&path, &garbage);

    let catalog = JournalCatalog::open(&path).unwrap();
    assert!(catalog.shard_exists(123).unwrap());
    assert!(!catalog.shard_exists(99).unwrap());
}

#[test]
fn test_commits_after_recovery_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.journal");

    {
        let catalog = JournalCatalog::open(&path).unwrap();
        commit_shard(&catalog, 1, &[1]);
    }
    append_garbage(&path, &[0xFF; 5]);

    // Recovery truncates the tail, then a new commit lands cleanly
    {
        let catalog = JournalCatalog::open(&path).unwrap();
        commit_shard(&catalog, 2, &[2]);
    }
    {
        let catalog = JournalCatalog::open(&path).unwrap();
        assert_eq!(catalog.shard_count(), 2);
    }
}
