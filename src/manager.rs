//! Storage Manager
//!
//! The orchestrator: fans an import's tuple stream out into per-column block
//! writes, then commits the shard's catalog entries in one transaction; read
//! paths delegate to the catalog and the column store.
//!
//! ## Responsibilities
//! - Own the import transaction boundary (all-or-nothing shard visibility)
//! - Guard against concurrent imports of the same shard id
//! - Serve lazy block sequences for committed columns
//!
//! ## Concurrency Model
//! - Imports of distinct shard ids run in parallel: block files land under
//!   disjoint directories and catalog commits are independent
//! - Imports of the same shard id are rejected: the in-flight set here is
//!   the primary guard, the catalog's uniqueness check the last line of
//!   defense
//! - `shard_exists`/`get_blocks` take `&self` and are safe under unbounded
//!   concurrency; they never observe a partially committed shard

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use crate::block::BlockBuilder;
use crate::catalog::{JournalCatalog, ShardCatalog};
use crate::column::{BlockIterator, ColumnStore, ColumnWriter};
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::source::RowSource;
use crate::types::{ColumnId, ShardId};

/// Shard-level columnar storage manager
pub struct StorageManager<C: ShardCatalog = JournalCatalog> {
    /// Manager configuration
    config: Config,

    /// Per-column block file storage
    columns: ColumnStore,

    /// Transactional shard ledger (sole authority on existence)
    catalog: C,

    /// Shard ids with an import currently in progress
    in_flight: Mutex<HashSet<ShardId>>,
}

impl StorageManager<JournalCatalog> {
    /// Open or create a manager with the given config.
    ///
    /// On startup:
    /// 1. Create the data directory layout
    /// 2. Replay the catalog journal (committed shards become visible again)
    /// 3. Ready to import and serve
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let catalog = JournalCatalog::open(&config.data_dir.join(Self::CATALOG_FILENAME))?;
        Self::with_catalog(config, catalog)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }
}

impl<C: ShardCatalog> StorageManager<C> {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const CATALOG_FILENAME: &'static str = "catalog.journal";
    const COLUMN_DIR: &'static str = "columns";

    /// Open a manager backed by a caller-provided catalog.
    ///
    /// The seam for swapping in any ACID-capable catalog backend.
    pub fn with_catalog(config: Config, catalog: C) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let columns = ColumnStore::open(&config.data_dir.join(Self::COLUMN_DIR))?;

        Ok(Self {
            config,
            columns,
            catalog,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    /// Whether a shard has been successfully imported
    pub fn shard_exists(&self, shard_id: ShardId) -> Result<bool> {
        self.catalog.shard_exists(shard_id)
    }

    /// Transactionally import one shard from a row source.
    ///
    /// Pulls rows from `source` (projected into `column_ids` order), chunks
    /// each column's values into blocks sized by the source's block byte
    /// budget, writes the block files, and commits every column's locator in
    /// a single catalog transaction.
    ///
    /// On any failure the shard stays absent: the catalog is the sole
    /// existence authority, and block files written before the failure are
    /// orphans for an out-of-scope sweep. A zero-row source is a valid
    /// import: each column ends up with zero blocks and the shard exists.
    pub fn import_shard(
        &self,
        shard_id: ShardId,
        column_ids: &[ColumnId],
        source: &mut impl RowSource,
    ) -> Result<()> {
        if self.catalog.shard_exists(shard_id)? {
            return Err(StoreError::DuplicateShard { shard_id });
        }
        let _guard = ImportGuard::acquire(&self.in_flight, shard_id)?;

        let schema = source.schema().to_vec();
        if schema.len() != column_ids.len() {
            return Err(StoreError::Import(format!(
                "source projects {} columns, import names {}",
                schema.len(),
                column_ids.len()
            )));
        }
        let max_block_bytes = source.max_block_bytes();

        tracing::debug!(
            shard_id,
            columns = column_ids.len(),
            max_block_bytes,
            "importing shard"
        );

        // Fan the row stream out into one builder/writer pair per column;
        // sealed blocks hit disk as they fill, so memory stays bounded by
        // one block per column.
        let mut columns: Vec<(BlockBuilder, ColumnWriter)> = Vec::with_capacity(column_ids.len());
        for (column_id, value_type) in column_ids.iter().zip(&schema) {
            columns.push((
                BlockBuilder::new(*value_type, max_block_bytes),
                self.columns.writer(shard_id, *column_id)?,
            ));
        }

        let mut row_count: u64 = 0;
        while let Some(row) = source.next_row()? {
            if row.len() != columns.len() {
                return Err(StoreError::Import(format!(
                    "row {} has {} values, expected {}",
                    row_count,
                    row.len(),
                    columns.len()
                )));
            }
            for ((builder, writer), value) in columns.iter_mut().zip(row) {
                if let Some(block) = builder.push(value)? {
                    writer.append(&block)?;
                }
            }
            row_count += 1;
        }

        // Seal trailing blocks and stage every column's locator
        let mut tx = self.catalog.begin();
        for ((builder, mut writer), column_id) in columns.into_iter().zip(column_ids) {
            if let Some(block) = builder.finish() {
                writer.append(&block)?;
            }
            tx.stage(*column_id, writer.finish()?);
        }

        // One atomic commit makes the shard observable; failure leaves it
        // absent with no partial state visible
        self.catalog.commit(shard_id, tx)?;

        tracing::info!(shard_id, rows = row_count, "shard import committed");
        Ok(())
    }

    /// The lazy block sequence for one committed column.
    ///
    /// Each call returns a fresh forward-only iterator starting at the first
    /// block. Fails with `ShardNotFound` for an unknown shard and
    /// `ColumnNotFound` for a column outside the shard's imported set.
    pub fn get_blocks(&self, shard_id: ShardId, column_id: ColumnId) -> Result<BlockIterator> {
        if !self.catalog.shard_exists(shard_id)? {
            return Err(StoreError::ShardNotFound { shard_id });
        }
        if !self.catalog.columns_of(shard_id)?.contains(&column_id) {
            return Err(StoreError::ColumnNotFound {
                shard_id,
                column_id,
            });
        }
        self.columns.read_column(shard_id, column_id)
    }

    /// The set of column ids imported with a shard
    pub fn columns_of(&self, shard_id: ShardId) -> Result<HashSet<ColumnId>> {
        self.catalog.columns_of(shard_id)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the catalog backend
    pub fn catalog(&self) -> &C {
        &self.catalog
    }
}

/// Removes a shard id from the in-flight set when an import finishes,
/// successfully or not
struct ImportGuard<'a> {
    in_flight: &'a Mutex<HashSet<ShardId>>,
    shard_id: ShardId,
}

impl<'a> ImportGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<ShardId>>, shard_id: ShardId) -> Result<Self> {
        if !in_flight.lock().insert(shard_id) {
            return Err(StoreError::DuplicateShard { shard_id });
        }
        Ok(Self {
            in_flight,
            shard_id,
        })
    }
}

impl Drop for ImportGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.shard_id);
    }
}
