//! Configuration for shardstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Default maximum serialized size of a single block, in bytes
pub const DEFAULT_MAX_BLOCK_BYTES: usize = 64 * 1024;

/// Main configuration for a shardstore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files (column blocks, catalog journal)
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── catalog.journal  (shard catalog ledger)
    ///     └── columns/         (per-column block files)
    ///         └── shard_{id}/column_{id}/block_{seq}.blk
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Block Configuration
    // -------------------------------------------------------------------------
    /// Maximum serialized size of a single block (in bytes).
    ///
    /// This is the budget the embedder hands to its row sources; the importer
    /// chunks with whatever budget the source reports, so producer and
    /// storage stay consistent.
    pub max_block_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./shardstore_data"),
            max_block_bytes: DEFAULT_MAX_BLOCK_BYTES,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the maximum block size (in bytes)
    pub fn max_block_bytes(mut self, size: usize) -> Self {
        self.config.max_block_bytes = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
