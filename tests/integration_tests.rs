//! Integration tests for shardstore
//!
//! End-to-end flows across the manager, codec, column store, and catalog:
//! multi-shard imports, restart rediscovery, and parallel imports of
//! distinct shard ids.

use shardstore::{Config, MemorySource, StorageManager, Value, ValueType};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// =============================================================================
// Helper Functions
// =============================================================================

/// Route crate logs to the test output (RUST_LOG=debug cargo test)
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn int(v: i64) -> Value {
    Value::Int64(v)
}

fn bytes(s: &str) -> Value {
    Value::Bytes(s.as_bytes().to_vec())
}

fn read_values(manager: &StorageManager, shard_id: u64, column_id: u64) -> Vec<Value> {
    manager
        .get_blocks(shard_id, column_id)
        .unwrap()
        .flat_map(|b| b.unwrap().decode().unwrap())
        .collect()
}

/// Source over `n` generated (text, int) rows
fn generated_source(n: i64, max_block_bytes: usize) -> MemorySource {
    let rows = (0..n)
        .map(|i| vec![bytes(&format!("value-{:04}", i)), int(i * 10)])
        .collect();
    MemorySource::new(
        vec![ValueType::VariableLength, ValueType::FixedWidth],
        max_block_bytes,
        rows,
    )
}

// =============================================================================
// End-to-End Tests
// =============================================================================

#[test]
fn test_multi_shard_lifecycle_with_restart() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .max_block_bytes(128)
        .build();

    // Import several shards, then close. Sources chunk with the configured
    // block budget, as the embedding layer would.
    {
        let manager = StorageManager::open(config.clone()).unwrap();
        for shard_id in 1..=5 {
            let mut source = generated_source(50, manager.config().max_block_bytes);
            manager
                .import_shard(shard_id, &[100, 200], &mut source)
                .unwrap();
        }
    }

    // Reopen: every shard is rediscovered and every column reads back intact
    {
        let manager = StorageManager::open(config).unwrap();
        for shard_id in 1..=5 {
            assert!(manager.shard_exists(shard_id).unwrap());

            let texts = read_values(&manager, shard_id, 100);
            let ints = read_values(&manager, shard_id, 200);
            assert_eq!(texts.len(), 50);
            assert_eq!(ints.len(), 50);
            assert_eq!(texts[7], bytes("value-0007"));
            assert_eq!(ints[7], int(70));
        }
        assert!(!manager.shard_exists(6).unwrap());
    }
}

#[test]
fn test_large_column_stays_block_bounded() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let manager = StorageManager::open_path(temp_dir.path()).unwrap();

    let mut source = generated_source(1000, 256);
    manager.import_shard(42, &[1, 2], &mut source).unwrap();

    // 256-byte budget over 8-byte integers: 32 values per block
    let blocks = manager.get_blocks(42, 2).unwrap();
    assert_eq!(blocks.remaining(), 32); // ceil(1000 / 32)

    let mut total = 0u32;
    for block in manager.get_blocks(42, 2).unwrap() {
        let block = block.unwrap();
        assert!(block.value_count() <= 32);
        total += block.value_count();
    }
    assert_eq!(total, 1000);
}

#[test]
fn test_parallel_imports_of_distinct_shards() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let manager = StorageManager::open_path(temp_dir.path()).unwrap();

    std::thread::scope(|scope| {
        for shard_id in 10..14 {
            let manager = &manager;
            scope.spawn(move || {
                let mut source = generated_source(100, 64);
                manager
                    .import_shard(shard_id, &[1, 2], &mut source)
                    .unwrap();
            });
        }
    });

    for shard_id in 10..14 {
        assert!(manager.shard_exists(shard_id).unwrap());
        assert_eq!(read_values(&manager, shard_id, 1).len(), 100);
        assert_eq!(read_values(&manager, shard_id, 2).len(), 100);
    }
}

#[test]
fn test_reads_are_concurrent_with_unrelated_imports() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let manager = StorageManager::open_path(temp_dir.path()).unwrap();

    let mut source = generated_source(200, 64);
    manager.import_shard(1, &[1, 2], &mut source).unwrap();

    std::thread::scope(|scope| {
        let importer = &manager;
        scope.spawn(move || {
            let mut source = generated_source(200, 64);
            importer.import_shard(2, &[1, 2], &mut source).unwrap();
        });

        // Readers on shard 1 proceed while shard 2 imports; they never see
        // a partially committed shard 2 either way
        for _ in 0..10 {
            assert_eq!(read_values(&manager, 1, 1).len(), 200);
        }
    });

    assert!(manager.shard_exists(2).unwrap());
    assert_eq!(read_values(&manager, 2, 2).len(), 200);
}
