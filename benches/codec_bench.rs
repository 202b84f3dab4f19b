//! Benchmarks for the shardstore block codec

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shardstore::{Block, BlockEncoder, Value, ValueType};

fn int_values(n: i64) -> Vec<Value> {
    (0..n).map(Value::Int64).collect()
}

fn text_values(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| Value::Bytes(format!("row-{:08}-payload", i).into_bytes()))
        .collect()
}

fn encode_blocks(values: Vec<Value>, value_type: ValueType, budget: usize) -> Vec<Block> {
    BlockEncoder::new(values.into_iter(), value_type, budget)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn codec_benchmarks(c: &mut Criterion) {
    c.bench_function("encode_fixed_width_10k", |b| {
        let values = int_values(10_000);
        b.iter(|| encode_blocks(black_box(values.clone()), ValueType::FixedWidth, 64 * 1024));
    });

    c.bench_function("encode_variable_length_10k", |b| {
        let values = text_values(10_000);
        b.iter(|| {
            encode_blocks(
                black_box(values.clone()),
                ValueType::VariableLength,
                64 * 1024,
            )
        });
    });

    c.bench_function("decode_fixed_width_10k", |b| {
        let blocks = encode_blocks(int_values(10_000), ValueType::FixedWidth, 64 * 1024);
        b.iter(|| {
            for block in black_box(&blocks) {
                block.decode().unwrap();
            }
        });
    });
}

criterion_group!(benches, codec_benchmarks);
criterion_main!(benches);
