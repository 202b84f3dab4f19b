//! Block Decoder
//!
//! Reconstructs the exact original value sequence from a block payload,
//! dispatching on the block's type tag. Every slice is bounds-checked before
//! it is taken; any layout inconsistency surfaces as `CorruptBlock`.

use crate::error::{Result, StoreError};
use crate::types::{Value, ValueType, FIXED_WIDTH_BYTES, LENGTH_PREFIX_BYTES};

use super::Block;

/// Decode a block's payload into values
pub(super) fn decode(block: &Block) -> Result<Vec<Value>> {
    match block.value_type() {
        ValueType::FixedWidth => decode_fixed_width(block),
        ValueType::VariableLength => decode_variable_length(block),
    }
}

/// Decode 8-byte little-endian integers
fn decode_fixed_width(block: &Block) -> Result<Vec<Value>> {
    let data = block.data();
    let expected = block.value_count() as usize * FIXED_WIDTH_BYTES;

    if data.len() != expected {
        return Err(StoreError::CorruptBlock(format!(
            "fixed-width payload is {} bytes, expected {} for {} values",
            data.len(),
            expected,
            block.value_count()
        )));
    }

    let values = data
        .chunks_exact(FIXED_WIDTH_BYTES)
        .map(|chunk| {
            let mut buf = [0u8; FIXED_WIDTH_BYTES];
            buf.copy_from_slice(chunk);
            Value::Int64(i64::from_le_bytes(buf))
        })
        .collect();

    Ok(values)
}

/// Decode length-prefixed byte strings
fn decode_variable_length(block: &Block) -> Result<Vec<Value>> {
    let data = block.data();
    let mut values = Vec::with_capacity(block.value_count() as usize);
    let mut pos = 0;

    while pos < data.len() {
        if pos + LENGTH_PREFIX_BYTES > data.len() {
            return Err(StoreError::CorruptBlock(format!(
                "truncated length prefix at offset {}",
                pos
            )));
        }
        let len = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            as usize;
        pos += LENGTH_PREFIX_BYTES;

        if pos + len > data.len() {
            return Err(StoreError::CorruptBlock(format!(
                "length prefix {} overruns payload at offset {}",
                len, pos
            )));
        }
        values.push(Value::Bytes(data[pos..pos + len].to_vec()));
        pos += len;
    }

    if values.len() != block.value_count() as usize {
        return Err(StoreError::CorruptBlock(format!(
            "payload holds {} values, header declares {}",
            values.len(),
            block.value_count()
        )));
    }

    Ok(values)
}
