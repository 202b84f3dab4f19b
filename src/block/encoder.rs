//! Block Encoder
//!
//! Lazy encoding of a value stream into a block sequence. Blocks are
//! produced one at a time as the caller advances, so an arbitrarily long
//! stream never materializes more than one block of payload.

use crate::error::Result;
use crate::types::{Value, ValueType};

use super::{Block, BlockBuilder};

/// Iterator adapter: value stream in, size-bounded blocks out
pub struct BlockEncoder<I> {
    values: I,
    /// `None` once the stream is exhausted or a push failed
    builder: Option<BlockBuilder>,
}

impl<I> BlockEncoder<I>
where
    I: Iterator<Item = Value>,
{
    /// Encode `values` of the given type into blocks of at most
    /// `max_block_bytes` of payload each
    pub fn new(values: I, value_type: ValueType, max_block_bytes: usize) -> Self {
        Self {
            values,
            builder: Some(BlockBuilder::new(value_type, max_block_bytes)),
        }
    }
}

impl<I> Iterator for BlockEncoder<I>
where
    I: Iterator<Item = Value>,
{
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.values.next() {
                Some(value) => {
                    let builder = self.builder.as_mut()?;
                    match builder.push(value) {
                        Ok(Some(sealed)) => return Some(Ok(sealed)),
                        Ok(None) => {}
                        Err(e) => {
                            self.builder = None;
                            return Some(Err(e));
                        }
                    }
                }
                None => return self.builder.take()?.finish().map(Ok),
            }
        }
    }
}
