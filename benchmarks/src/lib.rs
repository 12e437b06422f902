//! Fixtures partagées par les benches.

use luna_core::{Chunk, OpCode, Value};

/// Chunk of `n` constant loads followed by a return, lines advancing every
/// four instructions.
pub fn constant_heavy_chunk(n: usize) -> Chunk {
    let mut chunk = Chunk::new();
    for i in 0..n {
        let line = u32::try_from(i / 4).unwrap_or(u32::MAX);
        // Past 2^24 constants the pool is full; stop there.
        if chunk.write_constant(Value::from(i as f64), line).is_err() {
            break;
        }
    }
    chunk.write_op(OpCode::Return, u32::MAX);
    chunk
}
