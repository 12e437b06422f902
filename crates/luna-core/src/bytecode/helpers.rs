//! Helper validations reused by tooling.

use crate::{bytecode::chunk::Chunk, CoreError, CoreResult};

/// Structural validation of a chunk.
///
/// Checks that the line table matches the code, that every instruction
/// decodes within bounds, that constant operands point into the pool and
/// that operand bytes carry the line of their opcode.
pub fn validate_chunk(chunk: &Chunk) -> CoreResult<()> {
    let (code, lines) = (chunk.code(), chunk.lines());
    if code.len() != lines.len() {
        return Err(CoreError::LineMismatch { code: code.len(), lines: lines.len() });
    }

    let pool_len = chunk.constants().len();
    for item in chunk.instructions() {
        let (offset, ins) = item?;

        if let Some(index) = ins.constant_index() {
            if index >= pool_len {
                return Err(CoreError::DanglingConstant { offset, index, pool_len });
            }
        }

        let expected = lines[offset];
        for operand in offset + 1..offset + ins.len() {
            if lines[operand] != expected {
                return Err(CoreError::SplitLine { offset: operand, expected, found: lines[operand] });
            }
        }
    }

    Ok(())
}
