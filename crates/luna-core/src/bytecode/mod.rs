//! Bytecode primitives: chunk, opcodes, bounded decoding, disassembly and
//! structural validation.

/// Chunk representation (code bytes, line table, constants).
pub mod chunk;
pub mod disasm;
pub mod helpers;
pub mod instruction;
pub mod opcode;

pub use chunk::{Chunk, LineRanges};
pub use disasm::{disassemble_chunk, disassemble_instruction, LineMark, Trace, TraceLine, TraceOp};
pub use helpers::validate_chunk;
pub use instruction::{decode, Instruction, Instructions};
pub use opcode::{OpCode, MAX_LONG_INDEX, MAX_SHORT_INDEX};
