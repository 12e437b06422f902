//! Textual disassembly of a chunk.
//!
//! The disassembler returns structured records ([`Trace`], [`TraceLine`]);
//! their `Display` impls produce the classic trace text:
//!
//! ```text
//! == test chunk ==
//! 0000   89 OP_CONSTANT         0 '1.2'
//! 0002  101 OP_RETURN
//! ```

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    bytecode::{
        chunk::Chunk,
        instruction::{decode, Instruction},
        opcode::OpCode,
    },
    value::Value,
    CoreError, CoreResult,
};

/// Source line column of a trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LineMark {
    /// First instruction, or line differs from the previous byte.
    Line(u32),
    /// Same line as the previous byte.
    Continued,
}

/// Decoded body of a trace line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TraceOp {
    /// Opcode without operand.
    Simple(OpCode),
    /// Constant load with its resolved value.
    Constant {
        /// `OP_CONSTANT` or `OP_CONSTANT_LONG`.
        opcode: OpCode,
        /// Pool index read from the operand.
        index: usize,
        /// Value stored at `index`.
        value: Value,
    },
    /// Unrecognised byte at an instruction boundary.
    Unknown(u8),
}

/// One rendered instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLine {
    /// Byte offset of the opcode.
    pub offset: usize,
    /// Line column.
    pub line: LineMark,
    /// Decoded instruction.
    pub op: TraceOp,
}

/// Whole-chunk disassembly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trace {
    /// Label printed in the header.
    pub name: String,
    /// One entry per instruction, in stream order.
    pub lines: Vec<TraceLine>,
}

/// Disassemble every instruction of `chunk`, starting at offset 0.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> CoreResult<Trace> {
    let mut lines = Vec::new();
    let mut offset = 0;
    while offset < chunk.len() {
        let (line, next) = disassemble_instruction(chunk, offset)?;
        lines.push(line);
        offset = next;
    }
    log::debug!("disassembled `{name}`: {} instruction(s), {} byte(s)", lines.len(), chunk.len());
    Ok(Trace { name: name.to_owned(), lines })
}

/// Decode the instruction at `offset` and return it with the next offset.
///
/// Unknown opcodes are rendered inline and skipped one byte at a time.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> CoreResult<(TraceLine, usize)> {
    let lines = chunk.lines();
    let current = *lines
        .get(offset)
        .ok_or(CoreError::OutOfBounds { offset, needed: 1, len: chunk.len() })?;
    let line = if offset > 0 && lines[offset - 1] == current {
        LineMark::Continued
    } else {
        LineMark::Line(current)
    };

    let (op, next) = match decode(chunk.code(), offset) {
        Ok(Instruction::Return) => (TraceOp::Simple(OpCode::Return), offset + 1),
        Ok(ins @ (Instruction::Constant { index } | Instruction::ConstantLong { index })) => {
            let value = *chunk.constants().get(index).ok_or(CoreError::DanglingConstant {
                offset,
                index,
                pool_len: chunk.constants().len(),
            })?;
            (TraceOp::Constant { opcode: ins.opcode(), index, value }, offset + ins.len())
        }
        Err(CoreError::UnknownOpcode { byte, .. }) => (TraceOp::Unknown(byte), offset + 1),
        Err(e) => return Err(e),
    };

    Ok((TraceLine { offset, line, op }, next))
}

impl fmt::Display for LineMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(n) => write!(f, "{n:4}"),
            Self::Continued => f.write_str("   |"),
        }
    }
}

impl fmt::Display for TraceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(op) => write!(f, "{op}"),
            Self::Constant { opcode, index, value } => {
                write!(f, "{:<16} {index:4} '{value}'", opcode.mnemonic())
            }
            Self::Unknown(byte) => write!(f, "Unknown opcode {byte}"),
        }
    }
}

impl fmt::Display for TraceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04} {} {}", self.offset, self.line, self.op)
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.name)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
