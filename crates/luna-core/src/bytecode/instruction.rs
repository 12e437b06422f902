//! Bounded instruction decoding.
//!
//! Every reader of a chunk (disassembler, validator, execution engine) walks
//! the stream with the same length table, found in [`OpCode::instruction_len`].

use crate::{bytecode::opcode::OpCode, CoreError, CoreResult};

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `OP_RETURN`.
    Return,
    /// `OP_CONSTANT idx` (one-byte index).
    Constant {
        /// Pool index.
        index: usize,
    },
    /// `OP_CONSTANT_LONG idx` (three-byte little-endian index).
    ConstantLong {
        /// Pool index.
        index: usize,
    },
}

impl Instruction {
    /// The opcode this instruction was decoded from.
    pub const fn opcode(&self) -> OpCode {
        match self {
            Self::Return => OpCode::Return,
            Self::Constant { .. } => OpCode::Constant,
            Self::ConstantLong { .. } => OpCode::ConstantLong,
        }
    }

    /// Encoded length in bytes.
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize { self.opcode().instruction_len() }

    /// Constant pool index carried by the operand, if any.
    pub const fn constant_index(&self) -> Option<usize> {
        match *self {
            Self::Return => None,
            Self::Constant { index } | Self::ConstantLong { index } => Some(index),
        }
    }
}

/// Decode the instruction starting at `offset`.
///
/// Never reads past the end of `code`: a truncated operand yields
/// [`CoreError::OutOfBounds`], an unrecognised byte [`CoreError::UnknownOpcode`].
pub fn decode(code: &[u8], offset: usize) -> CoreResult<Instruction> {
    let byte = *code.get(offset).ok_or(CoreError::OutOfBounds { offset, needed: 1, len: code.len() })?;
    let op = OpCode::try_from(byte).map_err(|byte| CoreError::UnknownOpcode { offset, byte })?;

    let start = offset + 1;
    let width = op.operand_width();
    let operand = code
        .get(start..start + width)
        .ok_or(CoreError::OutOfBounds { offset: start, needed: width, len: code.len() })?;

    Ok(match op {
        OpCode::Return => Instruction::Return,
        OpCode::Constant => Instruction::Constant { index: usize::from(operand[0]) },
        OpCode::ConstantLong => {
            let index = u32::from_le_bytes([operand[0], operand[1], operand[2], 0]);
            Instruction::ConstantLong { index: index as usize }
        }
    })
}

/// Iterator returned by [`Chunk::instructions`](crate::Chunk::instructions).
///
/// Yields `(offset, instruction)`; stops after the first error.
pub struct Instructions<'a> {
    code: &'a [u8],
    offset: usize,
}

impl<'a> Instructions<'a> {
    pub(crate) const fn new(code: &'a [u8]) -> Self { Self { code, offset: 0 } }
}

impl Iterator for Instructions<'_> {
    type Item = CoreResult<(usize, Instruction)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.code.len() {
            return None;
        }
        let at = self.offset;
        match decode(self.code, at) {
            Ok(ins) => {
                self.offset += ins.len();
                Some(Ok((at, ins)))
            }
            Err(e) => {
                self.offset = self.code.len();
                Some(Err(e))
            }
        }
    }
}
