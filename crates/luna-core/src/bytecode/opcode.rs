//! Instruction set and its length table.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest constant index addressable by [`OpCode::Constant`].
pub const MAX_SHORT_INDEX: usize = u8::MAX as usize;

/// Largest constant index addressable by [`OpCode::ConstantLong`] (24 bits).
pub const MAX_LONG_INDEX: usize = 0x00FF_FFFF;

/// Opcodes understood by the decoder. The discriminant is the encoded byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum OpCode {
    /// Exit the current chunk. No operand.
    Return = 0,
    /// Load a constant; one-byte pool index.
    Constant = 1,
    /// Load a constant; three-byte little-endian pool index.
    ConstantLong = 2,
}

impl OpCode {
    /// Name used in traces.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Return => "OP_RETURN",
            Self::Constant => "OP_CONSTANT",
            Self::ConstantLong => "OP_CONSTANT_LONG",
        }
    }

    /// Operand bytes following the opcode.
    pub const fn operand_width(self) -> usize {
        match self {
            Self::Return => 0,
            Self::Constant => 1,
            Self::ConstantLong => 3,
        }
    }

    /// Full instruction length, opcode included.
    pub const fn instruction_len(self) -> usize { 1 + self.operand_width() }

    /// Decode a raw byte.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Return),
            1 => Some(Self::Constant),
            2 => Some(Self::ConstantLong),
            _ => None,
        }
    }
}

/// Fails with the unrecognised byte.
impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> { Self::from_byte(byte).ok_or(byte) }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op as Self }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.mnemonic()) }
}
