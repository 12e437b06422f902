//! Growable instruction stream with a parallel line table and its constants.

use core::ops::Range;

use crate::{
    bytecode::{
        instruction::Instructions,
        opcode::{OpCode, MAX_LONG_INDEX, MAX_SHORT_INDEX},
    },
    memory::{grow_capacity, reserve_to},
    value::{Value, ValuePool},
    CoreError, CoreResult,
};

/// Encoded instructions, one source line per byte, and the constant pool
/// their operands index into.
///
/// `code` and `lines` always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    lines: Vec<u32>,
    capacity: usize,
    constants: ValuePool,
}

impl Chunk {
    /// Create an empty chunk (no storage).
    pub const fn new() -> Self {
        Self { code: Vec::new(), lines: Vec::new(), capacity: 0, constants: ValuePool::new() }
    }

    /// Number of encoded bytes.
    pub fn len(&self) -> usize { self.code.len() }

    /// Whether no byte has been written.
    pub fn is_empty(&self) -> bool { self.code.is_empty() }

    /// Slots available in `code`/`lines` before the next growth.
    pub const fn capacity(&self) -> usize { self.capacity }

    /// Encoded bytes.
    pub fn code(&self) -> &[u8] { &self.code }

    /// Source line of every byte in [`Chunk::code`].
    pub fn lines(&self) -> &[u32] { &self.lines }

    /// The owned constant pool.
    pub const fn constants(&self) -> &ValuePool { &self.constants }

    /// Source line that produced the byte at `offset`.
    pub fn line_at(&self, offset: usize) -> Option<u32> { self.lines.get(offset).copied() }

    /// Append one byte and the line it came from.
    pub fn write(&mut self, byte: u8, line: u32) {
        if self.code.len() + 1 > self.capacity {
            let old = self.capacity;
            self.capacity = grow_capacity(old);
            reserve_to(&mut self.code, self.capacity);
            reserve_to(&mut self.lines, self.capacity);
            log::trace!("chunk grown: {old} -> {}", self.capacity);
        }
        self.code.push(byte);
        self.lines.push(line);
        debug_assert_eq!(self.code.len(), self.lines.len(), "code/lines out of sync");
    }

    /// Append an opcode byte.
    pub fn write_op(&mut self, op: OpCode, line: u32) { self.write(op.into(), line); }

    /// Append a constant and return its index.
    pub fn add_constant(&mut self, value: Value) -> usize { self.constants.push(value) }

    /// Add `value` and emit the instruction that loads it.
    ///
    /// Indices up to 255 use `OP_CONSTANT idx`; larger ones use
    /// `OP_CONSTANT_LONG` followed by the index on 3 little-endian bytes.
    /// All bytes are tagged with `line`.
    pub fn write_constant(&mut self, value: Value, line: u32) -> CoreResult<usize> {
        let operand = ConstantOperand::for_index(self.constants.len())?;
        let index = self.add_constant(value);
        match operand {
            ConstantOperand::Short(byte) => {
                self.write_op(OpCode::Constant, line);
                self.write(byte, line);
            },
            ConstantOperand::Long(bytes) => {
                self.write_op(OpCode::ConstantLong, line);
                for b in bytes {
                    self.write(b, line);
                }
            },
        }
        Ok(index)
    }

    /// Sequential decoder over the whole chunk.
    pub fn instructions(&self) -> Instructions<'_> { Instructions::new(&self.code) }

    /// Iterate over contiguous runs of the same line number.
    pub fn line_ranges(&self) -> LineRanges<'_> { LineRanges { lines: &self.lines, index: 0 } }

    /// Release code, lines and constants, and return to the empty state.
    pub fn reset(&mut self) {
        log::debug!("chunk reset ({} byte(s), {} constant(s))", self.code.len(), self.constants.len());
        self.code = Vec::new();
        self.lines = Vec::new();
        self.capacity = 0;
        self.constants.reset();
    }
}

/// Operand encoding of a constant index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstantOperand {
    Short(u8),
    /// Little-endian, 24 bits.
    Long([u8; 3]),
}

impl ConstantOperand {
    #[allow(clippy::cast_possible_truncation)]
    const fn for_index(index: usize) -> CoreResult<Self> {
        if index <= MAX_SHORT_INDEX {
            Ok(Self::Short(index as u8))
        } else if index <= MAX_LONG_INDEX {
            let [b0, b1, b2, _] = (index as u32).to_le_bytes();
            Ok(Self::Long([b0, b1, b2]))
        } else {
            Err(CoreError::ConstantPoolOverflow { index })
        }
    }
}

/// Iterator yielding contiguous line runs `(start..end, line)`.
pub struct LineRanges<'a> {
    lines: &'a [u32],
    index: usize,
}

impl Iterator for LineRanges<'_> {
    type Item = (Range<usize>, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.index;
        let line = *self.lines.get(start)?;
        self.index += 1;
        while self.lines.get(self.index) == Some(&line) {
            self.index += 1;
        }
        Some((start..self.index, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::instruction::Instruction;
    use proptest::prelude::*;

    #[test]
    fn write_keeps_lines_parallel() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 89);
        chunk.write(0, 89);
        chunk.write_op(OpCode::Return, 101);
        assert_eq!(chunk.code(), &[1, 0, 0]);
        assert_eq!(chunk.lines(), &[89, 89, 101]);
        assert_eq!(chunk.line_at(2), Some(101));
        assert_eq!(chunk.line_at(3), None);
    }

    #[test]
    fn nine_writes_grow_twice() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.capacity(), 0);
        for i in 0..8 {
            chunk.write(i, 1);
        }
        assert_eq!(chunk.capacity(), 8);
        chunk.write(8, 1);
        assert_eq!(chunk.capacity(), 16);
        assert_eq!(chunk.len(), 9);

        chunk.reset();
        assert_eq!(chunk.capacity(), 0);
        assert_eq!(chunk.len(), 0);
        assert!(chunk.lines().is_empty());
    }

    #[test]
    fn reset_clears_constants_and_is_repeatable() {
        let mut chunk = Chunk::new();
        chunk.add_constant(Value::Number(1.2));
        chunk.write_op(OpCode::Return, 1);
        chunk.reset();
        chunk.reset();
        assert!(chunk.constants().is_empty());
        assert_eq!(chunk.constants().capacity(), 0);
        assert_eq!(chunk, Chunk::new());
    }

    #[test]
    fn write_constant_uses_short_form_first() -> CoreResult<()> {
        let mut chunk = Chunk::new();
        let ix = chunk.write_constant(Value::Number(1.2), 7)?;
        assert_eq!(ix, 0);
        assert_eq!(chunk.code(), &[1, 0]);
        assert_eq!(chunk.lines(), &[7, 7]);
        Ok(())
    }

    #[test]
    fn write_constant_switches_to_long_form_past_255() -> CoreResult<()> {
        let mut chunk = Chunk::new();
        for i in 0..256 {
            chunk.add_constant(Value::Number(f64::from(i)));
        }
        let ix = chunk.write_constant(Value::Number(0.5), 3)?;
        assert_eq!(ix, 256);
        assert_eq!(chunk.code(), &[2, 0x00, 0x01, 0x00]);
        assert_eq!(chunk.lines(), &[3, 3, 3, 3]);

        let decoded: Vec<_> = chunk.instructions().collect::<CoreResult<_>>()?;
        assert_eq!(decoded, vec![(0, Instruction::ConstantLong { index: 256 })]);
        Ok(())
    }

    #[test]
    fn constant_operand_widths() {
        assert_eq!(ConstantOperand::for_index(0), Ok(ConstantOperand::Short(0)));
        assert_eq!(ConstantOperand::for_index(MAX_SHORT_INDEX), Ok(ConstantOperand::Short(255)));
        assert_eq!(ConstantOperand::for_index(MAX_SHORT_INDEX + 1), Ok(ConstantOperand::Long([0x00, 0x01, 0x00])));
        assert_eq!(ConstantOperand::for_index(0x01_0203), Ok(ConstantOperand::Long([0x03, 0x02, 0x01])));
        assert_eq!(ConstantOperand::for_index(MAX_LONG_INDEX), Ok(ConstantOperand::Long([0xFF; 3])));
    }

    #[test]
    fn constant_operand_rejects_indices_past_24_bits() {
        assert_eq!(
            ConstantOperand::for_index(MAX_LONG_INDEX + 1),
            Err(CoreError::ConstantPoolOverflow { index: MAX_LONG_INDEX + 1 })
        );
    }

    #[test]
    #[ignore = "fills 2^24 constants"]
    fn write_constant_fails_once_the_pool_is_full() {
        let mut chunk = Chunk::new();
        for i in 0..=MAX_LONG_INDEX {
            chunk.add_constant(Value::from(i as f64));
        }
        let before = (chunk.len(), chunk.constants().len());
        assert_eq!(
            chunk.write_constant(Value::Number(0.0), 1),
            Err(CoreError::ConstantPoolOverflow { index: MAX_LONG_INDEX + 1 })
        );
        assert_eq!((chunk.len(), chunk.constants().len()), before);
    }

    #[test]
    fn line_ranges_group_runs() {
        let mut chunk = Chunk::new();
        for line in [1, 1, 2, 2, 2, 1] {
            chunk.write(0, line);
        }
        let runs: Vec<_> = chunk.line_ranges().collect();
        assert_eq!(runs, vec![(0..2, 1), (2..5, 2), (5..6, 1)]);
    }

    proptest! {
        #[test]
        fn writes_round_trip_in_order(pairs in prop::collection::vec((any::<u8>(), any::<u32>()), 0..300)) {
            let mut chunk = Chunk::new();
            let mut last_cap = 0;
            for &(byte, line) in &pairs {
                chunk.write(byte, line);
                prop_assert_eq!(chunk.code().len(), chunk.lines().len());
                prop_assert!(chunk.len() <= chunk.capacity());
                if chunk.capacity() != last_cap {
                    prop_assert!(last_cap == 0 || chunk.capacity() >= 2 * last_cap);
                    last_cap = chunk.capacity();
                }
            }
            let bytes: Vec<u8> = pairs.iter().map(|p| p.0).collect();
            let lines: Vec<u32> = pairs.iter().map(|p| p.1).collect();
            prop_assert_eq!(chunk.code(), bytes.as_slice());
            prop_assert_eq!(chunk.lines(), lines.as_slice());
            prop_assert_eq!(chunk.len(), pairs.len());
        }

        #[test]
        fn constant_indices_survive_writes(xs in prop::collection::vec(-1.0e6f64..1.0e6, 1..64)) {
            let mut chunk = Chunk::new();
            let ixs: Vec<usize> = xs.iter().map(|&x| {
                let ix = chunk.add_constant(Value::Number(x));
                chunk.write_op(OpCode::Return, 1);
                ix
            }).collect();
            for (ix, x) in ixs.into_iter().zip(xs) {
                prop_assert_eq!(chunk.constants().get(ix), Some(&Value::Number(x)));
            }
        }
    }
}
