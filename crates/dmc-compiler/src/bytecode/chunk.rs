//! Bytecode chunk for compiled procs.
//!
//! A `BytecodeChunk` contains the compiled bytecode for a single proc,
//! along with line number information for debugging.

use dmc_core::InternalError;

use super::OpCode;
use crate::reference::ReferenceKind;

/// A chunk of compiled bytecode for a single proc.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BytecodeChunk {
    code: Vec<u8>,
    /// Source line of each byte in `code`.
    lines: Vec<u32>,
}

impl BytecodeChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            code: Vec::with_capacity(capacity),
            lines: Vec::with_capacity(capacity),
        }
    }

    /// Write an opcode.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op.into(), line);
    }

    /// Write a byte operand.
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16, line: u32) {
        for byte in value.to_be_bytes() {
            self.write_byte(byte, line);
        }
    }

    /// Write a 32-bit operand (big-endian).
    pub fn write_u32(&mut self, value: u32, line: u32) {
        for byte in value.to_be_bytes() {
            self.write_byte(byte, line);
        }
    }

    /// Current code offset (for jump patching).
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Emit a jump instruction and return the offset of its operand.
    ///
    /// The operand is a 0xFFFF placeholder until [`patch_jump`](Self::patch_jump).
    pub fn emit_jump(&mut self, op: OpCode, line: u32) -> usize {
        self.write_op(op, line);
        let offset = self.code.len();
        self.write_u16(0xFFFF, line);
        offset
    }

    /// Patch the jump operand at `offset` to land on `target`.
    pub fn patch_jump(&mut self, offset: usize, target: usize) -> Result<(), InternalError> {
        let distance = target
            .checked_sub(offset + 2)
            .ok_or_else(|| InternalError::Other {
                message: format!("backward jump from {offset} to {target}"),
            })?;
        let distance = u16::try_from(distance).map_err(|_| InternalError::JumpTooFar(distance))?;
        let [hi, lo] = distance.to_be_bytes();
        self.code[offset] = hi;
        self.code[offset + 1] = lo;
        Ok(())
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    /// The source line of the byte at `offset`.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Read a big-endian u16 at `offset`.
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a big-endian u32 at `offset`.
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes = self.code.get(offset..offset + 4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.read_byte(offset).and_then(|b| OpCode::try_from(b).ok())
    }

    /// Length in bytes of the instruction starting at `offset`, operands included.
    pub fn instruction_len(&self, offset: usize) -> Option<usize> {
        let op = self.read_op(offset)?;
        let len = match op {
            OpCode::PushArguments => {
                let argc = self.read_byte(offset + 1)? as usize;
                2 + argc * 2
            }
            OpCode::Call => {
                let kind = ReferenceKind::try_from(self.read_byte(offset + 1)?).ok()?;
                let payload = match kind {
                    ReferenceKind::InstanceProc => 3,
                    ReferenceKind::GlobalProc => 4,
                    ReferenceKind::SelfSlot | ReferenceKind::SuperProc => 0,
                };
                2 + payload
            }
            _ => 1 + op.operand_size(),
        };
        Some(len)
    }

    /// All opcodes in the chunk, skipping operands.
    ///
    /// Useful for testing bytecode sequences without worrying about operand
    /// values. Stops at the first byte that is not a valid instruction.
    pub fn opcodes(&self) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let mut offset = 0;
        while let (Some(op), Some(len)) = (self.read_op(offset), self.instruction_len(offset)) {
            ops.push(op);
            offset += len;
        }
        ops
    }

    /// Check that this chunk contains exactly the given opcode sequence.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Check that this chunk contains the given opcodes in order, not
    /// necessarily contiguous.
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}
