//! Decoding chunks back into instructions, for tests and tooling.

use thiserror::Error;

use dmc_core::ProcId;

use super::{BytecodeChunk, Constant, ConstantPool, OpCode};
use crate::reference::{ProcReceiver, Reference, ReferenceKind};

/// Marks a positional argument in a `PushArguments` operand list.
pub const POSITIONAL_ARGUMENT: u16 = 0xFFFF;

/// A decoded instruction with its operands resolved against the constant pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    PushNull,
    PushConstant(Constant),
    Pop,
    GetLocal(u16),
    SetLocal(u16),
    PushSelf,
    PushSrc,
    DereferenceField(String),
    /// A unary or binary operator.
    Operator(OpCode),
    /// Argument names in push order; `None` for positional arguments.
    PushArguments(Vec<Option<String>>),
    PushProcArguments,
    Call(Reference),
    /// Carries the absolute offset the jump lands on.
    JumpIfNullDereference { target: usize },
    Return,
}

/// A chunk that does not decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode {byte:#04x} at offset {offset}")]
    InvalidOpcode { offset: usize, byte: u8 },

    #[error("invalid reference kind {byte:#04x} at offset {offset}")]
    InvalidReferenceKind { offset: usize, byte: u8 },

    #[error("invalid receiver {byte:#04x} at offset {offset}")]
    InvalidReceiver { offset: usize, byte: u8 },

    #[error("truncated operand at offset {0}")]
    Truncated(usize),

    #[error("constant {0} is missing or not a string")]
    BadConstant(u32),
}

impl BytecodeChunk {
    /// Decode the whole chunk.
    pub fn decode(&self, constants: &ConstantPool) -> Result<Vec<Instruction>, DecodeError> {
        Ok(self
            .decode_with_offsets(constants)?
            .into_iter()
            .map(|(_, instruction)| instruction)
            .collect())
    }

    /// Decode the whole chunk, pairing each instruction with its offset.
    pub fn decode_with_offsets(
        &self,
        constants: &ConstantPool,
    ) -> Result<Vec<(usize, Instruction)>, DecodeError> {
        let mut decoder = Decoder {
            chunk: self,
            constants,
            offset: 0,
        };
        let mut instructions = Vec::new();
        while decoder.offset < self.len() {
            let start = decoder.offset;
            instructions.push((start, decoder.instruction()?));
        }
        Ok(instructions)
    }
}

struct Decoder<'a> {
    chunk: &'a BytecodeChunk,
    constants: &'a ConstantPool,
    offset: usize,
}

impl Decoder<'_> {
    fn byte(&mut self) -> Result<u8, DecodeError> {
        let byte = self
            .chunk
            .read_byte(self.offset)
            .ok_or(DecodeError::Truncated(self.offset))?;
        self.offset += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        let value = self
            .chunk
            .read_u16(self.offset)
            .ok_or(DecodeError::Truncated(self.offset))?;
        self.offset += 2;
        Ok(value)
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        let value = self
            .chunk
            .read_u32(self.offset)
            .ok_or(DecodeError::Truncated(self.offset))?;
        self.offset += 4;
        Ok(value)
    }

    fn name(&mut self) -> Result<String, DecodeError> {
        let index = self.u16()? as u32;
        self.constants
            .string(index)
            .map(str::to_string)
            .ok_or(DecodeError::BadConstant(index))
    }

    fn jump_target(&mut self) -> Result<usize, DecodeError> {
        let distance = self.u16()? as usize;
        Ok(self.offset + distance)
    }

    fn instruction(&mut self) -> Result<Instruction, DecodeError> {
        let offset = self.offset;
        let byte = self.byte()?;
        let op = OpCode::try_from(byte).map_err(|_| DecodeError::InvalidOpcode { offset, byte })?;

        let instruction = match op {
            OpCode::PushNull => Instruction::PushNull,
            OpCode::PushConstant => {
                let index = self.u16()? as u32;
                let constant = self
                    .constants
                    .get(index)
                    .cloned()
                    .ok_or(DecodeError::BadConstant(index))?;
                Instruction::PushConstant(constant)
            }
            OpCode::Pop => Instruction::Pop,
            OpCode::GetLocal => Instruction::GetLocal(self.byte()? as u16),
            OpCode::GetLocalWide => Instruction::GetLocal(self.u16()?),
            OpCode::SetLocal => Instruction::SetLocal(self.byte()? as u16),
            OpCode::SetLocalWide => Instruction::SetLocal(self.u16()?),
            OpCode::PushSelf => Instruction::PushSelf,
            OpCode::PushSrc => Instruction::PushSrc,
            OpCode::DereferenceField => Instruction::DereferenceField(self.name()?),
            OpCode::Negate
            | OpCode::BitNot
            | OpCode::Not
            | OpCode::Add
            | OpCode::Subtract
            | OpCode::Multiply
            | OpCode::Divide
            | OpCode::Modulus
            | OpCode::BitAnd
            | OpCode::BitOr
            | OpCode::BitXor
            | OpCode::BitShiftLeft
            | OpCode::BitShiftRight => Instruction::Operator(op),
            OpCode::PushArguments => {
                let argc = self.byte()?;
                let mut names = Vec::with_capacity(argc as usize);
                for _ in 0..argc {
                    let index = self.u16()?;
                    if index == POSITIONAL_ARGUMENT {
                        names.push(None);
                    } else {
                        let name = self
                            .constants
                            .string(index as u32)
                            .ok_or(DecodeError::BadConstant(index as u32))?;
                        names.push(Some(name.to_string()));
                    }
                }
                Instruction::PushArguments(names)
            }
            OpCode::PushProcArguments => Instruction::PushProcArguments,
            OpCode::Call => Instruction::Call(self.reference()?),
            OpCode::JumpIfNullDereference => Instruction::JumpIfNullDereference {
                target: self.jump_target()?,
            },
            OpCode::Return => Instruction::Return,
        };
        Ok(instruction)
    }

    fn reference(&mut self) -> Result<Reference, DecodeError> {
        let offset = self.offset;
        let byte = self.byte()?;
        let kind = ReferenceKind::try_from(byte)
            .map_err(|_| DecodeError::InvalidReferenceKind { offset, byte })?;

        Ok(match kind {
            ReferenceKind::InstanceProc => {
                let name = self.name()?;
                let offset = self.offset;
                let byte = self.byte()?;
                let receiver = ProcReceiver::try_from(byte)
                    .map_err(|_| DecodeError::InvalidReceiver { offset, byte })?;
                Reference::InstanceProcByName { name, receiver }
            }
            ReferenceKind::GlobalProc => Reference::GlobalProcById(ProcId::new(self.u32()?)),
            ReferenceKind::SelfSlot => Reference::SelfSlot,
            ReferenceKind::SuperProc => Reference::SuperProc,
        })
    }
}
