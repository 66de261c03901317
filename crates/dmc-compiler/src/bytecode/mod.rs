//! Bytecode types for the dmc compiler.
//!
//! - [`OpCode`] - The instruction set for the VM
//! - [`BytecodeChunk`] - Compiled bytecode for a proc
//! - [`Constant`] and [`ConstantPool`] - Per-proc constant storage
//! - [`Instruction`] - Decoded form of a chunk

mod chunk;
mod constant;
mod decode;
mod opcode;

pub use chunk::BytecodeChunk;
pub use constant::{Constant, ConstantPool};
pub use decode::{DecodeError, Instruction, POSITIONAL_ARGUMENT};
pub use opcode::OpCode;
