//! Bytecode operation codes.
//!
//! Each opcode is a single byte with operands following inline, big-endian.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// The VM is a stack machine. The stack effect of each instruction is noted
/// as `pops -> pushes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    /// Push null. `0 -> 1`
    PushNull = 0,
    /// Push a constant from the proc's pool. `0 -> 1`
    /// Operand: u16 constant index
    PushConstant,

    // =========================================================================
    // Stack and slots
    // =========================================================================
    /// Discard the top of the stack. `1 -> 0`
    Pop,
    /// Push a local variable. `0 -> 1`
    /// Operand: u8 slot
    GetLocal,
    /// Push a local variable. `0 -> 1`
    /// Operand: u16 slot
    GetLocalWide,
    /// Pop into a local variable. `1 -> 0`
    /// Operand: u8 slot
    SetLocal,
    /// Pop into a local variable. `1 -> 0`
    /// Operand: u16 slot
    SetLocalWide,
    /// Push the value of the `.` slot. `0 -> 1`
    PushSelf,
    /// Push the object the proc runs on (`src`). `0 -> 1`
    PushSrc,
    /// Replace an object with one of its fields. `1 -> 1`
    /// Operand: u16 name constant
    DereferenceField,

    // =========================================================================
    // Operators
    // =========================================================================
    /// `1 -> 1`
    Negate,
    /// `1 -> 1`
    BitNot,
    /// `1 -> 1`
    Not,
    /// `2 -> 1`
    Add,
    /// `2 -> 1`
    Subtract,
    /// `2 -> 1`
    Multiply,
    /// `2 -> 1`
    Divide,
    /// `2 -> 1`
    Modulus,
    /// `2 -> 1`
    BitAnd,
    /// `2 -> 1`
    BitOr,
    /// `2 -> 1`
    BitXor,
    /// `2 -> 1`
    BitShiftLeft,
    /// `2 -> 1`
    BitShiftRight,

    // =========================================================================
    // Calls
    // =========================================================================
    /// Collect the top `argc` values into an argument list. `argc -> 1`
    /// Operands: u8 argc, then one u16 per argument: the name constant of a
    /// named argument or `0xFFFF` for a positional one
    PushArguments,
    /// Push the enclosing proc's own incoming arguments as a list. `0 -> 1`
    PushProcArguments,
    /// Call a reference with the argument list on top of the stack.
    /// `1 -> 1`, or `2 -> 1` when the reference takes its receiver from the stack
    /// Operand: encoded reference
    Call,

    // =========================================================================
    // Control flow
    // =========================================================================
    /// If the top of the stack is null, jump and leave the null as the
    /// expression's result; otherwise fall through. `1 -> 1`
    /// Operand: u16 distance from the end of the operand
    JumpIfNullDereference,
    /// Return the top of the stack. `1 -> 0`
    Return,
}

impl OpCode {
    /// Size of the fixed operand in bytes.
    ///
    /// `PushArguments` and `Call` are variable-length; this is the size of
    /// their leading byte only.
    pub fn operand_size(self) -> usize {
        match self {
            OpCode::PushConstant
            | OpCode::GetLocalWide
            | OpCode::SetLocalWide
            | OpCode::DereferenceField
            | OpCode::JumpIfNullDereference => 2,
            OpCode::GetLocal | OpCode::SetLocal | OpCode::PushArguments | OpCode::Call => 1,
            _ => 0,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::PushNull => "PushNull",
            OpCode::PushConstant => "PushConstant",
            OpCode::Pop => "Pop",
            OpCode::GetLocal => "GetLocal",
            OpCode::GetLocalWide => "GetLocalWide",
            OpCode::SetLocal => "SetLocal",
            OpCode::SetLocalWide => "SetLocalWide",
            OpCode::PushSelf => "PushSelf",
            OpCode::PushSrc => "PushSrc",
            OpCode::DereferenceField => "DereferenceField",
            OpCode::Negate => "Negate",
            OpCode::BitNot => "BitNot",
            OpCode::Not => "Not",
            OpCode::Add => "Add",
            OpCode::Subtract => "Subtract",
            OpCode::Multiply => "Multiply",
            OpCode::Divide => "Divide",
            OpCode::Modulus => "Modulus",
            OpCode::BitAnd => "BitAnd",
            OpCode::BitOr => "BitOr",
            OpCode::BitXor => "BitXor",
            OpCode::BitShiftLeft => "BitShiftLeft",
            OpCode::BitShiftRight => "BitShiftRight",
            OpCode::PushArguments => "PushArguments",
            OpCode::PushProcArguments => "PushProcArguments",
            OpCode::Call => "Call",
            OpCode::JumpIfNullDereference => "JumpIfNullDereference",
            OpCode::Return => "Return",
        }
    }
}
