//! Bytecode emitter for the dmc compiler.
//!
//! The [`BytecodeEmitter`] is the proc writer lowering talks to: it encodes
//! reference operands, allocates labels and back-patches jumps.
//!
//! It also simulates the evaluation stack. Every edge into a label records
//! the depth it arrives with; binding a label whose edges disagree is an
//! [`InternalError::StackMismatch`], so a branch that forgets to leave a
//! result behind is caught while the proc is being written.
//!
//! # Example
//!
//! ```
//! use dmc_compiler::emit::BytecodeEmitter;
//! use dmc_compiler::{OpCode, Reference};
//!
//! let mut emitter = BytecodeEmitter::new();
//! emitter.set_line(1);
//! emitter.emit_push_src();
//! let skip = emitter.allocate_label();
//! emitter.emit_conditional_skip(skip).unwrap();
//! emitter.push_arguments(&[]).unwrap();
//! emitter.emit_call(&Reference::qualified_proc("Use")).unwrap();
//! emitter.emit_label(skip).unwrap();
//! assert_eq!(emitter.stack_depth(), 1);
//!
//! let (chunk, _constants) = emitter.finish().unwrap();
//! chunk.assert_opcodes(&[
//!     OpCode::PushSrc,
//!     OpCode::JumpIfNullDereference,
//!     OpCode::PushArguments,
//!     OpCode::Call,
//! ]);
//! ```

mod labels;

pub use labels::{Label, LabelTable};

use dmc_core::InternalError;

use crate::bytecode::{BytecodeChunk, Constant, ConstantPool, OpCode, POSITIONAL_ARGUMENT};
use crate::reference::Reference;

type Result<T> = std::result::Result<T, InternalError>;

/// Writes the bytecode of a single proc.
///
/// Each emitter owns its chunk, constant pool and label namespace, so procs
/// can be written independently.
#[derive(Debug)]
pub struct BytecodeEmitter {
    chunk: BytecodeChunk,
    constants: ConstantPool,
    labels: LabelTable,
    current_line: u32,
    /// Simulated evaluation stack depth.
    depth: i32,
    max_depth: i32,
    /// False right after an unconditional jump or return.
    reachable: bool,
}

impl Default for BytecodeEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl BytecodeEmitter {
    pub fn new() -> Self {
        Self {
            chunk: BytecodeChunk::new(),
            constants: ConstantPool::new(),
            labels: LabelTable::new(),
            current_line: 1,
            depth: 0,
            max_depth: 0,
            reachable: true,
        }
    }

    /// Set current source line for debug info.
    pub fn set_line(&mut self, line: u32) {
        self.current_line = line;
    }

    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    /// Current simulated stack depth.
    pub fn stack_depth(&self) -> i32 {
        self.depth
    }

    pub fn max_stack_depth(&self) -> i32 {
        self.max_depth
    }

    pub fn current_offset(&self) -> usize {
        self.chunk.current_offset()
    }

    fn adjust(&mut self, effect: i32) {
        self.depth += effect;
        self.max_depth = self.max_depth.max(self.depth);
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit an opcode without operands.
    ///
    /// Only opcodes with a fixed stack effect and no operand are accepted.
    pub fn emit(&mut self, op: OpCode) -> Result<()> {
        let effect = match op {
            OpCode::PushNull
            | OpCode::PushSelf
            | OpCode::PushSrc
            | OpCode::PushProcArguments => 1,
            OpCode::Negate | OpCode::BitNot | OpCode::Not => 0,
            OpCode::Pop
            | OpCode::Add
            | OpCode::Subtract
            | OpCode::Multiply
            | OpCode::Divide
            | OpCode::Modulus
            | OpCode::BitAnd
            | OpCode::BitOr
            | OpCode::BitXor
            | OpCode::BitShiftLeft
            | OpCode::BitShiftRight
            | OpCode::Return => -1,
            _ => {
                return Err(InternalError::Other {
                    message: format!("{} needs operands", op.name()),
                });
            }
        };
        self.chunk.write_op(op, self.current_line);
        self.adjust(effect);
        if op == OpCode::Return {
            self.reachable = false;
        }
        Ok(())
    }

    /// Add a string to the pool as an operand index.
    fn name_operand(&mut self, name: &str) -> Result<u16> {
        let index = self.constants.add_string(name);
        constant_operand(index)
    }

    // ==========================================================================
    // Values
    // ==========================================================================

    pub fn emit_null(&mut self) {
        self.chunk.write_op(OpCode::PushNull, self.current_line);
        self.adjust(1);
    }

    /// Push a constant from the proc's pool.
    pub fn emit_constant(&mut self, constant: Constant) -> Result<()> {
        let index = constant_operand(self.constants.add(constant))?;
        self.chunk.write_op(OpCode::PushConstant, self.current_line);
        self.chunk.write_u16(index, self.current_line);
        self.adjust(1);
        Ok(())
    }

    pub fn emit_number(&mut self, value: f32) -> Result<()> {
        self.emit_constant(Constant::number(value))
    }

    pub fn emit_string(&mut self, value: &str) -> Result<()> {
        self.emit_constant(Constant::String(value.to_string()))
    }

    /// Push a local variable, using the narrow form for slots below 256.
    pub fn emit_get_local(&mut self, slot: u16) {
        if let Ok(narrow) = u8::try_from(slot) {
            self.chunk.write_op(OpCode::GetLocal, self.current_line);
            self.chunk.write_byte(narrow, self.current_line);
        } else {
            self.chunk.write_op(OpCode::GetLocalWide, self.current_line);
            self.chunk.write_u16(slot, self.current_line);
        }
        self.adjust(1);
    }

    /// Pop into a local variable.
    pub fn emit_set_local(&mut self, slot: u16) {
        if let Ok(narrow) = u8::try_from(slot) {
            self.chunk.write_op(OpCode::SetLocal, self.current_line);
            self.chunk.write_byte(narrow, self.current_line);
        } else {
            self.chunk.write_op(OpCode::SetLocalWide, self.current_line);
            self.chunk.write_u16(slot, self.current_line);
        }
        self.adjust(-1);
    }

    /// Push the `.` slot.
    pub fn emit_push_self(&mut self) {
        self.chunk.write_op(OpCode::PushSelf, self.current_line);
        self.adjust(1);
    }

    /// Push `src`.
    pub fn emit_push_src(&mut self) {
        self.chunk.write_op(OpCode::PushSrc, self.current_line);
        self.adjust(1);
    }

    /// Replace the object on top of the stack with its field `name`.
    pub fn emit_dereference_field(&mut self, name: &str) -> Result<()> {
        let index = self.name_operand(name)?;
        self.chunk.write_op(OpCode::DereferenceField, self.current_line);
        self.chunk.write_u16(index, self.current_line);
        Ok(())
    }

    pub fn emit_pop(&mut self) {
        self.chunk.write_op(OpCode::Pop, self.current_line);
        self.adjust(-1);
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// Collect the already pushed argument values into an argument list.
    ///
    /// `names` has one entry per argument, `Some` for named arguments.
    pub fn push_arguments(&mut self, names: &[Option<&str>]) -> Result<()> {
        let argc = u8::try_from(names.len()).map_err(|_| InternalError::Other {
            message: format!("{} arguments do not fit the argument count operand", names.len()),
        })?;

        let mut operands = Vec::with_capacity(names.len());
        for name in names {
            operands.push(match name {
                Some(name) => self.name_operand(name)?,
                None => POSITIONAL_ARGUMENT,
            });
        }

        self.chunk.write_op(OpCode::PushArguments, self.current_line);
        self.chunk.write_byte(argc, self.current_line);
        for operand in operands {
            self.chunk.write_u16(operand, self.current_line);
        }
        self.adjust(1 - argc as i32);
        Ok(())
    }

    /// Forward the enclosing proc's own arguments.
    pub fn push_caller_arguments(&mut self) {
        self.chunk.write_op(OpCode::PushProcArguments, self.current_line);
        self.adjust(1);
    }

    /// Call `reference` with the argument list on top of the stack.
    pub fn emit_call(&mut self, reference: &Reference) -> Result<()> {
        // Payload is built first so a full pool leaves no half-written
        // instruction behind.
        let payload = match reference {
            Reference::InstanceProcByName { name, receiver } => {
                let [hi, lo] = self.name_operand(name)?.to_be_bytes();
                vec![hi, lo, u8::from(*receiver)]
            }
            Reference::GlobalProcById(id) => id.raw().to_be_bytes().to_vec(),
            Reference::SelfSlot | Reference::SuperProc => Vec::new(),
        };

        let line = self.current_line;
        self.chunk.write_op(OpCode::Call, line);
        self.chunk.write_byte(reference.kind().into(), line);
        for byte in payload {
            self.chunk.write_byte(byte, line);
        }

        let popped = if reference.takes_stack_receiver() { 2 } else { 1 };
        self.adjust(1 - popped);
        Ok(())
    }

    // ==========================================================================
    // Labels and jumps
    // ==========================================================================

    pub fn allocate_label(&mut self) -> Label {
        self.labels.allocate()
    }

    /// Skip to `label` when the receiver on top of the stack is null.
    ///
    /// On the skip edge the null stays on the stack as the result.
    pub fn emit_conditional_skip(&mut self, label: Label) -> Result<()> {
        let operand = self.chunk.emit_jump(OpCode::JumpIfNullDereference, self.current_line);
        self.labels.add_jump(label, operand, self.depth)
    }

    /// Bind `label` at the current offset and patch every jump to it.
    pub fn emit_label(&mut self, label: Label) -> Result<()> {
        let offset = self.chunk.current_offset();
        let fallthrough = self.reachable.then_some(self.depth);
        let (pending, depth) = self.labels.bind(label, offset, fallthrough)?;
        for operand in pending {
            self.chunk.patch_jump(operand, offset)?;
        }
        if let Some(depth) = depth {
            self.depth = depth;
            self.reachable = true;
        }
        Ok(())
    }

    /// Finish writing, returning the chunk and its constants.
    pub fn finish(self) -> Result<(BytecodeChunk, ConstantPool)> {
        self.labels.check_all_bound()?;
        Ok((self.chunk, self.constants))
    }
}

fn constant_operand(index: u32) -> Result<u16> {
    u16::try_from(index)
        .ok()
        .filter(|index| *index != POSITIONAL_ARGUMENT)
        .ok_or(InternalError::ConstantPoolFull(POSITIONAL_ARGUMENT as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Instruction;
    use dmc_core::ProcId;

    #[test]
    fn new_emitter_is_empty() {
        let emitter = BytecodeEmitter::new();
        assert_eq!(emitter.stack_depth(), 0);
        assert_eq!(emitter.current_line(), 1);
        let (chunk, constants) = emitter.finish().unwrap();
        assert!(chunk.is_empty());
        assert!(constants.is_empty());
    }

    #[test]
    fn line_tracking() {
        let mut emitter = BytecodeEmitter::new();
        emitter.set_line(10);
        emitter.emit_null();
        emitter.set_line(20);
        emitter.emit_pop();

        let (chunk, _) = emitter.finish().unwrap();
        assert_eq!(chunk.line_at(0), Some(10));
        assert_eq!(chunk.line_at(1), Some(20));
    }

    #[test]
    fn constants_are_deduplicated() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_number(4.0).unwrap();
        emitter.emit_number(4.0).unwrap();
        emitter.emit_string("x").unwrap();

        let (chunk, constants) = emitter.finish().unwrap();
        assert_eq!(constants.len(), 2);
        assert_eq!(chunk.read_u16(1), chunk.read_u16(4));
    }

    #[test]
    fn wide_local_slot() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_get_local(3);
        emitter.emit_get_local(300);

        let (chunk, constants) = emitter.finish().unwrap();
        chunk.assert_opcodes(&[OpCode::GetLocal, OpCode::GetLocalWide]);
        assert_eq!(
            chunk.decode(&constants).unwrap(),
            vec![Instruction::GetLocal(3), Instruction::GetLocal(300)]
        );
    }

    #[test]
    fn emit_rejects_operand_opcodes() {
        let mut emitter = BytecodeEmitter::new();
        assert!(emitter.emit(OpCode::Call).is_err());
        assert!(emitter.emit(OpCode::Add).is_ok());
    }

    #[test]
    fn call_stack_effects() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_number(1.0).unwrap();
        emitter.emit_number(2.0).unwrap();
        emitter.push_arguments(&[None, Some("dir")]).unwrap();
        assert_eq!(emitter.stack_depth(), 1);

        emitter
            .emit_call(&Reference::GlobalProcById(ProcId::new(5)))
            .unwrap();
        assert_eq!(emitter.stack_depth(), 1);

        emitter.emit_push_src();
        emitter.push_caller_arguments();
        emitter
            .emit_call(&Reference::qualified_proc("Step"))
            .unwrap();
        assert_eq!(emitter.stack_depth(), 2);
        assert_eq!(emitter.max_stack_depth(), 3);
    }

    #[test]
    fn references_round_trip_through_decode() {
        let mut emitter = BytecodeEmitter::new();
        let references = [
            Reference::instance_proc("Move"),
            Reference::GlobalProcById(ProcId::new(70000)),
            Reference::SelfSlot,
            Reference::SuperProc,
        ];
        for reference in &references {
            emitter.push_arguments(&[]).unwrap();
            emitter.emit_call(reference).unwrap();
        }

        let (chunk, constants) = emitter.finish().unwrap();
        let calls: Vec<_> = chunk
            .decode(&constants)
            .unwrap()
            .into_iter()
            .filter_map(|instruction| match instruction {
                Instruction::Call(reference) => Some(reference),
                _ => None,
            })
            .collect();
        assert_eq!(calls, references);
    }

    #[test]
    fn named_arguments_are_encoded() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_null();
        emitter.emit_null();
        emitter.push_arguments(&[None, Some("loc")]).unwrap();

        let (chunk, constants) = emitter.finish().unwrap();
        assert_eq!(
            chunk.decode(&constants).unwrap()[2],
            Instruction::PushArguments(vec![None, Some("loc".to_string())])
        );
    }

    #[test]
    fn conditional_skip_joins_with_same_depth() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_push_src();
        let join = emitter.allocate_label();
        emitter.emit_conditional_skip(join).unwrap();
        emitter.emit_number(1.0).unwrap();
        emitter.push_arguments(&[None]).unwrap();
        emitter
            .emit_call(&Reference::qualified_proc("Use"))
            .unwrap();
        emitter.emit_label(join).unwrap();
        assert_eq!(emitter.stack_depth(), 1);

        let (chunk, constants) = emitter.finish().unwrap();
        let decoded = chunk.decode_with_offsets(&constants).unwrap();
        assert_eq!(
            decoded[1].1,
            Instruction::JumpIfNullDereference {
                target: chunk.len()
            }
        );
    }

    #[test]
    fn unbalanced_branch_is_a_stack_mismatch() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_push_src();
        let join = emitter.allocate_label();
        emitter.emit_conditional_skip(join).unwrap();
        emitter.emit_pop();
        assert!(matches!(
            emitter.emit_label(join),
            Err(InternalError::StackMismatch {
                expected: 1,
                found: 0,
                ..
            })
        ));
    }

    #[test]
    fn label_after_return_takes_jump_depth() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_push_src();
        let end = emitter.allocate_label();
        emitter.emit_conditional_skip(end).unwrap();
        emitter.emit(OpCode::Return).unwrap();
        // Unreachable code does not contribute an edge.
        emitter.emit_label(end).unwrap();
        assert_eq!(emitter.stack_depth(), 1);
    }

    #[test]
    fn unbound_label_fails_finish() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit_null();
        let label = emitter.allocate_label();
        emitter.emit_conditional_skip(label).unwrap();
        assert!(matches!(
            emitter.finish(),
            Err(InternalError::UnboundLabel(_))
        ));
    }
}
