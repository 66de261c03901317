//! dmc Compiler
//!
//! Call lowering and procedure resolution for DM proc bodies.
//!
//! ## Architecture
//!
//! - **Declaration collection** (in `dmc-registry`): build and finalize the
//!   [`ObjectTree`](dmc_registry::ObjectTree)
//! - **Lowering** (this crate): compile each proc body against the read-only
//!   tree into its own bytecode chunk
//!
//! ## Modules
//!
//! - [`bytecode`]: Bytecode types (OpCode, BytecodeChunk, ConstantPool, decoding)
//! - [`context`]: Per-proc compilation context and local scope
//! - [`emit`]: Bytecode emitter with stack-depth checked labels
//! - [`expr`]: Expression lowering, call targets, constant folding, matrix lint
//! - [`options`]: Compiler configuration
//! - [`proc_compiler`]: Proc body compilation
//! - [`reference`]: Call reference addressing modes

pub mod bytecode;
pub mod context;
pub mod emit;
pub mod expr;
pub mod options;
pub mod proc_compiler;
pub mod reference;

pub use bytecode::{
    BytecodeChunk, Constant, ConstantPool, DecodeError, Instruction, OpCode, POSITIONAL_ARGUMENT,
};
pub use context::{CompilationContext, LocalScope, LocalVar};
pub use emit::{BytecodeEmitter, Label};
pub use expr::lint::{MATRIX_CONSTRUCTOR, MATRIX_GLOBAL_PROC, MATRIX_MODIFY, MATRIX_TYPE};
pub use expr::{CallTarget, ExprCompiler};
pub use options::CompilerOptions;
pub use proc_compiler::{CompiledProc, LocalDecl, ProcCompiler};
pub use reference::{ProcReceiver, Reference, ReferenceKind, Resolution, ResolvedReference};

use dmc_ast::Stmt;
use dmc_core::{Diagnostics, InternalError, ProcId};
use dmc_registry::ObjectTree;

/// One proc body queued for compilation.
#[derive(Debug, Clone, Copy)]
pub struct ProcBody<'a, 'ast> {
    pub proc: ProcId,
    pub locals: &'a [LocalDecl],
    pub stmts: &'a [Stmt<'ast>],
}

/// All procs compiled from one unit.
#[derive(Debug, Default)]
pub struct CompiledUnit {
    /// Compiled procs, in the order they were queued.
    pub procs: Vec<CompiledProc>,
    /// Diagnostics of every proc, merged in source order.
    pub diagnostics: Diagnostics,
}

impl CompiledUnit {
    /// Check if compilation succeeded (no error diagnostics).
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    pub fn proc(&self, id: ProcId) -> Option<&CompiledProc> {
        self.procs.iter().find(|compiled| compiled.proc == id)
    }
}

/// Compile every body in `bodies` against `tree`.
///
/// Each proc is compiled independently; the per-proc diagnostics stay on
/// each [`CompiledProc`] and are also merged into [`CompiledUnit::diagnostics`].
pub fn compile_unit(
    tree: &ObjectTree,
    options: &CompilerOptions,
    bodies: &[ProcBody<'_, '_>],
) -> Result<CompiledUnit, InternalError> {
    let compiler = ProcCompiler::new(tree, options);
    let mut unit = CompiledUnit {
        procs: Vec::with_capacity(bodies.len()),
        diagnostics: Diagnostics::with_levels(options.diagnostic_levels.clone()),
    };
    for body in bodies {
        let compiled = compiler.compile(body.proc, body.locals, body.stmts)?;
        unit.diagnostics.merge(compiled.diagnostics.clone());
        unit.procs.push(compiled);
    }
    Ok(unit)
}
