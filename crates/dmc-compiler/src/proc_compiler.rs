//! Proc compiler for generating bytecode from proc bodies.
//!
//! [`ProcCompiler`] compiles one proc body at a time. Each body gets its own
//! [`BytecodeEmitter`], so constant pools and label namespaces are never
//! shared between procs and independent bodies can be compiled in any order
//! (or in parallel, each with a shared `&ObjectTree`).
//!
//! # Example
//!
//! ```ignore
//! let compiler = ProcCompiler::new(&tree, &options);
//! let compiled = compiler.compile(proc_id, &[], &body)?;
//! for diagnostic in compiled.diagnostics.iter() {
//!     eprintln!("{diagnostic}");
//! }
//! ```

use tracing::debug;

use dmc_ast::{Stmt, VarDecl};
use dmc_core::{Diagnostics, InternalError, ProcId, TypeId};
use dmc_registry::ObjectTree;

use crate::bytecode::{BytecodeChunk, ConstantPool, DecodeError, Instruction, OpCode};
use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;
use crate::expr::ExprCompiler;
use crate::CompilerOptions;

type Result<T> = std::result::Result<T, InternalError>;

/// A local visible to the body before its first statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecl {
    pub name: String,
    pub ty: Option<TypeId>,
}

impl LocalDecl {
    pub fn new(name: impl Into<String>, ty: Option<TypeId>) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Output of compiling one proc body.
#[derive(Debug)]
pub struct CompiledProc {
    pub proc: ProcId,
    pub chunk: BytecodeChunk,
    pub constants: ConstantPool,
    pub diagnostics: Diagnostics,
}

impl CompiledProc {
    /// Decode the chunk against its own constant pool.
    pub fn instructions(&self) -> std::result::Result<Vec<Instruction>, DecodeError> {
        self.chunk.decode(&self.constants)
    }
}

/// Compiles proc bodies against a finalized object tree.
pub struct ProcCompiler<'a> {
    tree: &'a ObjectTree,
    options: &'a CompilerOptions,
}

impl<'a> ProcCompiler<'a> {
    pub fn new(tree: &'a ObjectTree, options: &'a CompilerOptions) -> Self {
        Self { tree, options }
    }

    /// Compile the body of `proc`.
    ///
    /// Parameters of the proc are declared first, then `locals`. User errors
    /// end up in the returned diagnostics; only internal failures are `Err`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(
        &self,
        proc: ProcId,
        locals: &[LocalDecl],
        body: &[Stmt<'_>],
    ) -> Result<CompiledProc> {
        let entry = self.tree.proc(proc)?;
        let mut ctx = CompilationContext::new(self.tree, self.options, entry);
        for param in &entry.params {
            ctx.locals_mut().declare(param, None)?;
        }
        for local in locals {
            ctx.locals_mut().declare(&local.name, local.ty)?;
        }

        let mut emitter = BytecodeEmitter::new();
        {
            let mut compiler = ExprCompiler::new(&mut ctx, &mut emitter);
            for stmt in body {
                compile_stmt(&mut compiler, self.tree, stmt)?;
            }
            if !matches!(body.last(), Some(Stmt::Return(_))) {
                // Falling off the end returns `.`
                compiler.emitter().emit_push_self();
                compiler.emitter().emit(OpCode::Return)?;
            }
        }

        let (chunk, constants) = emitter.finish()?;
        let diagnostics = ctx.into_diagnostics();
        debug!(
            proc = %entry.name,
            bytes = chunk.len(),
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "proc compiled"
        );

        Ok(CompiledProc {
            proc,
            chunk,
            constants,
            diagnostics,
        })
    }
}

fn compile_stmt(
    compiler: &mut ExprCompiler<'_, '_>,
    tree: &ObjectTree,
    stmt: &Stmt<'_>,
) -> Result<()> {
    compiler.emitter().set_line(stmt.span().line);
    match stmt {
        Stmt::Expr(expr) => {
            compiler.emit_value(expr)?;
            compiler.emitter().emit_pop();
            Ok(())
        }
        Stmt::Var(decl) => compile_var(compiler, tree, decl),
        Stmt::Return(ret) => {
            match ret.value {
                Some(value) => compiler.emit_value(value)?,
                None => compiler.emitter().emit_push_self(),
            }
            compiler.emitter().emit(OpCode::Return)
        }
    }
}

fn compile_var(
    compiler: &mut ExprCompiler<'_, '_>,
    tree: &ObjectTree,
    decl: &VarDecl<'_>,
) -> Result<()> {
    // The initializer sees the scope before the declaration.
    if let Some(init) = decl.init {
        compiler.emit_value(init)?;
    }
    let ty = decl.type_path.and_then(|path| tree.lookup(path));
    let slot = compiler.ctx_mut().locals_mut().declare(decl.name.name, ty)?;
    if decl.init.is_some() {
        compiler.emitter().emit_set_local(slot);
    }
    Ok(())
}
