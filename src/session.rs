//! Compilation session API.
//!
//! A [`Session`] owns the object tree and the compiler options for one
//! compilation. It enforces the two phases: declarations go into the tree
//! until [`Session::finalize`], after which proc bodies can be compiled
//! against the frozen tree.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use dmc::ast::AstBuilder;
//! use dmc::{ProcFlags, Session};
//!
//! let mut session = Session::new();
//! let mob = session.tree_mut().declare_str("/mob").unwrap();
//! let login = session.tree_mut().new_proc(mob, "Login", ProcFlags::empty()).unwrap();
//! session.finalize().unwrap();
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let body = [b.expr_stmt(b.call(b.ident("Logout"), &[]))];
//!
//! let compiled = session.compile_proc(login, &body).unwrap();
//! assert_eq!(compiled.diagnostics.warning_count(), 1);
//! ```

use tracing::debug;

use dmc_ast::Stmt;
use dmc_compiler::{
    CompiledProc, CompiledUnit, CompilerOptions, ProcBody, ProcCompiler, compile_unit,
};
use dmc_core::{ProcId, RegistryError};
use dmc_registry::ObjectTree;

use crate::error::Result;

/// One compilation: an object tree plus the options bodies are compiled with.
#[derive(Debug, Default)]
pub struct Session {
    tree: ObjectTree,
    options: CompilerOptions,
}

impl Session {
    /// Create a session with an empty tree and default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            tree: ObjectTree::new(),
            options,
        }
    }

    /// Apply a `"<kind> <severity>"` pragma to the session's options.
    pub fn apply_pragma(&mut self, pragma: &str) -> Result<()> {
        self.options.diagnostic_levels.apply_pragma(pragma)?;
        Ok(())
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn tree(&self) -> &ObjectTree {
        &self.tree
    }

    /// The tree, for declaration collection.
    pub fn tree_mut(&mut self) -> &mut ObjectTree {
        &mut self.tree
    }

    /// End declaration collection.
    pub fn finalize(&mut self) -> Result<()> {
        self.tree.finalize()?;
        Ok(())
    }

    /// Compile a single proc body.
    pub fn compile_proc(&self, proc: ProcId, body: &[Stmt<'_>]) -> Result<CompiledProc> {
        self.require_finalized()?;
        let compiled = ProcCompiler::new(&self.tree, &self.options).compile(proc, &[], body)?;
        Ok(compiled)
    }

    /// Compile every queued body.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, bodies: &[ProcBody<'_, '_>]) -> Result<CompiledUnit> {
        self.require_finalized()?;
        let unit = compile_unit(&self.tree, &self.options, bodies)?;
        debug!(
            procs = unit.procs.len(),
            errors = unit.diagnostics.error_count(),
            warnings = unit.diagnostics.warning_count(),
            "unit compiled"
        );
        Ok(unit)
    }

    fn require_finalized(&self) -> Result<()> {
        if self.tree.is_finalized() {
            Ok(())
        } else {
            Err(RegistryError::NotFinalized("compiling proc bodies").into())
        }
    }
}
