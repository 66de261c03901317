//! Per-proc compilation state.
//!
//! The [`CompilationContext`] is threaded through every lowering function in
//! place of ambient globals. It borrows the object tree immutably and owns
//! this proc's diagnostic queue and local scope.

use rustc_hash::FxHashMap;

use dmc_core::{DiagnosticKind, Diagnostics, InternalError, ProcId, Span, TypeId};
use dmc_registry::{ObjectTree, ProcEntry};

use crate::CompilerOptions;

/// A local variable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVar {
    pub name: String,
    pub slot: u16,
    /// Declared type, if the declaration named one the tree knows.
    pub ty: Option<TypeId>,
}

/// Locals of the proc being compiled. Redeclaring a name shadows it with a
/// fresh slot.
#[derive(Debug, Default)]
pub struct LocalScope {
    vars: Vec<LocalVar>,
    by_name: FxHashMap<String, usize>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, ty: Option<TypeId>) -> Result<u16, InternalError> {
        let slot = u16::try_from(self.vars.len()).map_err(|_| InternalError::Other {
            message: format!("too many locals declaring '{name}'"),
        })?;
        self.by_name.insert(name.to_string(), self.vars.len());
        self.vars.push(LocalVar {
            name: name.to_string(),
            slot,
            ty,
        });
        Ok(slot)
    }

    pub fn get(&self, name: &str) -> Option<&LocalVar> {
        self.by_name.get(name).map(|index| &self.vars[*index])
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// State shared by all lowering functions while one proc is compiled.
pub struct CompilationContext<'a> {
    tree: &'a ObjectTree,
    options: &'a CompilerOptions,
    proc: &'a ProcEntry,
    diagnostics: Diagnostics,
    locals: LocalScope,
}

impl<'a> CompilationContext<'a> {
    pub fn new(tree: &'a ObjectTree, options: &'a CompilerOptions, proc: &'a ProcEntry) -> Self {
        Self {
            tree,
            options,
            proc,
            diagnostics: Diagnostics::with_levels(options.diagnostic_levels.clone()),
            locals: LocalScope::new(),
        }
    }

    pub fn tree(&self) -> &'a ObjectTree {
        self.tree
    }

    pub fn options(&self) -> &'a CompilerOptions {
        self.options
    }

    /// The proc whose body is being compiled.
    pub fn current_proc(&self) -> &'a ProcEntry {
        self.proc
    }

    /// The type of `src`, or `None` inside a global proc.
    pub fn owner_type(&self) -> Option<TypeId> {
        self.proc.owner
    }

    pub fn locals(&self) -> &LocalScope {
        &self.locals
    }

    pub fn locals_mut(&mut self) -> &mut LocalScope {
        &mut self.locals
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Report a diagnostic at its configured severity.
    pub fn report(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        self.diagnostics.emit(kind, span, message);
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Resolve `name` on the owner type and its ancestors.
    pub fn lookup_instance_proc(&self, name: &str) -> Option<ProcId> {
        self.tree.try_get_procedure(self.owner_type()?, name)
    }

    pub fn lookup_global_proc(&self, name: &str) -> Option<ProcId> {
        self.tree.global_proc(name)
    }

    pub fn proc_entry(&self, id: ProcId) -> Result<&'a ProcEntry, InternalError> {
        self.tree.proc(id)
    }
}
