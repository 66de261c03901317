//! dmc: call lowering and procedure resolution for DM.
//!
//! This crate ties the workspace together:
//!
//! - [`ast`]: the expression and statement nodes the parser hands over
//! - [`registry`]: the object tree (type records, procs, global procs)
//! - [`compiler`]: references, the bytecode emitter and call lowering
//!
//! The shared building blocks of `dmc-core` (spans, ids, type paths,
//! diagnostics and error types) are re-exported at the root.
//!
//! [`Session`] is the usual entry point.

mod error;
mod session;

pub use dmc_ast as ast;
pub use dmc_compiler as compiler;
pub use dmc_registry as registry;

pub use error::{BuildError, Result};
pub use session::Session;

pub use dmc_compiler::{
    CompiledProc, CompiledUnit, CompilerOptions, Instruction, ProcBody, Reference,
};
pub use dmc_core::{
    ConfigError, Diagnostic, DiagnosticKind, DiagnosticLevels, Diagnostics, InternalError,
    PathError, ProcFlags, ProcId, RegistryError, Severity, Span, TypeId, TypePath,
};
pub use dmc_registry::ObjectTree;
