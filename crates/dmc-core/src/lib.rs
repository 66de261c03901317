//! Shared building blocks for the dmc compiler.
//!
//! This crate has no dependencies on the rest of the workspace. It provides:
//!
//! - [`Span`]: source locations
//! - [`TypePath`]: hierarchical type identities (`/obj/item`)
//! - [`TypeId`] and [`ProcId`]: arena indices handed out by the object tree
//! - [`ProcFlags`]: procedure attributes
//! - [`Diagnostic`], [`DiagnosticKind`], [`Severity`], [`Diagnostics`]: the
//!   recoverable, user-facing problem reports
//! - [`InternalError`], [`RegistryError`], [`ConfigError`], [`PathError`]

mod diagnostics;
mod error;
mod flags;
mod ids;
mod path;
mod span;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLevels, Diagnostics, Severity};
pub use error::{ConfigError, InternalError, PathError, RegistryError};
pub use flags::ProcFlags;
pub use ids::{ProcId, TypeId};
pub use path::TypePath;
pub use span::Span;
