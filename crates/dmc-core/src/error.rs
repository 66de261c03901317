//! Error types for the dmc compiler.
//!
//! User mistakes never surface here: they become [`Diagnostic`](crate::Diagnostic)s
//! and compilation continues. These types cover the remaining failure classes:
//!
//! ```text
//! InternalError   - broken compiler invariants; fatal for the compilation
//! RegistryError   - object tree construction problems (declaration phase)
//! ConfigError     - rejected compiler configuration
//! PathError       - malformed type path text
//! ```

use thiserror::Error;

use crate::{ProcId, TypeId};

/// A malformed type path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("type path '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("type path '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("type path '{path}' has invalid segment '{segment}'")]
    InvalidSegment { path: String, segment: String },
}

/// A violated internal invariant.
///
/// Raised when code that assumes something exists finds it missing, or when
/// emitted code is structurally inconsistent. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    /// `get_procedure` was used for a name that does not resolve.
    #[error("internal error: procedure '{name}' does not resolve on {type_path}")]
    UnresolvedProcedure { type_path: String, name: String },

    #[error("internal error: no type record for {0}")]
    UnknownType(TypeId),

    #[error("internal error: no procedure metadata for {0}")]
    UnknownProc(ProcId),

    /// Two control-flow edges reach a label with different evaluation stack depths.
    #[error("internal error: label {label} reached with stack depth {found}, expected {expected}")]
    StackMismatch {
        label: u32,
        expected: i32,
        found: i32,
    },

    #[error("internal error: label {0} bound twice")]
    LabelRebound(u32),

    #[error("internal error: label {0} was jumped to but never bound")]
    UnboundLabel(u32),

    #[error("internal error: jump distance {0} exceeds u16::MAX")]
    JumpTooFar(usize),

    #[error("internal error: constant pool exceeds {0} entries")]
    ConstantPoolFull(usize),

    #[error("internal error: {message}")]
    Other { message: String },
}

/// Errors raised while building the object tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("global proc '{0}' is already defined")]
    DuplicateGlobalProc(String),

    #[error("circular inheritance involving {0}")]
    CircularInheritance(String),

    #[error("object tree is already finalized")]
    AlreadyFinalized,

    #[error("object tree must be finalized before {0}")]
    NotFinalized(&'static str),

    #[error("the root type cannot have a parent")]
    RootHasParent,

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// A rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown diagnostic kind '{0}'")]
    UnknownKind(String),

    #[error("unknown severity '{0}' (expected error, warning, notice or disabled)")]
    UnknownSeverity(String),

    #[error("malformed pragma '{0}': expected '<kind> <severity>'")]
    MalformedPragma(String),

    #[error("'{kind}' is always an error and cannot be set to {requested}")]
    CannotDowngrade { kind: String, requested: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_display() {
        let err = InternalError::UnresolvedProcedure {
            type_path: "/mob".to_string(),
            name: "Login".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "internal error: procedure 'Login' does not resolve on /mob"
        );
    }

    #[test]
    fn registry_error_wraps_internal() {
        let err: RegistryError = InternalError::UnknownType(TypeId::new(9)).into();
        assert!(matches!(err, RegistryError::Internal(_)));
        assert_eq!(err.to_string(), "internal error: no type record for type#9");
    }

    #[test]
    fn path_error_display() {
        let err = PathError::NotAbsolute("obj".to_string());
        assert_eq!(err.to_string(), "type path 'obj' must start with '/'");
    }
}
