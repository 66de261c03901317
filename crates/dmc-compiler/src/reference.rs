//! The addressing modes a call site can resolve to.
//!
//! A [`Reference`] is compile-time only: it tells the emitter how to encode
//! the callee of a `Call`. The set of variants is closed and every consumer
//! matches on all of them.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use dmc_core::{Diagnostic, Diagnostics, ProcId};

/// What a call expression invokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Looked up by name at run time on the receiver's type.
    InstanceProcByName { name: String, receiver: ProcReceiver },
    /// A single statically known global proc.
    GlobalProcById(ProcId),
    /// The currently executing object (`.`).
    SelfSlot,
    /// Whatever the current proc overrides (`..`), resolved by the runtime.
    SuperProc,
}

/// Where an instance proc call finds its receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ProcReceiver {
    /// The object the current proc runs on.
    Src = 0,
    /// A value pushed before the argument list (`a.foo()`).
    Stack = 1,
}

/// Encoded tag of a [`Reference`] operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ReferenceKind {
    InstanceProc = 0,
    GlobalProc = 1,
    SelfSlot = 2,
    SuperProc = 3,
}

impl Reference {
    /// A bare-name call on `src`.
    pub fn instance_proc(name: impl Into<String>) -> Self {
        Reference::InstanceProcByName {
            name: name.into(),
            receiver: ProcReceiver::Src,
        }
    }

    /// A call on a receiver value already pushed to the stack.
    pub fn qualified_proc(name: impl Into<String>) -> Self {
        Reference::InstanceProcByName {
            name: name.into(),
            receiver: ProcReceiver::Stack,
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        match self {
            Reference::InstanceProcByName { .. } => ReferenceKind::InstanceProc,
            Reference::GlobalProcById(_) => ReferenceKind::GlobalProc,
            Reference::SelfSlot => ReferenceKind::SelfSlot,
            Reference::SuperProc => ReferenceKind::SuperProc,
        }
    }

    /// Whether calling this reference consumes a receiver from the stack.
    pub fn takes_stack_receiver(&self) -> bool {
        matches!(
            self,
            Reference::InstanceProcByName {
                receiver: ProcReceiver::Stack,
                ..
            }
        )
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::InstanceProcByName {
                name,
                receiver: ProcReceiver::Src,
            } => write!(f, "{name}"),
            Reference::InstanceProcByName {
                name,
                receiver: ProcReceiver::Stack,
            } => write!(f, "<stack>.{name}"),
            Reference::GlobalProcById(id) => write!(f, "global {id}"),
            Reference::SelfSlot => f.write_str("."),
            Reference::SuperProc => f.write_str(".."),
        }
    }
}

/// A reference plus the safe-navigation flag of the access that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub reference: Reference,
    /// Only call when the receiver is non-null; otherwise the call
    /// expression evaluates to null.
    pub conditional: bool,
}

impl ResolvedReference {
    pub fn new(reference: Reference) -> Self {
        Self {
            reference,
            conditional: false,
        }
    }

    pub fn conditional(reference: Reference) -> Self {
        Self {
            reference,
            conditional: true,
        }
    }
}

/// Outcome of a recoverable lookup.
///
/// A lookup that fails still produces a usable placeholder so lowering can
/// continue; the diagnostic explains what was substituted.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    ResolvedWithDiagnostic(T, Diagnostic),
}

impl<T> Resolution<T> {
    pub fn value(&self) -> &T {
        match self {
            Resolution::Resolved(value) | Resolution::ResolvedWithDiagnostic(value, _) => value,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Resolution::Resolved(_) => None,
            Resolution::ResolvedWithDiagnostic(_, diagnostic) => Some(diagnostic),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => Resolution::Resolved(f(value)),
            Resolution::ResolvedWithDiagnostic(value, diagnostic) => {
                Resolution::ResolvedWithDiagnostic(f(value), diagnostic)
            }
        }
    }

    /// Hand any diagnostic to the sink and keep the value.
    pub fn report(self, diagnostics: &mut Diagnostics) -> T {
        match self {
            Resolution::Resolved(value) => value,
            Resolution::ResolvedWithDiagnostic(value, diagnostic) => {
                diagnostics.report(diagnostic);
                value
            }
        }
    }
}
