//! Compile-time diagnostics and the sink that accumulates them.
//!
//! Diagnostics never unwind. Lowering reports a problem, substitutes a
//! placeholder where needed and keeps going, so a single pass finds as many
//! problems as possible. The sink decides what to keep; formatting and exit
//! codes are the caller's concern.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use crate::{ConfigError, Span};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Dropped by the sink.
    Disabled,
    /// Informational.
    Notice,
    /// Compilation still succeeds.
    Warning,
    /// Compilation fails, but lowering continues to find further problems.
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Disabled => "disabled",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "notice" => Ok(Severity::Notice),
            "disabled" => Ok(Severity::Disabled),
            _ => Err(ConfigError::UnknownSeverity(s.to_string())),
        }
    }
}

/// The closed taxonomy of user-facing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// A procedure reference was used where a value is required.
    ProcUsedAsValue,
    /// `..` or a `global.` proc name was used as a value.
    InvalidProcReference,
    /// A bare proc name resolves neither on the type nor globally.
    UnknownProcedure,
    /// A `global.` proc name is not in the global procedure table.
    UnknownGlobalProcedure,
    /// `..()` in a proc that does not override anything.
    PointlessParentCall,
    /// The callee is flagged as unimplemented.
    UnimplementedFeature,
    /// Argument shape that compiles but is known to misbehave.
    SuspiciousCall,
    /// More arguments than the callee or the encoding allows.
    TooManyArguments,
    /// A bare name used as a value resolves to nothing.
    UnknownIdentifier,
    /// A non-callable expression was used as a call target.
    InvalidCallTarget,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 10] = [
        DiagnosticKind::ProcUsedAsValue,
        DiagnosticKind::InvalidProcReference,
        DiagnosticKind::UnknownProcedure,
        DiagnosticKind::UnknownGlobalProcedure,
        DiagnosticKind::PointlessParentCall,
        DiagnosticKind::UnimplementedFeature,
        DiagnosticKind::SuspiciousCall,
        DiagnosticKind::TooManyArguments,
        DiagnosticKind::UnknownIdentifier,
        DiagnosticKind::InvalidCallTarget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::ProcUsedAsValue => "ProcUsedAsValue",
            DiagnosticKind::InvalidProcReference => "InvalidProcReference",
            DiagnosticKind::UnknownProcedure => "UnknownProcedure",
            DiagnosticKind::UnknownGlobalProcedure => "UnknownGlobalProcedure",
            DiagnosticKind::PointlessParentCall => "PointlessParentCall",
            DiagnosticKind::UnimplementedFeature => "UnimplementedFeature",
            DiagnosticKind::SuspiciousCall => "SuspiciousCall",
            DiagnosticKind::TooManyArguments => "TooManyArguments",
            DiagnosticKind::UnknownIdentifier => "UnknownIdentifier",
            DiagnosticKind::InvalidCallTarget => "InvalidCallTarget",
        }
    }

    /// The severity a diagnostic of this kind gets unless configured otherwise.
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticKind::ProcUsedAsValue
            | DiagnosticKind::InvalidProcReference
            | DiagnosticKind::TooManyArguments
            | DiagnosticKind::UnknownIdentifier
            | DiagnosticKind::InvalidCallTarget => Severity::Error,
            DiagnosticKind::UnknownProcedure
            | DiagnosticKind::UnknownGlobalProcedure
            | DiagnosticKind::PointlessParentCall
            | DiagnosticKind::UnimplementedFeature
            | DiagnosticKind::SuspiciousCall => Severity::Warning,
        }
    }

    /// Hard errors can be configured but never below [`Severity::Error`].
    pub fn is_hard_error(&self) -> bool {
        self.default_severity() == Severity::Error
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagnosticKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagnosticKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownKind(s.to_string()))
    }
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    /// A diagnostic at the kind's default severity.
    pub fn new(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            span,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {} [{}]",
            self.span, self.severity, self.message, self.kind
        )
    }
}

/// Per-kind severity overrides.
///
/// Built from configuration or DM-style pragma text such as
/// `"SuspiciousCall error"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticLevels {
    overrides: FxHashMap<DiagnosticKind, Severity>,
}

impl DiagnosticLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the severity of `kind`.
    pub fn set(&mut self, kind: DiagnosticKind, severity: Severity) -> Result<(), ConfigError> {
        if kind.is_hard_error() && severity < Severity::Error {
            return Err(ConfigError::CannotDowngrade {
                kind: kind.to_string(),
                requested: severity.to_string(),
            });
        }
        self.overrides.insert(kind, severity);
        Ok(())
    }

    /// Apply a `"<kind> <severity>"` pragma.
    pub fn apply_pragma(&mut self, pragma: &str) -> Result<(), ConfigError> {
        let mut words = pragma.split_whitespace();
        let (Some(kind), Some(severity), None) = (words.next(), words.next(), words.next()) else {
            return Err(ConfigError::MalformedPragma(pragma.to_string()));
        };
        self.set(kind.parse()?, severity.parse()?)
    }

    /// The effective severity of `kind`.
    pub fn severity_of(&self, kind: DiagnosticKind) -> Severity {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_severity())
    }
}

/// Accumulates diagnostics for one compilation (or one worker of it).
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    levels: DiagnosticLevels,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_levels(levels: DiagnosticLevels) -> Self {
        Self {
            items: Vec::new(),
            levels,
        }
    }

    /// Record a diagnostic, applying the configured severity for its kind.
    ///
    /// Diagnostics whose kind is disabled are dropped.
    pub fn report(&mut self, mut diagnostic: Diagnostic) {
        diagnostic.severity = self.levels.severity_of(diagnostic.kind);
        if diagnostic.severity == Severity::Disabled {
            return;
        }
        self.items.push(diagnostic);
    }

    /// Shorthand for [`report`](Self::report) with a fresh diagnostic.
    pub fn emit(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        self.report(Diagnostic::new(kind, span, message));
    }

    /// Append another queue and restore source order.
    ///
    /// The sort is stable, so diagnostics at the same span keep the order
    /// they were reported in.
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
        self.items.sort_by_key(|d| d.span);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.items {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}
