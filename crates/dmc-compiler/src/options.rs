//! Compiler configuration.

use dmc_core::{ConfigError, DiagnosticKind, DiagnosticLevels, Severity};

/// Knobs that change what lowering reports.
///
/// Only the argument cap affects emitted code: arguments past it are reported
/// and dropped.
///
/// ```
/// use dmc_compiler::CompilerOptions;
/// use dmc_core::{DiagnosticKind, Severity};
///
/// let options = CompilerOptions::default()
///     .with_pragma("SuspiciousCall error")
///     .unwrap()
///     .with_matrix_lint(false);
/// assert_eq!(
///     options.diagnostic_levels.severity_of(DiagnosticKind::SuspiciousCall),
///     Severity::Error
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Per-kind severity overrides.
    pub diagnostic_levels: DiagnosticLevels,
    /// Run the argument-shape linter on matrix calls.
    pub lint_matrix_calls: bool,
    /// Report calls to procs flagged as unimplemented.
    pub report_unimplemented: bool,
    /// Most arguments a single call may pass, never above 255.
    max_arguments: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            diagnostic_levels: DiagnosticLevels::default(),
            lint_matrix_calls: true,
            report_unimplemented: true,
            max_arguments: u8::MAX as usize,
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `"<kind> <severity>"` pragma.
    pub fn with_pragma(mut self, pragma: &str) -> Result<Self, ConfigError> {
        self.diagnostic_levels.apply_pragma(pragma)?;
        Ok(self)
    }

    pub fn with_severity(
        mut self,
        kind: DiagnosticKind,
        severity: Severity,
    ) -> Result<Self, ConfigError> {
        self.diagnostic_levels.set(kind, severity)?;
        Ok(self)
    }

    pub fn with_matrix_lint(mut self, enabled: bool) -> Self {
        self.lint_matrix_calls = enabled;
        self
    }

    pub fn with_unimplemented_reports(mut self, enabled: bool) -> Self {
        self.report_unimplemented = enabled;
        self
    }

    /// Most arguments a single call may pass.
    pub fn max_arguments(&self) -> usize {
        self.max_arguments
    }

    /// Cap the argument count; values above the encodable 255 are clamped.
    pub fn with_max_arguments(mut self, max: usize) -> Self {
        self.max_arguments = max.min(u8::MAX as usize);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = CompilerOptions::default();
        assert!(options.lint_matrix_calls);
        assert!(options.report_unimplemented);
        assert_eq!(options.max_arguments(), 255);
    }

    #[test]
    fn hard_errors_cannot_be_downgraded() {
        let result = CompilerOptions::default().with_pragma("TooManyArguments warning");
        assert!(matches!(result, Err(ConfigError::CannotDowngrade { .. })));
    }

    #[test]
    fn max_arguments_is_clamped() {
        assert_eq!(
            CompilerOptions::default()
                .with_max_arguments(1000)
                .max_arguments(),
            255
        );
    }
}
