//! Argument-shape linting for matrix calls.
//!
//! `matrix()` and `new /matrix()` accept several argument layouts. Some of
//! them compile but can never succeed at run time; this linter flags those
//! from the argument count and, where the last argument is a constant, from
//! the operation it selects. It inspects the call only and never changes what
//! is emitted.

use num_enum::TryFromPrimitive;
use tracing::trace;

use dmc_ast::Argument;
use dmc_core::{Diagnostic, DiagnosticKind, ProcId, Span, TypeId};
use dmc_registry::ObjectTree;

use super::constant;

/// Path of the built-in matrix type.
pub const MATRIX_TYPE: &str = "/matrix";
/// Constructor proc of [`MATRIX_TYPE`].
pub const MATRIX_CONSTRUCTOR: &str = "New";
/// Global proc building a matrix.
pub const MATRIX_GLOBAL_PROC: &str = "matrix";
/// Flag bit asking the operation to modify the source matrix in place.
pub const MATRIX_MODIFY: i32 = 128;

/// Operations selectable by the last argument of a matrix call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MatrixOpcode {
    Copy = 0,
    Multiply = 1,
    Add = 2,
    Subtract = 3,
    Invert = 4,
    Rotate = 5,
    Scale = 6,
    Translate = 7,
    Interpolate = 8,
}

impl MatrixOpcode {
    /// Decode an operation argument, ignoring [`MATRIX_MODIFY`].
    pub fn from_argument(value: f32) -> Option<Self> {
        let op = (value as i32) & !MATRIX_MODIFY;
        u8::try_from(op)
            .ok()
            .and_then(|op| Self::try_from_primitive(op).ok())
    }
}

/// Whether `proc`, resolved against `owner`, is one of the matrix builders.
pub fn is_matrix_callee(tree: &ObjectTree, owner: Option<TypeId>, proc: Option<ProcId>) -> bool {
    let Some(entry) = proc.and_then(|proc| tree.proc(proc).ok()) else {
        return false;
    };
    if entry.is_global() {
        return entry.name == MATRIX_GLOBAL_PROC;
    }
    if entry.name != MATRIX_CONSTRUCTOR {
        return false;
    }
    match (owner.or(entry.owner), tree.lookup(MATRIX_TYPE)) {
        (Some(owner), Some(matrix)) => tree.is_subtype_of(owner, matrix),
        _ => false,
    }
}

/// Check the argument shape of a call to `(owner, proc)`.
///
/// Returns the diagnostic to report, if any. Calls to anything other than a
/// matrix builder are never flagged.
pub fn lint_call(
    tree: &ObjectTree,
    owner: Option<TypeId>,
    proc: Option<ProcId>,
    args: &[Argument<'_>],
    span: Span,
) -> Option<Diagnostic> {
    if !is_matrix_callee(tree, owner, proc) {
        return None;
    }

    let count = args.len();
    match count {
        0 | 1 | 6 => {
            trace!(count, "matrix call has a canonical shape");
            None
        }
        2..=4 => {
            let last = args.last()?;
            let value = constant::fold(last.value).and_then(|value| value.as_number());
            let Some(value) = value else {
                trace!(count, "matrix operation is not a numeric constant");
                return None;
            };
            match MatrixOpcode::from_argument(value) {
                Some(op) => {
                    trace!(count, ?op, "matrix operation recognized");
                    None
                }
                None => Some(Diagnostic::new(
                    DiagnosticKind::SuspiciousCall,
                    last.span,
                    format!("invalid matrix operation {value}"),
                )),
            }
        }
        5 => Some(Diagnostic::new(
            DiagnosticKind::SuspiciousCall,
            span,
            "matrix called with 5 arguments always fails at run time",
        )),
        _ => Some(Diagnostic::new(
            DiagnosticKind::TooManyArguments,
            span,
            format!("matrix takes at most 6 arguments, got {count}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::testing::Fixture;
    use bumpalo::Bump;
    use dmc_ast::{AstBuilder, BinaryOp, Expr};

    fn args<'ast>(arena: &'ast Bump, values: &[&'ast Expr<'ast>]) -> &'ast [Argument<'ast>] {
        arena.alloc_slice_fill_iter(values.iter().map(|value| Argument {
            name: None,
            value,
            span: value.span(),
        }))
    }

    fn lint_global(fixture: &Fixture, args: &[Argument<'_>]) -> Option<DiagnosticKind> {
        lint_call(
            &fixture.tree,
            None,
            Some(fixture.global_matrix),
            args,
            Span::default(),
        )
        .map(|diagnostic| diagnostic.kind)
    }

    #[test]
    fn opcode_ignores_modify_bit() {
        assert_eq!(
            MatrixOpcode::from_argument(133.0),
            Some(MatrixOpcode::Rotate)
        );
        assert_eq!(MatrixOpcode::from_argument(9.0), None);
        assert_eq!(MatrixOpcode::from_argument(-1.0), None);
    }

    #[test]
    fn recognizes_matrix_builders() {
        let fixture = Fixture::new();
        let tree = &fixture.tree;
        assert!(is_matrix_callee(tree, None, Some(fixture.global_matrix)));
        assert!(is_matrix_callee(tree, None, Some(fixture.matrix_new)));
        assert!(!is_matrix_callee(tree, None, Some(fixture.mob_move)));
        assert!(!is_matrix_callee(tree, None, Some(fixture.global_broken)));
        assert!(!is_matrix_callee(tree, None, None));
    }

    #[test]
    fn canonical_shapes_are_quiet() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let one = b.number(1.0);
        for count in [0, 1, 6] {
            let values = vec![one; count];
            assert_eq!(lint_global(&fixture, args(&arena, &values)), None);
        }
    }

    #[test]
    fn five_arguments_are_suspicious() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let values = vec![b.number(1.0); 5];
        assert_eq!(
            lint_global(&fixture, args(&arena, &values)),
            Some(DiagnosticKind::SuspiciousCall)
        );
    }

    #[test]
    fn constant_operation_is_checked() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let m = b.ident("m");

        let valid = [m, b.number(2.0), b.number(5.0)];
        assert_eq!(lint_global(&fixture, args(&arena, &valid)), None);

        let scale_in_place = b.binary(b.number(6.0), BinaryOp::BitOr, b.number(128.0));
        let with_modify = [m, scale_in_place];
        assert_eq!(lint_global(&fixture, args(&arena, &with_modify)), None);

        let invalid = [m, m, b.number(2.0), b.number(42.0)];
        assert_eq!(
            lint_global(&fixture, args(&arena, &invalid)),
            Some(DiagnosticKind::SuspiciousCall)
        );
    }

    #[test]
    fn non_constant_operation_is_not_flagged() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let values = [b.ident("m"), b.ident("op")];
        assert_eq!(lint_global(&fixture, args(&arena, &values)), None);

        let string_op = [b.ident("m"), b.string("rotate")];
        assert_eq!(lint_global(&fixture, args(&arena, &string_op)), None);
    }

    #[test]
    fn more_than_six_is_too_many() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let values = vec![b.number(0.0); 7];
        assert_eq!(
            lint_global(&fixture, args(&arena, &values)),
            Some(DiagnosticKind::TooManyArguments)
        );
    }

    #[test]
    fn other_callees_are_not_linted() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let values = vec![b.number(0.0); 5];
        let result = lint_call(
            &fixture.tree,
            None,
            Some(fixture.mob_move),
            args(&arena, &values),
            Span::default(),
        );
        assert!(result.is_none());
    }
}
