//! Call targets.
//!
//! A call target is the callee of a call expression. Each target kind can be
//! evaluated as a value (which is mostly an error, procs are not values) or as
//! a [`Reference`] telling the emitter what to call.

use dmc_ast::{DerefExpr, Expr, Ident};
use dmc_core::{Diagnostic, DiagnosticKind, InternalError, ProcId, Span, TypeId};

use crate::context::CompilationContext;
use crate::reference::{Reference, Resolution, ResolvedReference};

use super::ExprCompiler;

type Result<T> = std::result::Result<T, InternalError>;

/// The callee of a call expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallTarget<'ast> {
    /// `name()`: an instance proc of `src`, falling back to a global proc.
    InstanceProc(Ident<'ast>),
    /// `global.name()`
    GlobalProc(Ident<'ast>),
    /// `.()`
    SelfRef(Span),
    /// `..()`
    SuperRef(Span),
    /// `receiver.name()` or `receiver?.name()`
    Qualified(&'ast DerefExpr<'ast>),
}

impl<'ast> CallTarget<'ast> {
    /// Classify a callee expression; `None` if it cannot be called.
    pub fn from_expr(expr: &Expr<'ast>) -> Option<Self> {
        match *expr.unparenthesized() {
            Expr::Ident(ident) => Some(CallTarget::InstanceProc(ident)),
            Expr::GlobalIdent(ident) => Some(CallTarget::GlobalProc(ident)),
            Expr::SelfRef(span) => Some(CallTarget::SelfRef(span)),
            Expr::SuperRef(span) => Some(CallTarget::SuperRef(span)),
            Expr::Deref(deref) => Some(CallTarget::Qualified(deref)),
            _ => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            CallTarget::InstanceProc(ident) | CallTarget::GlobalProc(ident) => ident.span,
            CallTarget::SelfRef(span) | CallTarget::SuperRef(span) => *span,
            CallTarget::Qualified(deref) => deref.span,
        }
    }

    /// Whether this is `..`.
    pub fn is_super(&self) -> bool {
        matches!(self, CallTarget::SuperRef(_))
    }

    /// Evaluate the target as a value.
    pub fn emit_value(&self, compiler: &mut ExprCompiler<'_, '_>) -> Result<()> {
        match self {
            CallTarget::InstanceProc(ident) => compiler.fail_value(
                DiagnosticKind::ProcUsedAsValue,
                ident.span,
                format!("attempt to use proc '{}' as value", ident.name),
            ),
            CallTarget::GlobalProc(ident) => compiler.fail_value(
                DiagnosticKind::InvalidProcReference,
                ident.span,
                format!("attempt to use global proc '{}' as value", ident.name),
            ),
            CallTarget::SelfRef(_) => {
                compiler.emitter().emit_push_self();
                Ok(())
            }
            CallTarget::SuperRef(span) => compiler.fail_value(
                DiagnosticKind::InvalidProcReference,
                *span,
                "attempt to use '..' as value",
            ),
            CallTarget::Qualified(deref) => compiler.emit_value(&Expr::Deref(*deref)),
        }
    }

    /// Resolve the target to the reference a `Call` is emitted against.
    ///
    /// A qualified target pushes its receiver first. Lookups that fail still
    /// produce a placeholder reference so the call is emitted.
    pub fn emit_reference(
        &self,
        compiler: &mut ExprCompiler<'_, '_>,
    ) -> Result<Resolution<ResolvedReference>> {
        let resolution = match self {
            CallTarget::InstanceProc(ident) => resolve_instance_proc(compiler.ctx(), ident),
            CallTarget::GlobalProc(ident) => resolve_global_proc(compiler.ctx(), ident),
            CallTarget::SelfRef(_) => Resolution::Resolved(Reference::SelfSlot),
            CallTarget::SuperRef(span) => {
                if compiler.ctx().current_proc().is_override() {
                    Resolution::Resolved(Reference::SuperProc)
                } else {
                    Resolution::ResolvedWithDiagnostic(
                        Reference::SuperProc,
                        Diagnostic::new(
                            DiagnosticKind::PointlessParentCall,
                            *span,
                            format!(
                                "proc '{}' overrides nothing, '..()' does nothing",
                                compiler.ctx().current_proc().name
                            ),
                        ),
                    )
                }
            }
            CallTarget::Qualified(deref) => {
                compiler.emit_value(deref.receiver)?;
                let reference = ResolvedReference {
                    reference: Reference::qualified_proc(deref.member.name),
                    conditional: deref.safe,
                };
                return Ok(check_receiver_type(compiler, deref, reference));
            }
        };
        Ok(resolution.map(ResolvedReference::new))
    }

    /// Best-effort `(owner type, proc)` this target statically denotes.
    ///
    /// Only used for linting; addressing never depends on it.
    pub fn static_resolution(
        &self,
        compiler: &ExprCompiler<'_, '_>,
    ) -> (Option<TypeId>, Option<ProcId>) {
        let ctx = compiler.ctx();
        match self {
            CallTarget::InstanceProc(ident) => match ctx.lookup_instance_proc(ident.name) {
                Some(proc) => (ctx.owner_type(), Some(proc)),
                None => (None, ctx.lookup_global_proc(ident.name)),
            },
            CallTarget::GlobalProc(ident) => (None, ctx.lookup_global_proc(ident.name)),
            CallTarget::Qualified(deref) => match compiler.static_type(deref.receiver) {
                Some(ty) => (Some(ty), ctx.tree().try_get_procedure(ty, deref.member.name)),
                None => (None, None),
            },
            CallTarget::SelfRef(_) | CallTarget::SuperRef(_) => (None, None),
        }
    }
}

fn resolve_instance_proc(
    ctx: &CompilationContext<'_>,
    ident: &Ident<'_>,
) -> Resolution<Reference> {
    let name = ident.name;
    if ctx.lookup_instance_proc(name).is_some() {
        return Resolution::Resolved(Reference::instance_proc(name));
    }
    if let Some(proc) = ctx.lookup_global_proc(name) {
        return Resolution::Resolved(Reference::GlobalProcById(proc));
    }
    Resolution::ResolvedWithDiagnostic(
        Reference::instance_proc(name),
        Diagnostic::new(
            DiagnosticKind::UnknownProcedure,
            ident.span,
            format!("undefined proc: '{name}'"),
        ),
    )
}

fn resolve_global_proc(
    ctx: &CompilationContext<'_>,
    ident: &Ident<'_>,
) -> Resolution<Reference> {
    let name = ident.name;
    match ctx.lookup_global_proc(name) {
        Some(proc) => Resolution::Resolved(Reference::GlobalProcById(proc)),
        None => Resolution::ResolvedWithDiagnostic(
            Reference::GlobalProcById(ctx.tree().global_init_proc()),
            Diagnostic::new(
                DiagnosticKind::UnknownGlobalProcedure,
                ident.span,
                format!("undefined global proc: '{name}'"),
            ),
        ),
    }
}

/// Warn when the receiver's static type is known and has no such proc.
fn check_receiver_type(
    compiler: &ExprCompiler<'_, '_>,
    deref: &DerefExpr<'_>,
    reference: ResolvedReference,
) -> Resolution<ResolvedReference> {
    let Some(ty) = compiler.static_type(deref.receiver) else {
        return Resolution::Resolved(reference);
    };
    let tree = compiler.ctx().tree();
    if tree.has_procedure(ty, deref.member.name) {
        return Resolution::Resolved(reference);
    }
    let path = tree
        .ty(ty)
        .map(|record| record.path().to_string())
        .unwrap_or_default();
    Resolution::ResolvedWithDiagnostic(
        reference,
        Diagnostic::new(
            DiagnosticKind::UnknownProcedure,
            deref.member.span,
            format!("undefined proc: '{}' on {path}", deref.member.name),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::testing::Fixture;
    use crate::reference::ProcReceiver;
    use crate::CompilerOptions;
    use bumpalo::Bump;
    use dmc_ast::AstBuilder;

    fn resolve(
        fixture: &Fixture,
        proc: ProcId,
        callee: &Expr<'_>,
    ) -> (ResolvedReference, Vec<DiagnosticKind>) {
        let target = CallTarget::from_expr(callee).unwrap();
        let mut result = None;
        let lowered = fixture.lower(proc, &CompilerOptions::default(), |c| {
            let resolution = target.emit_reference(c).unwrap();
            result = Some(resolution.report(c.ctx_mut().diagnostics_mut()));
        });
        let kinds = lowered.diagnostics.iter().map(|d| d.kind).collect();
        (result.unwrap(), kinds)
    }

    #[test]
    fn classifies_callees() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        assert!(matches!(
            CallTarget::from_expr(b.paren(b.ident("f"))),
            Some(CallTarget::InstanceProc(_))
        ));
        assert!(CallTarget::from_expr(b.super_ref()).unwrap().is_super());
        assert_eq!(CallTarget::from_expr(b.number(1.0)), None);
    }

    #[test]
    fn inherited_instance_proc() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (resolved, kinds) = resolve(&fixture, fixture.player_login, b.ident("Move"));
        assert_eq!(resolved, ResolvedReference::new(Reference::instance_proc("Move")));
        assert!(kinds.is_empty());
    }

    #[test]
    fn bare_name_falls_back_to_global() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (resolved, kinds) = resolve(&fixture, fixture.player_login, b.ident("matrix"));
        assert_eq!(resolved.reference, Reference::GlobalProcById(fixture.global_matrix));
        assert!(kinds.is_empty());
    }

    #[test]
    fn unknown_instance_proc_keeps_name() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (resolved, kinds) = resolve(&fixture, fixture.player_login, b.ident("Fly"));
        assert_eq!(resolved.reference, Reference::instance_proc("Fly"));
        assert_eq!(kinds, vec![DiagnosticKind::UnknownProcedure]);
    }

    #[test]
    fn sibling_procs_are_not_visible() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (_, kinds) = resolve(&fixture, fixture.player_login, b.ident("Roar"));
        assert_eq!(kinds, vec![DiagnosticKind::UnknownProcedure]);
    }

    #[test]
    fn unknown_global_proc_uses_global_init() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (resolved, kinds) = resolve(&fixture, fixture.player_login, b.global("nope"));
        assert_eq!(
            resolved.reference,
            Reference::GlobalProcById(fixture.tree.global_init_proc())
        );
        assert_eq!(kinds, vec![DiagnosticKind::UnknownGlobalProcedure]);
    }

    #[test]
    fn super_in_override_is_quiet() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (resolved, kinds) = resolve(&fixture, fixture.player_move, b.super_ref());
        assert_eq!(resolved.reference, Reference::SuperProc);
        assert!(kinds.is_empty());
    }

    #[test]
    fn super_outside_override_is_pointless() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (resolved, kinds) = resolve(&fixture, fixture.player_login, b.super_ref());
        assert_eq!(resolved.reference, Reference::SuperProc);
        assert_eq!(kinds, vec![DiagnosticKind::PointlessParentCall]);
    }

    #[test]
    fn qualified_target_is_conditional_when_safe() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let callee = b.safe_deref(b.ident("target"), "Move");
        let target = CallTarget::from_expr(callee).unwrap();

        let mut resolved = None;
        let lowered = fixture.lower(fixture.player_login, &CompilerOptions::default(), |c| {
            c.ctx_mut().locals_mut().declare("target", None).unwrap();
            resolved = Some(target.emit_reference(c).unwrap());
        });
        let resolved = resolved.unwrap();
        assert!(resolved.diagnostic().is_none());
        assert!(resolved.value().conditional);
        assert!(matches!(
            resolved.value().reference,
            Reference::InstanceProcByName {
                receiver: ProcReceiver::Stack,
                ..
            }
        ));
        assert_eq!(lowered.depth, 1);
    }

    #[test]
    fn typed_receiver_is_checked() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let callee = b.deref(b.ident("M"), "Login");
        let target = CallTarget::from_expr(callee).unwrap();
        let monster = fixture.tree.lookup("/mob/monster");

        let mut kind = None;
        fixture.lower(fixture.player_login, &CompilerOptions::default(), |c| {
            c.ctx_mut().locals_mut().declare("M", monster).unwrap();
            assert_eq!(target.static_resolution(c), (monster, None));
            let resolution = target.emit_reference(c).unwrap();
            kind = resolution.diagnostic().map(|d| d.kind);
        });
        assert_eq!(kind, Some(DiagnosticKind::UnknownProcedure));
    }

    #[test]
    fn static_resolution_of_bare_names() {
        let fixture = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let player = fixture.tree.lookup("/mob/player");
        let local = CallTarget::from_expr(b.ident("Move")).unwrap();
        let global = CallTarget::from_expr(b.ident("matrix")).unwrap();
        let missing = CallTarget::from_expr(b.ident("Fly")).unwrap();

        fixture.lower(fixture.player_login, &CompilerOptions::default(), |c| {
            assert_eq!(
                local.static_resolution(c),
                (player, Some(fixture.player_move))
            );
            assert_eq!(
                global.static_resolution(c),
                (None, Some(fixture.global_matrix))
            );
            assert_eq!(missing.static_resolution(c), (None, None));
        });
    }
}
