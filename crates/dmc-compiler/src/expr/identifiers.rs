//! Bare identifier compilation.
//!
//! A bare name used as a value resolves, in order, to:
//! - a local variable of the proc
//! - `src`, the object the proc runs on
//! - a variable declared on (or inherited by) the owner type
//!
//! A name that only resolves as a proc is [`DiagnosticKind::ProcUsedAsValue`];
//! anything else is [`DiagnosticKind::UnknownIdentifier`].

use dmc_ast::Ident;
use dmc_core::{DiagnosticKind, InternalError};

use super::ExprCompiler;

type Result<T> = std::result::Result<T, InternalError>;

/// The implicit receiver of instance procs and fields.
pub const SRC: &str = "src";

pub fn emit_ident(compiler: &mut ExprCompiler<'_, '_>, ident: &Ident<'_>) -> Result<()> {
    let name = ident.name;

    if let Some(local) = compiler.ctx().locals().get(name) {
        let slot = local.slot;
        compiler.emitter().emit_get_local(slot);
        return Ok(());
    }

    if name == SRC {
        compiler.emitter().emit_push_src();
        return Ok(());
    }

    if is_field(compiler, name)? {
        compiler.emitter().emit_push_src();
        return compiler.emitter().emit_dereference_field(name);
    }

    let ctx = compiler.ctx();
    if ctx.lookup_instance_proc(name).is_some() || ctx.lookup_global_proc(name).is_some() {
        return compiler.fail_value(
            DiagnosticKind::ProcUsedAsValue,
            ident.span,
            format!("attempt to use proc '{name}' as value"),
        );
    }

    compiler.fail_value(
        DiagnosticKind::UnknownIdentifier,
        ident.span,
        format!("unknown identifier '{name}'"),
    )
}

fn is_field(compiler: &ExprCompiler<'_, '_>, name: &str) -> Result<bool> {
    let ctx = compiler.ctx();
    match ctx.owner_type() {
        Some(owner) => Ok(ctx.tree().ty(owner)?.variable(name).is_some()),
        None => Ok(false),
    }
}
