//! Call compilation.
//!
//! Lowering a call:
//! 1. statically resolve the callee for linting
//! 2. run the argument-shape linter and the unimplemented check
//! 3. resolve the target to a reference (a qualified target pushes its
//!    receiver here)
//! 4. push the arguments and emit `Call`, behind a null check when the
//!    target was reached through `?.`
//!
//! `..()` with no arguments forwards the caller's own arguments.

use tracing::trace;

use dmc_ast::{Argument, CallExpr};
use dmc_core::{DiagnosticKind, InternalError};

use super::lint;
use super::{CallTarget, ExprCompiler};

type Result<T> = std::result::Result<T, InternalError>;

/// Compile a call expression, leaving its result on the stack.
pub fn compile_call(compiler: &mut ExprCompiler<'_, '_>, call: &CallExpr<'_>) -> Result<()> {
    let Some(target) = CallTarget::from_expr(call.callee) else {
        return compiler.fail_value(
            DiagnosticKind::InvalidCallTarget,
            call.callee.span(),
            "expression cannot be called",
        );
    };

    let options = compiler.ctx().options();
    let (owner, proc) = target.static_resolution(compiler);

    if options.lint_matrix_calls
        && let Some(diagnostic) =
            lint::lint_call(compiler.ctx().tree(), owner, proc, call.args, call.span)
    {
        compiler.ctx_mut().diagnostics_mut().report(diagnostic);
    }

    let max_arguments = options.max_arguments();
    let mut args = call.args;
    if args.len() > max_arguments {
        compiler.ctx_mut().report(
            DiagnosticKind::TooManyArguments,
            call.span,
            format!(
                "call passes {} arguments, at most {max_arguments} are allowed",
                args.len()
            ),
        );
        args = &args[..max_arguments];
    }
    // Forwarding depends on the written argument list, not the capped one.
    let forward = target.is_super() && call.args.is_empty();

    if options.report_unimplemented
        && let Some(proc) = proc
    {
        let entry = compiler.ctx().proc_entry(proc)?;
        if entry.is_unimplemented() {
            let message = format!("{} is not implemented", entry.name);
            compiler.ctx_mut().report(DiagnosticKind::UnimplementedFeature, call.span, message);
        }
    }

    let resolved = target
        .emit_reference(compiler)?
        .report(compiler.ctx_mut().diagnostics_mut());
    trace!(
        reference = %resolved.reference,
        conditional = resolved.conditional,
        args = args.len(),
        "call resolved"
    );

    compiler.emitter().set_line(call.span.line);
    if resolved.conditional {
        let skip = compiler.emitter().allocate_label();
        compiler.emitter().emit_conditional_skip(skip)?;
        push_arguments(compiler, forward, args)?;
        compiler.emitter().emit_call(&resolved.reference)?;
        compiler.emitter().emit_label(skip)
    } else {
        push_arguments(compiler, forward, args)?;
        compiler.emitter().emit_call(&resolved.reference)
    }
}

/// Push `args`, or the caller's own arguments when `forward` is set.
fn push_arguments(
    compiler: &mut ExprCompiler<'_, '_>,
    forward: bool,
    args: &[Argument<'_>],
) -> Result<()> {
    if forward {
        compiler.emitter().push_caller_arguments();
        return Ok(());
    }

    for arg in args {
        compiler.emit_value(arg.value)?;
    }
    let names: Vec<Option<&str>> = args
        .iter()
        .map(|arg| arg.name.map(|name| name.name))
        .collect();
    compiler.emitter().push_arguments(&names)
}
