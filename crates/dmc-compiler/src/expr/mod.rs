//! Expression lowering.
//!
//! The [`ExprCompiler`] lowers AST expressions to bytecode. Every expression
//! can be asked for its value ([`ExprCompiler::emit_value`]); call targets can
//! additionally be asked for a [`Reference`](crate::Reference) through
//! [`CallTarget`].
//!
//! Lowering never stops at a user error. A failed value path reports a
//! diagnostic and pushes a null placeholder, so the simulated stack keeps the
//! shape the surrounding expression expects.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = ExprCompiler::new(&mut ctx, &mut emitter);
//! compiler.emit_value(&expr)?;
//! ```

mod calls;
pub mod constant;
mod identifiers;
pub mod lint;
mod targets;

pub use targets::CallTarget;

use dmc_ast::{BinaryOp, Expr, LiteralKind, UnaryOp};
use dmc_core::{DiagnosticKind, InternalError, Span, TypeId};

use crate::bytecode::OpCode;
use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;

use self::constant::ConstValue;

type Result<T> = std::result::Result<T, InternalError>;

/// Lowers expressions of one proc body.
pub struct ExprCompiler<'a, 'ctx> {
    /// Compilation context with the object tree, locals and diagnostics
    ctx: &'a mut CompilationContext<'ctx>,
    /// Bytecode emitter
    emitter: &'a mut BytecodeEmitter,
}

impl<'a, 'ctx> ExprCompiler<'a, 'ctx> {
    pub fn new(ctx: &'a mut CompilationContext<'ctx>, emitter: &'a mut BytecodeEmitter) -> Self {
        Self { ctx, emitter }
    }

    /// Lower `expr` so that it leaves exactly one value on the stack.
    pub fn emit_value(&mut self, expr: &Expr<'_>) -> Result<()> {
        self.emitter.set_line(expr.span().line);
        match expr {
            Expr::Literal(literal) => match literal.kind {
                LiteralKind::Number(n) => self.emitter.emit_number(n),
                LiteralKind::String(s) => self.emitter.emit_string(s),
                LiteralKind::Null => {
                    self.emitter.emit_null();
                    Ok(())
                }
            },
            Expr::Ident(ident) => identifiers::emit_ident(self, ident),
            Expr::GlobalIdent(_) | Expr::SelfRef(_) | Expr::SuperRef(_) => {
                match CallTarget::from_expr(expr) {
                    Some(target) => target.emit_value(self),
                    None => self.emit_placeholder(),
                }
            }
            Expr::Deref(deref) => {
                self.emit_value(deref.receiver)?;
                if deref.safe {
                    let skip = self.emitter.allocate_label();
                    self.emitter.emit_conditional_skip(skip)?;
                    self.emitter.emit_dereference_field(deref.member.name)?;
                    self.emitter.emit_label(skip)
                } else {
                    self.emitter.emit_dereference_field(deref.member.name)
                }
            }
            Expr::Call(call) => calls::compile_call(self, call),
            Expr::Paren(paren) => self.emit_value(paren.expr),
            Expr::Unary(unary) => match constant::fold(expr) {
                Some(value) => self.emit_const(&value),
                None => {
                    self.emit_value(unary.operand)?;
                    self.emitter.emit(unary_opcode(unary.op))
                }
            },
            Expr::Binary(binary) => match constant::fold(expr) {
                Some(value) => self.emit_const(&value),
                None => {
                    self.emit_value(binary.left)?;
                    self.emit_value(binary.right)?;
                    self.emitter.emit(binary_opcode(binary.op))
                }
            },
        }
    }

    /// Push a folded constant.
    pub fn emit_const(&mut self, value: &ConstValue) -> Result<()> {
        match value.to_constant() {
            Some(constant) => self.emitter.emit_constant(constant),
            None => {
                self.emitter.emit_null();
                Ok(())
            }
        }
    }

    /// The type an expression is statically known to have, if any.
    ///
    /// Only typed locals and `src` carry a type; everything else is dynamic.
    pub fn static_type(&self, expr: &Expr<'_>) -> Option<TypeId> {
        match expr.unparenthesized() {
            Expr::Ident(ident) => match self.ctx.locals().get(ident.name) {
                Some(local) => local.ty,
                None if ident.name == "src" => self.ctx.owner_type(),
                None => None,
            },
            _ => None,
        }
    }

    /// Report `kind` and push the null placeholder that stands in for the
    /// value that could not be produced.
    pub(crate) fn fail_value(
        &mut self,
        kind: DiagnosticKind,
        span: Span,
        message: impl Into<String>,
    ) -> Result<()> {
        self.ctx.report(kind, span, message);
        self.emit_placeholder()
    }

    fn emit_placeholder(&mut self) -> Result<()> {
        self.emitter.emit_null();
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn ctx(&self) -> &CompilationContext<'ctx> {
        self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut CompilationContext<'ctx> {
        self.ctx
    }

    pub fn emitter(&mut self) -> &mut BytecodeEmitter {
        self.emitter
    }
}

fn unary_opcode(op: UnaryOp) -> OpCode {
    match op {
        UnaryOp::Neg => OpCode::Negate,
        UnaryOp::BitNot => OpCode::BitNot,
        UnaryOp::Not => OpCode::Not,
    }
}

fn binary_opcode(op: BinaryOp) -> OpCode {
    match op {
        BinaryOp::Add => OpCode::Add,
        BinaryOp::Sub => OpCode::Subtract,
        BinaryOp::Mul => OpCode::Multiply,
        BinaryOp::Div => OpCode::Divide,
        BinaryOp::Mod => OpCode::Modulus,
        BinaryOp::BitAnd => OpCode::BitAnd,
        BinaryOp::BitOr => OpCode::BitOr,
        BinaryOp::BitXor => OpCode::BitXor,
        BinaryOp::Shl => OpCode::BitShiftLeft,
        BinaryOp::Shr => OpCode::BitShiftRight,
    }
}
