//! Arena-backed node constructors.

use bumpalo::Bump;
use dmc_core::Span;

use crate::{
    Argument, BinaryExpr, BinaryOp, CallExpr, DerefExpr, Expr, Ident, LiteralExpr, LiteralKind,
    ParenExpr, ReturnStmt, Stmt, UnaryExpr, UnaryOp, VarDecl,
};

/// Allocates nodes into an arena, stamping each with the current span.
///
/// ```
/// use bumpalo::Bump;
/// use dmc_ast::{AstBuilder, Expr};
///
/// let arena = Bump::new();
/// let b = AstBuilder::new(&arena);
/// let call = b.call(b.ident("Move"), &[b.number(1.0)]);
/// assert!(matches!(call, Expr::Call(c) if c.args.len() == 1));
/// ```
#[derive(Clone, Copy)]
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    span: Span,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            span: Span::default(),
        }
    }

    /// A builder whose nodes are placed at `line:col`.
    pub fn at(self, line: u32, col: u32) -> Self {
        Self {
            span: Span::new(line, col, 1),
            ..self
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    fn alloc(&self, expr: Expr<'ast>) -> &'ast Expr<'ast> {
        self.arena.alloc(expr)
    }

    fn name(&self, name: &str) -> Ident<'ast> {
        Ident::new(self.arena.alloc_str(name), self.span)
    }

    pub fn number(&self, value: f32) -> &'ast Expr<'ast> {
        self.literal(LiteralKind::Number(value))
    }

    pub fn string(&self, value: &str) -> &'ast Expr<'ast> {
        let value = self.arena.alloc_str(value);
        self.literal(LiteralKind::String(value))
    }

    pub fn null(&self) -> &'ast Expr<'ast> {
        self.literal(LiteralKind::Null)
    }

    fn literal(&self, kind: LiteralKind<'ast>) -> &'ast Expr<'ast> {
        self.alloc(Expr::Literal(LiteralExpr {
            kind,
            span: self.span,
        }))
    }

    pub fn ident(&self, name: &str) -> &'ast Expr<'ast> {
        self.alloc(Expr::Ident(self.name(name)))
    }

    pub fn global(&self, name: &str) -> &'ast Expr<'ast> {
        self.alloc(Expr::GlobalIdent(self.name(name)))
    }

    pub fn self_ref(&self) -> &'ast Expr<'ast> {
        self.alloc(Expr::SelfRef(self.span))
    }

    pub fn super_ref(&self) -> &'ast Expr<'ast> {
        self.alloc(Expr::SuperRef(self.span))
    }

    pub fn deref(&self, receiver: &'ast Expr<'ast>, member: &str) -> &'ast Expr<'ast> {
        self.deref_with(receiver, member, false)
    }

    /// `receiver?.member`
    pub fn safe_deref(&self, receiver: &'ast Expr<'ast>, member: &str) -> &'ast Expr<'ast> {
        self.deref_with(receiver, member, true)
    }

    fn deref_with(&self, receiver: &'ast Expr<'ast>, member: &str, safe: bool) -> &'ast Expr<'ast> {
        let member = self.name(member);
        self.alloc(Expr::Deref(self.arena.alloc(DerefExpr {
            receiver,
            member,
            safe,
            span: self.span,
        })))
    }

    /// A call with positional arguments only.
    pub fn call(&self, callee: &'ast Expr<'ast>, args: &[&'ast Expr<'ast>]) -> &'ast Expr<'ast> {
        let args = self
            .arena
            .alloc_slice_fill_iter(args.iter().map(|value| Argument {
                name: None,
                value,
                span: value.span(),
            }));
        self.call_with(callee, args)
    }

    /// A call whose arguments may be named.
    pub fn call_named(
        &self,
        callee: &'ast Expr<'ast>,
        args: &[(Option<&str>, &'ast Expr<'ast>)],
    ) -> &'ast Expr<'ast> {
        let args = self
            .arena
            .alloc_slice_fill_iter(args.iter().map(|(name, value)| Argument {
                name: name.map(|n| self.name(n)),
                value,
                span: value.span(),
            }));
        self.call_with(callee, args)
    }

    fn call_with(
        &self,
        callee: &'ast Expr<'ast>,
        args: &'ast [Argument<'ast>],
    ) -> &'ast Expr<'ast> {
        self.alloc(Expr::Call(self.arena.alloc(CallExpr {
            callee,
            args,
            span: self.span,
        })))
    }

    pub fn unary(&self, op: UnaryOp, operand: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.alloc(Expr::Unary(self.arena.alloc(UnaryExpr {
            op,
            operand,
            span: self.span,
        })))
    }

    pub fn binary(
        &self,
        left: &'ast Expr<'ast>,
        op: BinaryOp,
        right: &'ast Expr<'ast>,
    ) -> &'ast Expr<'ast> {
        self.alloc(Expr::Binary(self.arena.alloc(BinaryExpr {
            left,
            op,
            right,
            span: self.span,
        })))
    }

    pub fn paren(&self, expr: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.alloc(Expr::Paren(self.arena.alloc(ParenExpr {
            expr,
            span: self.span,
        })))
    }

    pub fn expr_stmt(&self, expr: &'ast Expr<'ast>) -> Stmt<'ast> {
        Stmt::Expr(expr)
    }

    pub fn var(
        &self,
        name: &str,
        type_path: Option<&str>,
        init: Option<&'ast Expr<'ast>>,
    ) -> Stmt<'ast> {
        let name = self.name(name);
        let type_path = type_path.map(|p| &*self.arena.alloc_str(p));
        Stmt::Var(self.arena.alloc(VarDecl {
            name,
            type_path,
            init,
            span: self.span,
        }))
    }

    pub fn ret(&self, value: Option<&'ast Expr<'ast>>) -> Stmt<'ast> {
        Stmt::Return(ReturnStmt {
            value,
            span: self.span,
        })
    }
}
