//! Expression nodes.
//!
//! Call targets get distinct node kinds because the parser already knows the
//! syntactic form: a bare name (`foo()`), a `global.` name (`global.foo()`),
//! the self reference (`.()`), the super reference (`..()`), or a qualified
//! access (`a.foo()` / `a?.foo()`). Whether a bare name denotes a proc or a
//! variable is decided later by the compiler.

use dmc_core::Span;

use crate::{BinaryOp, UnaryOp};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(LiteralExpr<'ast>),
    /// Bare identifier
    Ident(Ident<'ast>),
    /// `global.name`
    GlobalIdent(Ident<'ast>),
    /// `.`
    SelfRef(Span),
    /// `..`
    SuperRef(Span),
    /// `receiver.member` or `receiver?.member`
    Deref(&'ast DerefExpr<'ast>),
    /// Call
    Call(&'ast CallExpr<'ast>),
    /// Prefix operation
    Unary(&'ast UnaryExpr<'ast>),
    /// Binary operation
    Binary(&'ast BinaryExpr<'ast>),
    /// Parenthesized expression
    Paren(&'ast ParenExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) | Self::GlobalIdent(e) => e.span,
            Self::SelfRef(span) | Self::SuperRef(span) => *span,
            Self::Deref(e) => e.span,
            Self::Call(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Paren(e) => e.span,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expr<'ast> {
        let mut expr = self;
        while let Expr::Paren(paren) = expr {
            expr = paren.expr;
        }
        expr
    }
}

/// An identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub span: Span,
}

/// The kind of literal. All numbers in the language are single precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    Number(f32),
    String(&'ast str),
    Null,
}

/// Member access through a receiver expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerefExpr<'ast> {
    pub receiver: &'ast Expr<'ast>,
    pub member: Ident<'ast>,
    /// `?.`: skip the access when the receiver is null.
    pub safe: bool,
    pub span: Span,
}

/// A call: `callee(args)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: &'ast Expr<'ast>,
    pub args: &'ast [Argument<'ast>],
    pub span: Span,
}

/// A call argument, optionally named (`name = value`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Argument<'ast> {
    pub name: Option<Ident<'ast>>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}
