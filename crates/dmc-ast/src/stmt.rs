//! Statements of a proc body.
//!
//! Only the forms the expression lowering needs to be driven are modelled.

use dmc_core::Span;

use crate::{Expr, Ident};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// An expression evaluated for its side effects.
    Expr(&'ast Expr<'ast>),
    /// `var/<type>/name = init`
    Var(&'ast VarDecl<'ast>),
    /// `return` or `return value`
    Return(ReturnStmt<'ast>),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(expr) => expr.span(),
            Stmt::Var(decl) => decl.span,
            Stmt::Return(ret) => ret.span,
        }
    }
}

/// A local variable declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'ast> {
    pub name: Ident<'ast>,
    /// Declared type path text, e.g. `/obj/item` for `var/obj/item/I`.
    pub type_path: Option<&'ast str>,
    pub init: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}
