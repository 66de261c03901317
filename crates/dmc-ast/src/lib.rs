//! Syntax nodes handed to the compiler by the parser.
//!
//! Nodes borrow from a [`bumpalo::Bump`] arena for the `'ast` lifetime, the
//! same way the parser allocates them. [`AstBuilder`] wraps an arena with
//! constructors for code that synthesizes nodes (tests, desugaring).

mod builder;
mod expr;
mod ops;
mod stmt;

pub use builder::AstBuilder;
pub use expr::{
    Argument, BinaryExpr, CallExpr, DerefExpr, Expr, Ident, LiteralExpr, LiteralKind, ParenExpr,
    UnaryExpr,
};
pub use ops::{BinaryOp, UnaryOp};
pub use stmt::{ReturnStmt, Stmt, VarDecl};
