//! Compile-time constant folding.
//!
//! Folding follows the runtime's arithmetic: numbers are single precision,
//! bitwise operators work on the 24-bit integer part of their operands, and
//! anything that would fail at run time (division by zero) is left unfolded.

use dmc_ast::{BinaryOp, Expr, LiteralKind, UnaryOp};

use crate::bytecode::Constant;

/// Bitwise results are truncated to the 24 bits a float holds exactly.
const BITWISE_MASK: i32 = 0x00FF_FFFF;

/// A value known at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Null,
    Number(f32),
    String(String),
}

impl ConstValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            ConstValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Truthiness: null, zero and the empty string are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConstValue::Null => false,
            ConstValue::Number(n) => *n != 0.0,
            ConstValue::String(s) => !s.is_empty(),
        }
    }

    /// The pool constant for this value; `None` for null, which has its own opcode.
    pub fn to_constant(&self) -> Option<Constant> {
        match self {
            ConstValue::Null => None,
            ConstValue::Number(n) => Some(Constant::number(*n)),
            ConstValue::String(s) => Some(Constant::String(s.clone())),
        }
    }
}

/// Reduce `expr` to a constant, if it is one.
pub fn fold(expr: &Expr<'_>) -> Option<ConstValue> {
    match expr {
        Expr::Literal(literal) => Some(match literal.kind {
            LiteralKind::Number(n) => ConstValue::Number(n),
            LiteralKind::String(s) => ConstValue::String(s.to_string()),
            LiteralKind::Null => ConstValue::Null,
        }),
        Expr::Paren(paren) => fold(paren.expr),
        Expr::Unary(unary) => fold_unary(unary.op, fold(unary.operand)?),
        Expr::Binary(binary) => fold_binary(binary.op, fold(binary.left)?, fold(binary.right)?),
        _ => None,
    }
}

fn fold_unary(op: UnaryOp, value: ConstValue) -> Option<ConstValue> {
    match op {
        UnaryOp::Not => Some(ConstValue::Number(if value.is_truthy() { 0.0 } else { 1.0 })),
        UnaryOp::Neg => Some(ConstValue::Number(-value.as_number()?)),
        UnaryOp::BitNot => {
            let n = value.as_number()? as i32;
            Some(ConstValue::Number((!n & BITWISE_MASK) as f32))
        }
    }
}

fn fold_binary(op: BinaryOp, left: ConstValue, right: ConstValue) -> Option<ConstValue> {
    if let (BinaryOp::Add, ConstValue::String(l), ConstValue::String(r)) = (op, &left, &right) {
        return Some(ConstValue::String(format!("{l}{r}")));
    }

    let (l, r) = (left.as_number()?, right.as_number()?);
    let result = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div if r == 0.0 => return None,
        BinaryOp::Div => l / r,
        BinaryOp::Mod => (l as i32).checked_rem(r as i32)? as f32,
        BinaryOp::BitAnd => bitwise(l, r, |a, b| a & b),
        BinaryOp::BitOr => bitwise(l, r, |a, b| a | b),
        BinaryOp::BitXor => bitwise(l, r, |a, b| a ^ b),
        BinaryOp::Shl => {
            let shifted = (l as i32).checked_shl(u32::try_from(r as i32).ok()?)?;
            (shifted & BITWISE_MASK) as f32
        }
        BinaryOp::Shr => {
            let shifted = (l as i32).checked_shr(u32::try_from(r as i32).ok()?)?;
            (shifted & BITWISE_MASK) as f32
        }
    };
    Some(ConstValue::Number(result))
}

fn bitwise(l: f32, r: f32, f: impl Fn(i32, i32) -> i32) -> f32 {
    (f(l as i32, r as i32) & BITWISE_MASK) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use dmc_ast::AstBuilder;

    #[test]
    fn literals() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        assert_eq!(fold(b.number(3.0)), Some(ConstValue::Number(3.0)));
        assert_eq!(fold(b.null()), Some(ConstValue::Null));
        assert_eq!(fold(b.ident("x")), None);
    }

    #[test]
    fn modify_flag_expression() {
        // MATRIX_ROTATE | MATRIX_MODIFY written out as an expression.
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.paren(b.binary(b.number(5.0), BinaryOp::BitOr, b.number(128.0)));
        assert_eq!(fold(expr), Some(ConstValue::Number(133.0)));
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        assert_eq!(fold(b.binary(b.number(1.0), BinaryOp::Div, b.number(0.0))), None);
        assert_eq!(fold(b.binary(b.number(1.0), BinaryOp::Mod, b.number(0.0))), None);
    }

    #[test]
    fn bitwise_is_masked_to_24_bits() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        assert_eq!(
            fold(b.unary(UnaryOp::BitNot, b.number(0.0))),
            Some(ConstValue::Number(16_777_215.0))
        );
    }

    #[test]
    fn unary_on_non_constant_is_not_folded() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        assert_eq!(fold(b.unary(UnaryOp::Neg, b.ident("x"))), None);
        assert_eq!(
            fold(b.unary(UnaryOp::Neg, b.number(2.0))),
            Some(ConstValue::Number(-2.0))
        );
    }

    #[test]
    fn string_concatenation() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        assert_eq!(
            fold(b.binary(b.string("a"), BinaryOp::Add, b.string("b"))),
            Some(ConstValue::String("ab".to_string()))
        );
        assert_eq!(fold(b.binary(b.string("a"), BinaryOp::Mul, b.number(2.0))), None);
    }
}
