use crate::ast::{BinOp, Expr, ExprKind, UnOp};

/// A fully-reduced value, used only to decide whether a contract
/// expression with no free variables is trivially true or false.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstVal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Evaluate `expr` to a constant, returning `None` the moment a free
/// identifier, call, or anything else non-constant is reached.
pub fn eval_const(expr: &Expr) -> Option<ConstVal> {
    match &expr.kind {
        ExprKind::Int(n) => Some(ConstVal::Int(*n)),
        ExprKind::Float(n) => Some(ConstVal::Float(*n)),
        ExprKind::Bool(b) => Some(ConstVal::Bool(*b)),
        ExprKind::Str(s) => Some(ConstVal::Str(s.clone())),
        ExprKind::Paren(inner) => eval_const(inner),
        ExprKind::Unary { op, operand } => apply_unary(*op, eval_const(operand)?),
        ExprKind::Binary { op, left, right } => {
            apply_binary(*op, eval_const(left)?, eval_const(right)?)
        }
        _ => None,
    }
}

pub fn eval_const_bool(expr: &Expr) -> Option<bool> {
    match eval_const(expr)? {
        ConstVal::Bool(b) => Some(b),
        _ => None,
    }
}

fn apply_unary(op: UnOp, v: ConstVal) -> Option<ConstVal> {
    match (op, v) {
        (UnOp::Neg, ConstVal::Int(n)) => Some(ConstVal::Int(-n)),
        (UnOp::Neg, ConstVal::Float(n)) => Some(ConstVal::Float(-n)),
        (UnOp::Not, ConstVal::Bool(b)) => Some(ConstVal::Bool(!b)),
        _ => None,
    }
}

fn apply_binary(op: BinOp, l: ConstVal, r: ConstVal) -> Option<ConstVal> {
    use ConstVal::*;
    match (op, l, r) {
        (BinOp::Add, Int(a), Int(b)) => Some(Int(a.checked_add(b)?)),
        (BinOp::Sub, Int(a), Int(b)) => Some(Int(a.checked_sub(b)?)),
        (BinOp::Mul, Int(a), Int(b)) => Some(Int(a.checked_mul(b)?)),
        (BinOp::Div, Int(a), Int(b)) if b != 0 => Some(Int(a.checked_div(b)?)),
        (BinOp::Mod, Int(a), Int(b)) if b != 0 => Some(Int(a.checked_rem(b)?)),
        (BinOp::Add, Float(a), Float(b)) => Some(Float(a + b)),
        (BinOp::Sub, Float(a), Float(b)) => Some(Float(a - b)),
        (BinOp::Mul, Float(a), Float(b)) => Some(Float(a * b)),
        (BinOp::Div, Float(a), Float(b)) if b != 0.0 => Some(Float(a / b)),
        (BinOp::Add, Str(a), Str(b)) => Some(Str(a + &b)),
        (BinOp::Eq, a, b) => Some(Bool(a == b)),
        (BinOp::NotEq, a, b) => Some(Bool(a != b)),
        (BinOp::Lt, Int(a), Int(b)) => Some(Bool(a < b)),
        (BinOp::Gt, Int(a), Int(b)) => Some(Bool(a > b)),
        (BinOp::LtEq, Int(a), Int(b)) => Some(Bool(a <= b)),
        (BinOp::GtEq, Int(a), Int(b)) => Some(Bool(a >= b)),
        (BinOp::Lt, Float(a), Float(b)) => Some(Bool(a < b)),
        (BinOp::Gt, Float(a), Float(b)) => Some(Bool(a > b)),
        (BinOp::LtEq, Float(a), Float(b)) => Some(Bool(a <= b)),
        (BinOp::GtEq, Float(a), Float(b)) => Some(Bool(a >= b)),
        (BinOp::And, Bool(a), Bool(b)) => Some(Bool(a && b)),
        (BinOp::Or, Bool(a), Bool(b)) => Some(Bool(a || b)),
        _ => None,
    }
}
