use crate::ast::{BinOp, Expr, ExprKind, UnOp};

#[derive(Debug, Clone, PartialEq)]
enum ConstVal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl ConstVal {
    fn into_kind(self) -> ExprKind {
        match self {
            ConstVal::Int(n) => ExprKind::Int(n),
            ConstVal::Float(n) => ExprKind::Float(n),
            ConstVal::Bool(b) => ExprKind::Bool(b),
            ConstVal::Str(s) => ExprKind::Str(s),
        }
    }
}

fn eval(expr: &Expr) -> Option<ConstVal> {
    match &expr.kind {
        ExprKind::Int(n) => Some(ConstVal::Int(*n)),
        ExprKind::Float(n) => Some(ConstVal::Float(*n)),
        ExprKind::Bool(b) => Some(ConstVal::Bool(*b)),
        ExprKind::Str(s) => Some(ConstVal::Str(s.clone())),
        ExprKind::Paren(inner) => eval(inner),
        ExprKind::Unary { op, operand } => apply_unary(*op, eval(operand)?),
        ExprKind::Binary { op, left, right } => apply_binary(*op, eval(left)?, eval(right)?),
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

/// Folds `expr` to a literal if every leaf it reaches is itself
/// constant. Returns `None` (not a rewrite) when a free identifier,
/// call, or anything else non-constant is reached — the literal case
/// already covers "nothing to do" so callers don't loop forever.
pub fn fold_constant(expr: &Expr) -> Option<Expr> {
    if matches!(
        expr.kind,
        ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Bool(_) | ExprKind::Str(_)
    ) {
        return None;
    }
    let value = eval(expr)?;
    Some(Expr::new(value.into_kind(), expr.span.clone()))
}

/// Folds a condition expression specifically to a boolean, used by
/// dead-branch elimination (which only cares about `true`/`false`, not
/// the general literal case `fold_constant` handles).
pub fn fold_bool(expr: &Expr) -> Option<bool> {
    match eval(expr)? {
        ConstVal::Bool(b) => Some(b),
        _ => None,
    }
}
