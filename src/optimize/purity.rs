use crate::ast::{Expr, ExprKind};

/// Recognized pure built-ins the optimizer may fold across. Nothing is
/// registered yet: this language exposes arithmetic, comparison, and
/// logical operations as operators rather than calls, so every `Call`
/// node reaches a user-defined function whose body the optimizer
/// hasn't analyzed. Kept as a named table (rather than hard-coding
/// "every call is impure" at the call site) so a future intrinsic
/// can be whitelisted by adding its name here instead of touching the
/// rewrite rules.
const PURE_BUILTINS: &[&str] = &[];

fn is_pure_call(name: &str) -> bool {
    PURE_BUILTINS.contains(&name)
}

/// Whether evaluating `expr` could run a side-effecting call. Dropping
/// such an expression (rather than merely leaving it in place) would
/// change observable behavior, so the optimizer must check this
/// before rewrites like `x*0 -> 0` that discard an operand outright.
pub fn is_side_effect_free(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Str(_) | ExprKind::Bool(_) | ExprKind::Ident(_) => {
            true
        }
        ExprKind::Binary { left, right, .. } => {
            is_side_effect_free(left) && is_side_effect_free(right)
        }
        ExprKind::Unary { operand, .. } => is_side_effect_free(operand),
        ExprKind::Call { callee, args } => {
            let pure_callee = matches!(&callee.kind, ExprKind::Ident(name) if is_pure_call(name));
            pure_callee && args.iter().all(is_side_effect_free)
        }
        ExprKind::Member { object, .. } => is_side_effect_free(object),
        ExprKind::Array(items) => items.iter().all(is_side_effect_free),
        ExprKind::Record(fields) => fields.iter().all(|(_, v)| is_side_effect_free(v)),
        ExprKind::Paren(inner) => is_side_effect_free(inner),
        // A branching expression may hide an impure call in a branch
        // that wouldn't otherwise run; conservatively impure.
        ExprKind::When { .. } | ExprKind::Given { .. } => false,
    }
}
