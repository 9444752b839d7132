use super::context::FormatterContext;
use super::Format;
use crate::ast::{Expr, ExprKind, LiteralPattern, Pattern};

impl Format for Expr {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        match &self.kind {
            ExprKind::Int(n) => ctx.write(&n.to_string()),
            ExprKind::Float(n) => ctx.write(&format_float(*n)),
            ExprKind::Str(s) => ctx.write(&format!("{s:?}")),
            ExprKind::Bool(b) => ctx.write(&b.to_string()),
            ExprKind::Ident(name) => ctx.write(name),
            ExprKind::Binary { op, left, right } => {
                left.format(ctx)?;
                ctx.write(&format!(" {} ", op.text()))?;
                right.format(ctx)
            }
            ExprKind::Unary { op, operand } => {
                ctx.write(op.text())?;
                operand.format(ctx)
            }
            ExprKind::Call { callee, args } => {
                callee.format(ctx)?;
                ctx.write("(")?;
                ctx.write_separated(args, ", ", |ctx, a| a.format(ctx))?;
                ctx.write(")")
            }
            ExprKind::Member { object, field } => {
                object.format(ctx)?;
                ctx.write(".")?;
                ctx.write(field)
            }
            ExprKind::Array(items) => {
                ctx.write("[")?;
                ctx.write_separated(items, ", ", |ctx, item| item.format(ctx))?;
                ctx.write("]")
            }
            ExprKind::Record(fields) => {
                ctx.write("{ ")?;
                ctx.write_separated(fields, ", ", |ctx, (name, value)| {
                    ctx.write(name)?;
                    ctx.write(": ")?;
                    value.format(ctx)
                })?;
                ctx.write(" }")
            }
            ExprKind::When {
                condition,
                then_branch,
                else_branch,
            } => {
                ctx.write("when ")?;
                condition.format(ctx)?;
                ctx.write_newline()?;
                ctx.with_indent(|ctx| then_branch.format(ctx))?;
                if let Some(else_branch) = else_branch {
                    ctx.write_indented_line("otherwise")?;
                    ctx.with_indent(|ctx| else_branch.format(ctx))?;
                }
                Ok(())
            }
            ExprKind::Given { scrutinee, cases } => {
                ctx.write("given ")?;
                scrutinee.format(ctx)?;
                ctx.write_newline()?;
                ctx.with_indent(|ctx| {
                    for (pattern, case_expr) in cases {
                        ctx.write_indent()?;
                        pattern.format(ctx)?;
                        ctx.write(" -> ")?;
                        case_expr.format(ctx)?;
                        // A case whose value is itself a multi-line
                        // `when`/`given` already ends on a fresh line.
                        if !ends_in_block(case_expr) {
                            ctx.write_newline()?;
                        }
                    }
                    Ok(())
                })
            }
            ExprKind::Paren(inner) => {
                ctx.write("(")?;
                inner.format(ctx)?;
                ctx.write(")")
            }
        }
    }
}

/// Whether formatting `expr` already ends with its own trailing
/// newline, because it's a multi-line indented block form rather
/// than an inline expression.
pub(super) fn ends_in_block(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::When { .. } | ExprKind::Given { .. })
}

impl Format for Pattern {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        match self {
            Pattern::Constructor { name, subpatterns, .. } => {
                ctx.write(name)?;
                if !subpatterns.is_empty() {
                    ctx.write("(")?;
                    ctx.write_separated(subpatterns, ", ", |ctx, p| p.format(ctx))?;
                    ctx.write(")")?;
                }
                Ok(())
            }
            Pattern::Ident(name, _) => ctx.write(name),
            Pattern::Literal(lit, _) => match lit {
                LiteralPattern::Int(n) => ctx.write(&n.to_string()),
                LiteralPattern::Float(n) => ctx.write(&format_float(*n)),
                LiteralPattern::Str(s) => ctx.write(&format!("{s:?}")),
                LiteralPattern::Bool(b) => ctx.write(&b.to_string()),
            },
            Pattern::Wildcard(_) => ctx.write("_"),
        }
    }
}

/// Renders a float so a `.` is always present, even for an
/// integral value. `n.to_string()` prints `1` for `1.0`, which
/// re-lexes as an `Int` rather than a `Float` and breaks the
/// parse-format round trip.
pub(super) fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}
