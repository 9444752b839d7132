use super::context::EmitContext;
use super::stmt::emit_block_body;
use super::Emit;
use crate::ast::{Expr, ExprKind, LiteralPattern, Pattern};

impl Emit for Expr {
    fn emit(&self, ctx: &mut EmitContext) -> Result<(), std::fmt::Error> {
        match &self.kind {
            ExprKind::Int(n) => ctx.write(&n.to_string()),
            ExprKind::Float(n) => ctx.write(&format_float(*n)),
            ExprKind::Str(s) => ctx.write(&format!("{s:?}")),
            ExprKind::Bool(b) => ctx.write(&b.to_string()),
            ExprKind::Ident(name) if name == "result" => {
                let resolved = ctx.result_name.clone().unwrap_or_else(|| name.clone());
                ctx.write(&resolved)
            }
            ExprKind::Ident(name) => ctx.write(name),
            // `old(e)` would need a pre-call snapshot of every binding
            // it reaches to be lowered precisely; instead it's unwrapped
            // to `e` directly, the same simplification the verifier
            // makes when discharging postconditions that mention it.
            ExprKind::Call { callee, args } if is_old(callee) && args.len() == 1 => {
                args[0].emit(ctx)
            }
            ExprKind::Binary { op, left, right } => {
                ctx.write("(")?;
                left.emit(ctx)?;
                ctx.write(&format!(" {} ", op.text()))?;
                right.emit(ctx)?;
                ctx.write(")")
            }
            ExprKind::Unary { op, operand } => {
                ctx.write(op.text())?;
                operand.emit(ctx)
            }
            ExprKind::Call { callee, args } => {
                callee.emit(ctx)?;
                ctx.write("(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ctx.write(", ")?;
                    }
                    arg.emit(ctx)?;
                }
                ctx.write(")")
            }
            ExprKind::Member { object, field } => {
                object.emit(ctx)?;
                ctx.write(".")?;
                ctx.write(field)
            }
            ExprKind::Array(items) => {
                ctx.write("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        ctx.write(", ")?;
                    }
                    item.emit(ctx)?;
                }
                ctx.write("]")
            }
            ExprKind::Record(fields) => {
                ctx.write("{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        ctx.write(", ")?;
                    }
                    ctx.write(name)?;
                    ctx.write(": ")?;
                    value.emit(ctx)?;
                }
                ctx.write(" }")
            }
            ExprKind::When {
                condition,
                then_branch,
                else_branch,
            } => {
                ctx.write("(function () {\n")?;
                ctx.with_indent(|ctx| {
                    ctx.write_indent()?;
                    ctx.write("if (")?;
                    condition.emit(ctx)?;
                    ctx.write(") {\n")?;
                    ctx.with_indent(|ctx| emit_block_body(then_branch, ctx))?;
                    if let Some(else_branch) = else_branch {
                        ctx.write_indent()?;
                        ctx.write("} else {\n")?;
                        ctx.with_indent(|ctx| emit_block_body(else_branch, ctx))?;
                        ctx.write_indented_line("}")
                    } else {
                        ctx.write_indented_line("}")
                    }
                })?;
                ctx.write_indent()?;
                ctx.write("})()")
            }
            ExprKind::Given { scrutinee, cases } => emit_given(self, scrutinee, cases, ctx),
            ExprKind::Paren(inner) => {
                ctx.write("(")?;
                inner.emit(ctx)?;
                ctx.write(")")
            }
        }
    }
}

fn is_old(callee: &Expr) -> bool {
    matches!(&callee.kind, ExprKind::Ident(name) if name == "old")
}

fn emit_given(
    _expr: &Expr,
    scrutinee: &Expr,
    cases: &[(Pattern, Expr)],
    ctx: &mut EmitContext,
) -> Result<(), std::fmt::Error> {
    let name = ctx.fresh_match_name();
    ctx.write("(function () {\n")?;
    ctx.with_indent(|ctx| {
        ctx.write_indent()?;
        ctx.write(&format!("const {name} = "))?;
        scrutinee.emit(ctx)?;
        ctx.write(";\n")?;
        for (i, (pattern, case_expr)) in cases.iter().enumerate() {
            ctx.write_indent()?;
            ctx.write(if i == 0 { "if (" } else { "} else if (" })?;
            ctx.write(&pattern_test(pattern, &name))?;
            ctx.write(") {\n")?;
            ctx.with_indent(|ctx| {
                let mut bindings = Vec::new();
                pattern_bindings(pattern, &name, &mut bindings);
                for (bind_name, accessor) in &bindings {
                    ctx.write_indented_line(&format!("const {bind_name} = {accessor};"))?;
                }
                ctx.write_indent()?;
                ctx.write("return ")?;
                case_expr.emit(ctx)?;
                ctx.write(";\n")
            })?;
        }
        ctx.write_indented_line("} else {")?;
        ctx.with_indent(|ctx| ctx.write_indented_line("throw \"non-exhaustive match\";"))?;
        ctx.write_indented_line("}")
    })?;
    ctx.write_indent()?;
    ctx.write("})()")
}

fn pattern_test(pattern: &Pattern, scrutinee: &str) -> String {
    match pattern {
        Pattern::Wildcard(_) | Pattern::Ident(_, _) => "true".to_string(),
        Pattern::Literal(lit, _) => format!("{scrutinee} === {}", literal_text(lit)),
        Pattern::Constructor {
            name, subpatterns, ..
        } => {
            let mut parts = vec![format!("{scrutinee}.tag === {name:?}")];
            for (i, sub) in subpatterns.iter().enumerate() {
                let field = format!("{scrutinee}.field{i}");
                let sub_test = pattern_test(sub, &field);
                if sub_test != "true" {
                    parts.push(sub_test);
                }
            }
            parts.join(" && ")
        }
    }
}

fn pattern_bindings(pattern: &Pattern, scrutinee: &str, out: &mut Vec<(String, String)>) {
    match pattern {
        Pattern::Ident(name, _) => out.push((name.clone(), scrutinee.to_string())),
        Pattern::Constructor { subpatterns, .. } => {
            for (i, sub) in subpatterns.iter().enumerate() {
                pattern_bindings(sub, &format!("{scrutinee}.field{i}"), out);
            }
        }
        Pattern::Literal(_, _) | Pattern::Wildcard(_) => {}
    }
}

fn literal_text(lit: &LiteralPattern) -> String {
    match lit {
        LiteralPattern::Int(n) => n.to_string(),
        LiteralPattern::Float(n) => format_float(*n),
        LiteralPattern::Str(s) => format!("{s:?}"),
        LiteralPattern::Bool(b) => b.to_string(),
    }
}

/// Renders a float so a `.` is always present, matching the source
/// language's Int/Float distinction in the emitted target text even
/// when the value is integral (`1.0`, not `1`).
fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}
