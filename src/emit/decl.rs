use crate::ast::{Contract, ContractKind, Decl, FnDecl, TypeDecl, TypeDef, VerificationOutcome};

use super::context::EmitContext;
use super::stmt::emit_block_body;
use super::Emit;

/// Emits a contract as a residual runtime check, or nothing at all if
/// the verifier already proved it statically. A contract the verifier
/// refuted never reaches here: refutation is an error-severity
/// diagnostic, and the pipeline halts before the emit stage runs.
fn emit_contract_check(contract: &Contract, ctx: &mut EmitContext) -> Result<(), std::fmt::Error> {
    if matches!(contract.outcome(), Some(VerificationOutcome::Proven)) {
        return Ok(());
    }
    let label = match contract.kind {
        ContractKind::Precondition => "Precondition failed",
        ContractKind::Postcondition => "Postcondition failed",
        ContractKind::Invariant => "Invariant failed",
    };
    ctx.write_indent()?;
    ctx.write("if (!(")?;
    contract.expr.emit(ctx)?;
    ctx.write(")) {\n")?;
    ctx.with_indent(|ctx| {
        ctx.write_indented_line(&format!("throw {:?};", format!("{label}: {}", contract.text)))
    })?;
    ctx.write_indented_line("}")
}

impl Emit for TypeDecl {
    fn emit(&self, ctx: &mut EmitContext) -> Result<(), std::fmt::Error> {
        match &self.def {
            // An alias is the same type under a new name; it gets no
            // constructor of its own, matching the type checker's
            // treatment of aliases as structurally transparent.
            TypeDef::Alias(_) => Ok(()),
            TypeDef::Refined { .. } => {
                ctx.write(&format!("function {}(value) {{\n", self.name))?;
                ctx.with_indent(|ctx| {
                    for invariant in &self.invariants {
                        emit_contract_check(invariant, ctx)?;
                    }
                    ctx.write_indented_line("return value;")
                })?;
                ctx.write_indented_line("}")
            }
            TypeDef::Sum(variants) => {
                for variant in variants {
                    let params: Vec<String> =
                        (0..variant.payload.len()).map(|i| format!("field{i}")).collect();
                    ctx.write(&format!("function {}({}) {{\n", variant.name, params.join(", ")))?;
                    ctx.with_indent(|ctx| {
                        ctx.write_indent()?;
                        ctx.write(&format!("return {{ tag: {:?}", variant.name))?;
                        for p in &params {
                            ctx.write(&format!(", {p}"))?;
                        }
                        ctx.write(" };\n")
                    })?;
                    ctx.write_indented_line("}")?;
                }
                Ok(())
            }
        }
    }
}

impl Emit for FnDecl {
    fn emit(&self, ctx: &mut EmitContext) -> Result<(), std::fmt::Error> {
        let params: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        ctx.write(&format!("function {}({}) {{\n", self.name, params.join(", ")))?;
        ctx.with_indent(|ctx| {
            for pre in &self.preconditions {
                emit_contract_check(pre, ctx)?;
            }

            let tail = self.body.tail_expr().cloned();
            match tail {
                Some(tail_expr) if !self.postconditions.is_empty() => {
                    for stmt in &self.body.statements[..self.body.statements.len() - 1] {
                        stmt.emit(ctx)?;
                    }
                    ctx.write_indent()?;
                    ctx.write("const __result = ")?;
                    tail_expr.emit(ctx)?;
                    ctx.write(";\n")?;
                    ctx.result_name = Some("__result".to_string());
                    for post in &self.postconditions {
                        emit_contract_check(post, ctx)?;
                    }
                    ctx.result_name = None;
                    ctx.write_indented_line("return __result;")
                }
                _ => emit_block_body(&self.body, ctx),
            }
        })?;
        ctx.write_indented_line("}")
    }
}

impl Emit for Decl {
    fn emit(&self, ctx: &mut EmitContext) -> Result<(), std::fmt::Error> {
        match self {
            Decl::Type(t) => t.emit(ctx),
            Decl::Function(f) => f.emit(ctx),
        }
    }
}
