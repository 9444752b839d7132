use super::context::FormatterContext;
use super::Format;
use crate::ast::{Contract, ContractKind, Decl, FnDecl, Import, Program, TypeDecl, TypeDef};

impl Format for Import {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write("import ")?;
        ctx.write(&self.path.join("."))?;
        ctx.write_newline()
    }
}

impl Format for Contract {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        let keyword = match self.kind {
            ContractKind::Precondition => "expect",
            ContractKind::Postcondition => "ensure",
            ContractKind::Invariant => "invariant",
        };
        ctx.write_indent()?;
        ctx.write(keyword)?;
        ctx.write(" ")?;
        self.expr.format(ctx)?;
        ctx.write_newline()
    }
}

impl Format for TypeDecl {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write("type ")?;
        ctx.write(&self.name)?;
        for param in &self.type_params {
            ctx.write(" ")?;
            ctx.write(param)?;
        }
        ctx.write(" = ")?;
        match &self.def {
            TypeDef::Alias(te) | TypeDef::Refined { base: te } => {
                ctx.write(&te.to_string())?;
                ctx.write_newline()?;
                if !self.invariants.is_empty() {
                    ctx.with_indent(|ctx| {
                        for inv in &self.invariants {
                            inv.format(ctx)?;
                        }
                        Ok(())
                    })?;
                }
            }
            TypeDef::Sum(variants) => {
                ctx.write_newline()?;
                ctx.with_indent(|ctx| {
                    for variant in variants {
                        ctx.write_indent()?;
                        ctx.write("| ")?;
                        ctx.write(&variant.name)?;
                        if !variant.payload.is_empty() {
                            ctx.write("(")?;
                            ctx.write_separated(&variant.payload, ", ", |ctx, ty| {
                                ctx.write(&ty.to_string())
                            })?;
                            ctx.write(")")?;
                        }
                        ctx.write_newline()?;
                    }
                    Ok(())
                })?;
            }
        }
        Ok(())
    }
}

impl Format for FnDecl {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write("define ")?;
        ctx.write(&self.name)?;
        ctx.write("(")?;
        ctx.write_separated(&self.params, ", ", |ctx, param| {
            ctx.write(&param.name)?;
            ctx.write(": ")?;
            ctx.write(&param.ty.to_string())
        })?;
        ctx.write(") -> ")?;
        ctx.write(&self.return_type.to_string())?;
        ctx.write_newline()?;

        if !self.preconditions.is_empty() || !self.postconditions.is_empty() {
            ctx.with_indent(|ctx| {
                for pre in &self.preconditions {
                    pre.format(ctx)?;
                }
                for post in &self.postconditions {
                    post.format(ctx)?;
                }
                Ok(())
            })?;
        }

        ctx.write_indented_line("given")?;
        ctx.with_indent(|ctx| self.body.format(ctx))
    }
}

impl Format for Decl {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        match self {
            Decl::Type(t) => t.format(ctx),
            Decl::Function(f) => f.format(ctx),
        }
    }
}

impl Format for Program {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        for import in &self.imports {
            import.format(ctx)?;
        }
        if !self.imports.is_empty() && !self.decls.is_empty() {
            ctx.write_newline()?;
        }
        for (i, decl) in self.decls.iter().enumerate() {
            if i > 0 {
                ctx.write_newline()?;
            }
            decl.format(ctx)?;
        }
        Ok(())
    }
}
