use super::context::FormatterContext;
use super::expr::ends_in_block;
use super::Format;
use crate::ast::{Block, Stmt};

impl Format for Block {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        for stmt in &self.statements {
            stmt.format(ctx)?;
        }
        Ok(())
    }
}

impl Format for Stmt {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        match self {
            Stmt::Let {
                name,
                annotation,
                value,
                ..
            } => {
                ctx.write_indent()?;
                ctx.write("let ")?;
                ctx.write(name)?;
                if let Some(ty) = annotation {
                    ctx.write(": ")?;
                    ctx.write(&ty.to_string())?;
                }
                ctx.write(" = ")?;
                value.format(ctx)?;
                ctx.write_newline()
            }
            Stmt::Assign { target, value, .. } => {
                ctx.write_indent()?;
                ctx.write(target)?;
                ctx.write(" = ")?;
                value.format(ctx)?;
                ctx.write_newline()
            }
            Stmt::Expr(e) => {
                ctx.write_indent()?;
                e.format(ctx)?;
                if !ends_in_block(e) {
                    ctx.write_newline()?;
                }
                Ok(())
            }
        }
    }
}
