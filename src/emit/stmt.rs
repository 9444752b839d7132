use super::context::EmitContext;
use super::Emit;
use crate::ast::{Block, Stmt};

/// Emits a block's statements as a function body: every statement
/// becomes its own line, and a trailing expression statement (the
/// block's value) becomes a `return`. Used both for real function
/// bodies and for the IIFEs `when`/`given` lower to in expression
/// position.
pub fn emit_block_body(block: &Block, ctx: &mut EmitContext) -> Result<(), std::fmt::Error> {
    let last = block.statements.len().saturating_sub(1);
    for (i, stmt) in block.statements.iter().enumerate() {
        match stmt {
            Stmt::Expr(e) if i == last => {
                ctx.write_indent()?;
                ctx.write("return ")?;
                e.emit(ctx)?;
                ctx.write(";\n")?;
            }
            other => other.emit(ctx)?,
        }
    }
    Ok(())
}

impl Emit for Stmt {
    fn emit(&self, ctx: &mut EmitContext) -> Result<(), std::fmt::Error> {
        match self {
            Stmt::Let { name, value, .. } => {
                ctx.write_indent()?;
                ctx.write(&format!("let {name} = "))?;
                value.emit(ctx)?;
                ctx.write(";\n")
            }
            Stmt::Assign { target, value, .. } => {
                ctx.write_indent()?;
                ctx.write(&format!("{target} = "))?;
                value.emit(ctx)?;
                ctx.write(";\n")
            }
            Stmt::Expr(e) => {
                ctx.write_indent()?;
                e.emit(ctx)?;
                ctx.write(";\n")
            }
        }
    }
}
