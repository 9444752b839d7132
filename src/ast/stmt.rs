use crate::diagnostics::Span;

use super::expr::Expr;
use super::types::TypeExpr;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        annotation: Option<TypeExpr>,
        value: Expr,
        span: Span,
    },
    Assign {
        target: String,
        value: Expr,
        span: Span,
    },
    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let { span, .. } => span.clone(),
            Stmt::Assign { span, .. } => span.clone(),
            Stmt::Expr(e) => e.span.clone(),
        }
    }
}

/// An ordered list of statements; the last expression statement, if
/// any, is the block's value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(statements: Vec<Stmt>, span: Span) -> Self {
        Block { statements, span }
    }

    /// The trailing expression statement that determines this block's
    /// value, if the block ends in one.
    pub fn tail_expr(&self) -> Option<&Expr> {
        match self.statements.last() {
            Some(Stmt::Expr(e)) => Some(e),
            _ => None,
        }
    }
}
