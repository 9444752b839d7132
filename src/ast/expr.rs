use std::cell::RefCell;

use crate::diagnostics::Span;

use super::pattern::Pattern;
use super::stmt::Block;
use super::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl BinOp {
    pub fn text(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn text(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        field: String,
    },
    Array(Vec<Expr>),
    Record(Vec<(String, Expr)>),
    When {
        condition: Box<Expr>,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    Given {
        scrutinee: Box<Expr>,
        cases: Vec<(Pattern, Expr)>,
    },
    Paren(Box<Expr>),
}

/// Every expression carries its source position and, once the type
/// checker has run, its resolved type. The slot is
/// interior-mutable so the checker can annotate in place without
/// rebuilding the tree (unlike the optimizer, which must return a new
/// tree).
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: RefCell<Option<Type>>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            span,
            ty: RefCell::new(None),
        }
    }

    pub fn resolved_type(&self) -> Option<Type> {
        self.ty.borrow().clone()
    }

    pub fn set_type(&self, ty: Type) {
        *self.ty.borrow_mut() = Some(ty);
    }

    /// Strip syntactic parentheses to reach the underlying expression,
    /// without touching the AST (used by the checker/verifier, which
    /// don't care about source-level grouping).
    pub fn unwrap_parens(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unwrap_parens(),
            _ => self,
        }
    }

    /// Rebuild this expression top-down, giving `f` the first chance to
    /// replace each node wholesale before descending into its children.
    /// `f` returning `Some` stops the descent at that node. Used by the
    /// verifier to substitute `result`/`old(...)` and by the optimizer
    /// to fold and simplify, both of which must hand back a new tree
    /// rather than mutate in place.
    pub fn rewrite(&self, f: &dyn Fn(&Expr) -> Option<Expr>) -> Expr {
        if let Some(replacement) = f(self) {
            return replacement;
        }
        let kind = match &self.kind {
            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op: *op,
                left: Box::new(left.rewrite(f)),
                right: Box::new(right.rewrite(f)),
            },
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op: *op,
                operand: Box::new(operand.rewrite(f)),
            },
            ExprKind::Call { callee, args } => ExprKind::Call {
                callee: Box::new(callee.rewrite(f)),
                args: args.iter().map(|a| a.rewrite(f)).collect(),
            },
            ExprKind::Member { object, field } => ExprKind::Member {
                object: Box::new(object.rewrite(f)),
                field: field.clone(),
            },
            ExprKind::Array(items) => ExprKind::Array(items.iter().map(|i| i.rewrite(f)).collect()),
            ExprKind::Record(fields) => ExprKind::Record(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.rewrite(f)))
                    .collect(),
            ),
            ExprKind::Paren(inner) => ExprKind::Paren(Box::new(inner.rewrite(f))),
            other => other.clone(),
        };
        Expr::new(kind, self.span.clone())
    }
}
