//! Deterministic AST-to-AST rewriting: constant folding, algebraic
//! identities, and dead-branch pruning.
//!
//! Unlike the checker and verifier, the optimizer never mutates the
//! tree it's given — it always hands back a structurally new
//! [`Program`], built bottom-up so a fold low in the tree can unlock
//! another fold higher up (`(1 + 1) + x` folds its left side to `2`
//! before anything looks at the outer `Add`). Rewrites run to a
//! per-node fixpoint: a node is simplified repeatedly until nothing
//! more applies.

mod fold;
mod purity;

use std::cell::Cell;

use crate::ast::{
    BinOp, Block, Decl, Expr, ExprKind, FnDecl, Program, Stmt, TypeDecl, UnOp,
};

use fold::{fold_bool, fold_constant};
use purity::is_side_effect_free;

pub struct Optimizer {
    rewrites: Cell<usize>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    pub fn new() -> Self {
        Optimizer {
            rewrites: Cell::new(0),
        }
    }

    /// Count of rewrites applied by the most recent call to
    /// [`Optimizer::optimize`], reported back to the CLI's `optimize`
    /// subcommand.
    pub fn rewrite_count(&self) -> usize {
        self.rewrites.get()
    }

    pub fn optimize(&self, program: &Program) -> Program {
        self.rewrites.set(0);
        Program {
            imports: program.imports.clone(),
            decls: program.decls.iter().map(|d| self.optimize_decl(d)).collect(),
        }
    }

    fn optimize_decl(&self, decl: &Decl) -> Decl {
        match decl {
            Decl::Type(t) => Decl::Type(self.optimize_type_decl(t)),
            Decl::Function(f) => Decl::Function(self.optimize_fn_decl(f)),
        }
    }

    fn optimize_type_decl(&self, decl: &TypeDecl) -> TypeDecl {
        TypeDecl {
            name: decl.name.clone(),
            type_params: decl.type_params.clone(),
            def: decl.def.clone(),
            invariants: decl
                .invariants
                .iter()
                .map(|c| c.rebuilt(self.optimize_expr(&c.expr)))
                .collect(),
            span: decl.span.clone(),
        }
    }

    fn optimize_fn_decl(&self, decl: &FnDecl) -> FnDecl {
        FnDecl {
            name: decl.name.clone(),
            params: decl.params.clone(),
            return_type: decl.return_type.clone(),
            preconditions: decl
                .preconditions
                .iter()
                .map(|c| c.rebuilt(self.optimize_expr(&c.expr)))
                .collect(),
            postconditions: decl
                .postconditions
                .iter()
                .map(|c| c.rebuilt(self.optimize_expr(&c.expr)))
                .collect(),
            body: self.optimize_block(&decl.body),
            span: decl.span.clone(),
        }
    }

    fn optimize_block(&self, block: &Block) -> Block {
        Block::new(
            block.statements.iter().map(|s| self.optimize_stmt(s)).collect(),
            block.span.clone(),
        )
    }

    fn optimize_stmt(&self, stmt: &Stmt) -> Stmt {
        match stmt {
            Stmt::Let {
                name,
                annotation,
                value,
                span,
            } => Stmt::Let {
                name: name.clone(),
                annotation: annotation.clone(),
                value: self.optimize_expr(value),
                span: span.clone(),
            },
            Stmt::Assign { target, value, span } => Stmt::Assign {
                target: target.clone(),
                value: self.optimize_expr(value),
                span: span.clone(),
            },
            Stmt::Expr(e) => Stmt::Expr(self.optimize_expr(e)),
        }
    }

    fn optimize_expr(&self, expr: &Expr) -> Expr {
        let rebuilt = self.rebuild_children(expr);
        self.simplify_to_fixpoint(rebuilt)
    }

    fn rebuild_children(&self, expr: &Expr) -> Expr {
        let kind = match &expr.kind {
            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op: *op,
                left: Box::new(self.optimize_expr(left)),
                right: Box::new(self.optimize_expr(right)),
            },
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op: *op,
                operand: Box::new(self.optimize_expr(operand)),
            },
            ExprKind::Call { callee, args } => ExprKind::Call {
                callee: Box::new(self.optimize_expr(callee)),
                args: args.iter().map(|a| self.optimize_expr(a)).collect(),
            },
            ExprKind::Member { object, field } => ExprKind::Member {
                object: Box::new(self.optimize_expr(object)),
                field: field.clone(),
            },
            ExprKind::Array(items) => {
                ExprKind::Array(items.iter().map(|i| self.optimize_expr(i)).collect())
            }
            ExprKind::Record(fields) => ExprKind::Record(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), self.optimize_expr(value)))
                    .collect(),
            ),
            ExprKind::Paren(inner) => ExprKind::Paren(Box::new(self.optimize_expr(inner))),
            ExprKind::When {
                condition,
                then_branch,
                else_branch,
            } => ExprKind::When {
                condition: Box::new(self.optimize_expr(condition)),
                then_branch: self.optimize_block(then_branch),
                else_branch: else_branch.as_ref().map(|b| self.optimize_block(b)),
            },
            ExprKind::Given { scrutinee, cases } => ExprKind::Given {
                scrutinee: Box::new(self.optimize_expr(scrutinee)),
                cases: cases
                    .iter()
                    .map(|(pattern, case_expr)| (pattern.clone(), self.optimize_expr(case_expr)))
                    .collect(),
            },
            literal => literal.clone(),
        };
        Expr::new(kind, expr.span.clone())
    }

    fn simplify_to_fixpoint(&self, mut expr: Expr) -> Expr {
        while let Some(next) = self.simplify_once(&expr) {
            self.rewrites.set(self.rewrites.get() + 1);
            expr = next;
        }
        expr
    }

    fn simplify_once(&self, expr: &Expr) -> Option<Expr> {
        if let Some(folded) = fold_constant(expr) {
            return Some(folded);
        }
        match &expr.kind {
            ExprKind::Unary {
                op: UnOp::Not,
                operand,
            } => match &operand.kind {
                ExprKind::Unary {
                    op: UnOp::Not,
                    operand: inner,
                } => Some((**inner).clone()),
                _ => None,
            },
            ExprKind::Binary { op, left, right } => identity_simplify(*op, left, right),
            ExprKind::When {
                condition,
                then_branch,
                else_branch,
            } => dead_branch_eliminate(condition, then_branch, else_branch.as_ref()),
            _ => None,
        }
    }
}

/// `x+0 → x`, `0+x → x`, `x-0 → x`, `x*1 → x`, `1*x → x`, `x*0 → 0`,
/// `0*x → 0`. The last two discard `x`, so they only fire when `x` is
/// known side-effect free.
fn identity_simplify(op: BinOp, left: &Expr, right: &Expr) -> Option<Expr> {
    // Operands reaching here have already been folded to a fixpoint by
    // the bottom-up traversal, so a numeric identity shows up as a
    // bare literal, never as a foldable sub-expression.
    let zero = |e: &Expr| matches!(e.kind, ExprKind::Int(0));
    let one = |e: &Expr| matches!(e.kind, ExprKind::Int(1));

    match op {
        BinOp::Add if zero(right) => Some(left.clone()),
        BinOp::Add if zero(left) => Some(right.clone()),
        BinOp::Sub if zero(right) => Some(left.clone()),
        BinOp::Mul if one(right) => Some(left.clone()),
        BinOp::Mul if one(left) => Some(right.clone()),
        BinOp::Mul if zero(right) && is_side_effect_free(left) => Some(right.clone()),
        BinOp::Mul if zero(left) && is_side_effect_free(right) => Some(left.clone()),
        _ => None,
    }
}

/// Drops the branch that can never run once the condition is known.
/// Only applies when the surviving branch is a single trailing
/// expression: `when`/`given` have no expression form for "a sequence
/// of statements", so a multi-statement branch can't be spliced in as
/// the replacement value without also being a block — left alone
/// rather than risk losing the earlier statements' bindings.
fn dead_branch_eliminate(condition: &Expr, then_branch: &Block, else_branch: Option<&Block>) -> Option<Expr> {
    let value = fold_bool(condition)?;
    let survivor = if value { Some(then_branch) } else { else_branch };
    let survivor = survivor?;
    if survivor.statements.len() == 1 {
        if let Stmt::Expr(e) = &survivor.statements[0] {
            return Some(e.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn optimized_tail(src: &str) -> (Expr, usize) {
        let tokens = Lexer::new(src).lex().expect("lex");
        let program = Parser::parse(tokens).expect("parse");
        let optimizer = Optimizer::new();
        let optimized = optimizer.optimize(&program);
        let Decl::Function(f) = &optimized.decls[0] else {
            panic!("expected function decl");
        };
        (
            f.body.tail_expr().cloned().expect("body has a tail expression"),
            optimizer.rewrite_count(),
        )
    }

    #[test]
    fn folds_constant_arithmetic() {
        let (tail, rewrites) = optimized_tail("define f() -> Int\ngiven\n  1 + 2\n");
        assert_eq!(tail.kind, ExprKind::Int(3));
        assert!(rewrites >= 1);
    }

    #[test]
    fn simplifies_additive_identity() {
        let (tail, _) = optimized_tail("define f(x: Int) -> Int\ngiven\n  x + 0\n");
        assert_eq!(tail.kind, ExprKind::Ident("x".into()));
    }

    #[test]
    fn simplifies_multiplicative_zero_when_side_effect_free() {
        let (tail, _) = optimized_tail("define f(x: Int) -> Int\ngiven\n  x * 0\n");
        assert_eq!(tail.kind, ExprKind::Int(0));
    }

    #[test]
    fn does_not_drop_call_operand_of_multiplicative_zero() {
        let src = "define side() -> Int\ngiven\n  1\ndefine f() -> Int\ngiven\n  side() * 0\n";
        let tokens = Lexer::new(src).lex().expect("lex");
        let program = Parser::parse(tokens).expect("parse");
        let optimized = Optimizer::new().optimize(&program);
        let Decl::Function(f) = &optimized.decls[1] else {
            panic!("expected function decl");
        };
        let tail = f.body.tail_expr().expect("tail expr");
        assert!(matches!(tail.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn collapses_double_negation() {
        let (tail, _) = optimized_tail("define f(x: Bool) -> Bool\ngiven\n  !!x\n");
        assert_eq!(tail.kind, ExprKind::Ident("x".into()));
    }

    #[test]
    fn eliminates_dead_branch_on_constant_condition() {
        let src = "define f() -> Int\ngiven\n  when true\n    1\n  otherwise\n    2\n";
        let (tail, _) = optimized_tail(src);
        assert_eq!(tail.kind, ExprKind::Int(1));
    }
}
