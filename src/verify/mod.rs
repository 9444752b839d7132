//! The symbolic verifier: discharges preconditions, postconditions,
//! and refined-type invariants against a lightweight proof engine
//! before falling back to an [`Oracle`].
//!
//! Nothing here mutates the AST's shape; like the checker, it
//! annotates each [`Contract`] in place via its `outcome` cell and
//! reports anything it can't settle through the shared diagnostic
//! sink. A contract the verifier leaves `Unproven` is the emitter's
//! cue to lower it to a runtime assertion instead of erasing it.

mod eval;
mod oracle;

pub use oracle::{Oracle, OracleAnswer, StubOracle};

use crate::ast::{BinOp, Contract, Decl, Expr, ExprKind, FnDecl, Program, TypeDecl, VerificationOutcome};
use crate::config::{Config, VerificationLevel};
use crate::diagnostics::{Diagnostic, DiagnosticSink, Pass, Span};

use eval::eval_const_bool;

pub struct Verifier<'a> {
    config: &'a Config,
    oracle: Box<dyn Oracle>,
}

impl<'a> Verifier<'a> {
    pub fn new(config: &'a Config) -> Self {
        Verifier {
            config,
            oracle: Box::new(StubOracle),
        }
    }

    pub fn with_oracle(config: &'a Config, oracle: Box<dyn Oracle>) -> Self {
        Verifier { config, oracle }
    }

    pub fn verify(&self, program: &Program, sink: &mut DiagnosticSink) {
        if matches!(self.config.verification_level, VerificationLevel::None) {
            return;
        }
        for decl in &program.decls {
            match decl {
                Decl::Type(t) => self.verify_type_decl(t, sink),
                Decl::Function(f) => self.verify_fn_decl(f, sink),
            }
        }
    }

    fn verify_type_decl(&self, decl: &TypeDecl, sink: &mut DiagnosticSink) {
        let mut facts: Vec<Expr> = Vec::new();
        for invariant in &decl.invariants {
            self.discharge_contract(invariant, &facts, sink);
            facts.push(invariant.expr.clone());
        }
    }

    fn verify_fn_decl(&self, decl: &FnDecl, sink: &mut DiagnosticSink) {
        let mut facts: Vec<Expr> = Vec::new();
        for precondition in &decl.preconditions {
            self.discharge_contract(precondition, &facts, sink);
            facts.push(precondition.expr.clone());
        }

        let result_value = decl.body.tail_expr().cloned();
        for postcondition in &decl.postconditions {
            let substituted = substitute_result(&postcondition.expr, result_value.as_ref());
            let substituted = unwrap_old(&substituted);
            self.discharge(&substituted, &facts, postcondition, sink);
        }
    }

    fn discharge_contract(&self, contract: &Contract, facts: &[Expr], sink: &mut DiagnosticSink) {
        self.discharge(&contract.expr, facts, contract, sink)
    }

    fn discharge(&self, expr: &Expr, facts: &[Expr], contract: &Contract, sink: &mut DiagnosticSink) {
        // Under `Runtime`, every contract is meant to residualize, so
        // proving is skipped entirely rather than letting a provable
        // contract get erased by the emitter.
        let outcome = if matches!(self.config.verification_level, VerificationLevel::Runtime) {
            VerificationOutcome::Unproven
        } else {
            self.try_prove(expr, facts)
        };
        self.report(contract, &outcome, sink);
        contract.set_outcome(outcome);
    }

    fn try_prove(&self, expr: &Expr, facts: &[Expr]) -> VerificationOutcome {
        let expr = expr.unwrap_parens();

        if let Some(value) = eval_const_bool(expr) {
            return if value {
                VerificationOutcome::Proven
            } else {
                VerificationOutcome::Refuted {
                    witness: "the contract reduces to the constant false".into(),
                }
            };
        }

        if is_reflexive_tautology(expr) {
            return VerificationOutcome::Proven;
        }
        if is_reflexive_contradiction(expr) {
            return VerificationOutcome::Refuted {
                witness: "both sides of the comparison are the same expression".into(),
            };
        }

        if facts.iter().any(|f| structurally_equal(f, expr)) {
            return VerificationOutcome::Proven;
        }

        if let Some(outcome) = self.try_monotonic(expr, facts) {
            return outcome;
        }

        match self.oracle.decide(expr, facts) {
            OracleAnswer::Unsat => VerificationOutcome::Proven,
            OracleAnswer::Sat => VerificationOutcome::Refuted {
                witness: "the oracle found a satisfying counterexample".into(),
            },
            OracleAnswer::Unknown => VerificationOutcome::Unproven,
        }
    }

    /// Proves obligations of the shape `a + b >= a` (or `<=`) by
    /// looking for a fact establishing the sign of `b`. Covers the
    /// common "a result built by adding a non-negative amount is at
    /// least as large as the base" pattern.
    fn try_monotonic(&self, expr: &Expr, facts: &[Expr]) -> Option<VerificationOutcome> {
        let ExprKind::Binary { op, left, right } = &expr.kind else {
            return None;
        };
        if !matches!(op, BinOp::GtEq | BinOp::LtEq) {
            return None;
        }
        let left = left.unwrap_parens();
        let ExprKind::Binary {
            op: BinOp::Add,
            left: a,
            right: b,
        } = &left.kind
        else {
            return None;
        };

        let needed = if structurally_equal(a, right) {
            zero_compare(*op, b)
        } else if structurally_equal(b, right) {
            zero_compare(*op, a)
        } else {
            return None;
        };

        if facts.iter().any(|f| structurally_equal(f, &needed)) {
            Some(VerificationOutcome::Proven)
        } else {
            None
        }
    }

    fn report(&self, contract: &Contract, outcome: &VerificationOutcome, sink: &mut DiagnosticSink) {
        match outcome {
            VerificationOutcome::Proven => {}
            VerificationOutcome::Refuted { witness } => {
                sink.push(
                    Diagnostic::error(
                        Pass::Verification,
                        format!("contract is refutable: {witness}"),
                        contract.span.clone(),
                    )
                    .with_contract(contract.text.clone()),
                );
            }
            VerificationOutcome::Unproven => {
                if matches!(self.config.verification_level, VerificationLevel::Full) {
                    sink.push(
                        Diagnostic::error(
                            Pass::Verification,
                            "could not prove this contract statically; `full` requires every contract to be proven".to_string(),
                            contract.span.clone(),
                        )
                        .with_contract(contract.text.clone()),
                    );
                }
            }
        }
    }
}

fn zero_compare(op: BinOp, operand: &Expr) -> Expr {
    let zero = Expr::new(ExprKind::Int(0), Span::default());
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(operand.clone()),
            right: Box::new(zero),
        },
        Span::default(),
    )
}

/// Compares two expressions by shape alone, ignoring source spans and
/// the checker's type annotations. The derived `Expr`/`ExprKind`
/// `PartialEq` can't be used for this: it recurses into the `ty` cell
/// of every nested node, so a synthetic expression built fresh by the
/// verifier would never match an equivalent one the checker has
/// already annotated.
fn structurally_equal(a: &Expr, b: &Expr) -> bool {
    kind_eq(&a.unwrap_parens().kind, &b.unwrap_parens().kind)
}

fn kind_eq(a: &ExprKind, b: &ExprKind) -> bool {
    match (a, b) {
        (ExprKind::Int(x), ExprKind::Int(y)) => x == y,
        (ExprKind::Float(x), ExprKind::Float(y)) => x == y,
        (ExprKind::Str(x), ExprKind::Str(y)) => x == y,
        (ExprKind::Bool(x), ExprKind::Bool(y)) => x == y,
        (ExprKind::Ident(x), ExprKind::Ident(y)) => x == y,
        (
            ExprKind::Binary { op: op1, left: l1, right: r1 },
            ExprKind::Binary { op: op2, left: l2, right: r2 },
        ) => op1 == op2 && structurally_equal(l1, l2) && structurally_equal(r1, r2),
        (ExprKind::Unary { op: op1, operand: o1 }, ExprKind::Unary { op: op2, operand: o2 }) => {
            op1 == op2 && structurally_equal(o1, o2)
        }
        (
            ExprKind::Call { callee: c1, args: a1 },
            ExprKind::Call { callee: c2, args: a2 },
        ) => {
            structurally_equal(c1, c2)
                && a1.len() == a2.len()
                && a1.iter().zip(a2).all(|(x, y)| structurally_equal(x, y))
        }
        (
            ExprKind::Member { object: o1, field: f1 },
            ExprKind::Member { object: o2, field: f2 },
        ) => f1 == f2 && structurally_equal(o1, o2),
        (ExprKind::Array(xs), ExprKind::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| structurally_equal(x, y))
        }
        (ExprKind::Record(xs), ExprKind::Record(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|((n1, v1), (n2, v2))| n1 == n2 && structurally_equal(v1, v2))
        }
        // `When`/`Given` bodies aren't compared structurally: the
        // proof heuristics never need to match against a branching
        // subexpression, only against the flat boolean/arithmetic
        // expressions that make up contracts and facts.
        _ => false,
    }
}

fn is_reflexive_tautology(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Binary { op, left, right } => {
            matches!(op, BinOp::Eq | BinOp::GtEq | BinOp::LtEq) && structurally_equal(left, right)
        }
        _ => false,
    }
}

fn is_reflexive_contradiction(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Binary { op, left, right } => {
            matches!(op, BinOp::NotEq | BinOp::Lt | BinOp::Gt) && structurally_equal(left, right)
        }
        _ => false,
    }
}

/// Replaces every occurrence of the `result` identifier with the
/// function body's tail expression, so a postcondition can be proven
/// against what the function actually returns.
fn substitute_result(expr: &Expr, value: Option<&Expr>) -> Expr {
    expr.rewrite(&|node| match (&node.kind, value) {
        (ExprKind::Ident(name), Some(v)) if name == "result" => Some(v.clone()),
        _ => None,
    })
}

/// Unwraps `old(e)` to `e`. A precise before/after state model would
/// need to track mutation of bindings across the body; this verifier
/// only reasons about the function's final return value, so `old(e)`
/// and `e` are treated identically. Sound whenever `e`'s bindings
/// aren't reassigned before the function returns, which covers every
/// contract this proof engine can otherwise discharge.
fn unwrap_old(expr: &Expr) -> Expr {
    expr.rewrite(&|node| match &node.kind {
        ExprKind::Call { callee, args } if args.len() == 1 => match &callee.kind {
            ExprKind::Ident(name) if name == "old" => Some(unwrap_old(&args[0])),
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn verify(src: &str) -> (Program, DiagnosticSink) {
        let tokens = Lexer::new(src).lex().expect("lex");
        let program = Parser::parse(tokens).expect("parse");
        let mut sink = DiagnosticSink::new();
        crate::typecheck::Checker::new(&program).check(&program, &mut sink);
        let config = Config {
            verification_level: VerificationLevel::Full,
            ..Config::default()
        };
        Verifier::new(&config).verify(&program, &mut sink);
        (program, sink)
    }

    #[test]
    fn proves_postcondition_from_monotonic_addition() {
        let src = "define add(x: Int, y: Int) -> Int\n  expect y >= 0\n  ensure result >= x\ngiven\n  x + y\n";
        let (program, sink) = verify(src);
        assert!(!sink.has_errors(), "{:?}", sink.all());
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function decl");
        };
        assert_eq!(
            f.postconditions[0].outcome(),
            Some(VerificationOutcome::Proven)
        );
    }

    #[test]
    fn refutes_constant_false_contract() {
        let src = "define broken() -> Int\n  ensure 1 > 2\ngiven\n  1\n";
        let (_, sink) = verify(src);
        assert!(sink.has_errors());
    }

    #[test]
    fn leaves_undecidable_contract_unproven_and_errors_in_full_mode() {
        let src = "define f(x: Int) -> Int\n  ensure result > x\ngiven\n  x + 1\n";
        let (program, sink) = verify(src);
        assert!(sink.has_errors());
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function decl");
        };
        assert_eq!(f.postconditions[0].outcome(), Some(VerificationOutcome::Unproven));
    }

    #[test]
    fn runtime_level_never_proves_and_residualizes_every_contract() {
        let src = "define add(x: Int, y: Int) -> Int\n  expect x >= 0\n  expect y >= 0\n  ensure result >= x\ngiven\n  x + y\n";
        let tokens = Lexer::new(src).lex().unwrap();
        let program = Parser::parse(tokens).unwrap();
        let mut sink = DiagnosticSink::new();
        crate::typecheck::Checker::new(&program).check(&program, &mut sink);
        let config = Config {
            verification_level: VerificationLevel::Runtime,
            ..Config::default()
        };
        Verifier::new(&config).verify(&program, &mut sink);
        assert!(!sink.has_errors(), "{:?}", sink.all());
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function decl");
        };
        for pre in &f.preconditions {
            assert_eq!(pre.outcome(), Some(VerificationOutcome::Unproven));
        }
        assert_eq!(f.postconditions[0].outcome(), Some(VerificationOutcome::Unproven));
    }

    #[test]
    fn none_level_skips_verification_entirely() {
        let src = "define broken() -> Int\n  ensure 1 > 2\ngiven\n  1\n";
        let tokens = Lexer::new(src).lex().unwrap();
        let program = Parser::parse(tokens).unwrap();
        let mut sink = DiagnosticSink::new();
        let config = Config {
            verification_level: VerificationLevel::None,
            ..Config::default()
        };
        Verifier::new(&config).verify(&program, &mut sink);
        assert!(!sink.has_errors());
    }

    #[test]
    fn refined_type_invariant_is_checked() {
        let src = "type Percent = Int\n  invariant value >= 0\n  invariant value <= 100\n";
        let (program, sink) = verify(src);
        assert!(!sink.has_errors(), "{:?}", sink.all());
        let Decl::Type(t) = &program.decls[0] else {
            panic!("expected type decl");
        };
        assert_eq!(t.invariants[0].outcome(), Some(VerificationOutcome::Proven));
    }
}
