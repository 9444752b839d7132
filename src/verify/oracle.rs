use crate::ast::Expr;

/// What an oracle decided about the satisfiability of an expression
/// given a set of facts assumed true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleAnswer {
    Sat,
    Unsat,
    Unknown,
}

/// An external decision procedure the verifier can fall back on once
/// its own heuristics run out. Kept as a trait so a real SMT backend
/// can be plugged in later without touching the discharge logic.
pub trait Oracle {
    fn decide(&self, expr: &Expr, facts: &[Expr]) -> OracleAnswer;
}

/// The in-process default: no solver is linked in, so every query
/// comes back `Unknown`. Obligations the lightweight heuristics can't
/// settle fall through to a runtime check.
#[derive(Debug, Default)]
pub struct StubOracle;

impl Oracle for StubOracle {
    fn decide(&self, _expr: &Expr, _facts: &[Expr]) -> OracleAnswer {
        OracleAnswer::Unknown
    }
}
