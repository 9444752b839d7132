//! Orchestrates the front-end passes in order, threading a single
//! [`DiagnosticSink`] through all of them and halting at the first one
//! that raises an error-severity diagnostic.

use crate::ast::Program;
use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Pass};
use crate::lexer::{Lexer, Token};
use crate::optimize::Optimizer;
use crate::parser::Parser;
use crate::typecheck::Checker;
use crate::verify::Verifier;

/// How far through the pipeline a caller wants to run. Each variant
/// includes everything before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Parse,
    Check,
    Verify,
    Optimize,
    Format,
    Emit,
}

/// The accumulated result of running the pipeline up to some [`Stage`].
/// Fields past the requested stage are left empty/`None`.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub tokens: Vec<Token>,
    pub program: Option<Program>,
    pub optimized: Option<Program>,
    pub formatted: Option<String>,
    pub emitted: Option<String>,
    pub diagnostics: DiagnosticSink,
}

pub struct Pipeline;

impl Pipeline {
    /// Runs the pipeline on `source` up to (and including) `stage`,
    /// normalizing line endings first. Stops early if an earlier pass
    /// already produced an error-severity diagnostic.
    pub fn run_to(source: &str, config: &Config, stage: Stage) -> PipelineOutput {
        let normalized = normalize_line_endings(source);
        let mut out = PipelineOutput::default();

        let tokens = match Lexer::new(&normalized).lex() {
            Ok(tokens) => tokens,
            Err(err) => {
                out.diagnostics.push(Diagnostic::error(
                    Pass::Lexical,
                    err.message.clone(),
                    err.span.clone(),
                ));
                return out;
            }
        };
        out.tokens = tokens.clone();
        if stage == Stage::Lex {
            return out;
        }

        let program = match Parser::parse(tokens) {
            Ok(program) => program,
            Err(err) => {
                out.diagnostics.push(Diagnostic::error(
                    Pass::Syntactic,
                    err.message.clone(),
                    err.span.clone().unwrap_or_default(),
                ));
                return out;
            }
        };
        if stage == Stage::Parse {
            out.program = Some(program);
            return out;
        }

        Checker::new(&program).check(&program, &mut out.diagnostics);
        if out.diagnostics.has_errors() || stage == Stage::Check {
            out.program = Some(program);
            return out;
        }

        Verifier::new(config).verify(&program, &mut out.diagnostics);
        if out.diagnostics.has_errors() || stage == Stage::Verify {
            out.program = Some(program);
            return out;
        }

        let optimizer = Optimizer::new();
        let optimized = optimizer.optimize(&program);
        out.program = Some(program);
        if stage == Stage::Optimize {
            out.optimized = Some(optimized);
            return out;
        }

        if stage == Stage::Format {
            out.formatted = Some(crate::format::format_program(&optimized, config));
            out.optimized = Some(optimized);
            return out;
        }

        out.emitted = Some(crate::emit::emit_program(&optimized));
        out.optimized = Some(optimized);
        out
    }
}

/// `\r\n` and bare `\r` both normalize to `\n` before lexing, so the
/// lexer never needs to know the source file's line-ending convention.
fn normalize_line_endings(source: &str) -> String {
    source.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halts_at_lex_stage_on_illegal_indentation() {
        let out = Pipeline::run_to("define f()\n\twhen x\n", &Config::default(), Stage::Emit);
        assert!(out.diagnostics.has_errors());
        assert!(out.program.is_none());
    }

    #[test]
    fn halts_before_verify_when_type_checking_fails() {
        let src = "define f() -> Int\ngiven\n  \"not an int\"\n";
        let out = Pipeline::run_to(src, &Config::default(), Stage::Emit);
        assert!(out.diagnostics.has_errors());
        assert!(out.emitted.is_none());
    }

    #[test]
    fn runs_end_to_end_on_a_well_formed_program() {
        let src = "define add(x: Int, y: Int) -> Int\ngiven\n  x + y\n";
        let out = Pipeline::run_to(src, &Config::default(), Stage::Emit);
        assert!(!out.diagnostics.has_errors());
        assert!(out.emitted.unwrap().contains("function add(x, y)"));
    }

    #[test]
    fn normalizes_crlf_before_lexing() {
        let src = "define f() -> Int\r\ngiven\r\n  1\r\n";
        let out = Pipeline::run_to(src, &Config::default(), Stage::Parse);
        assert!(!out.diagnostics.has_errors());
        assert!(out.program.is_some());
    }
}
