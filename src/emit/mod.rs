//! Lowers the typed, verified, optimized AST to a textual target
//! program: a small imperative language with first-class closures and
//! tagged records, reached via a fixed runtime prelude of exactly three
//! names — `Success`, `Error`, `Unit` — that the rest of the emitted
//! program is built on top of.

mod context;
mod decl;
mod expr;
mod stmt;

pub use context::EmitContext;

use crate::ast::Program;

/// Anything that can lower itself into an [`EmitContext`].
pub trait Emit {
    fn emit(&self, ctx: &mut EmitContext) -> Result<(), std::fmt::Error>;
}

/// The fixed runtime prelude. Defines exactly the three names the
/// lowering relies on; nothing else may be assumed to exist.
const PRELUDE: &str = "\
function Success(value) { return { tag: \"Success\", value }; }
function Error(err) { return { tag: \"Error\", err }; }
const Unit = { tag: \"Unit\" };
";

/// Emits a whole program: the runtime prelude followed by each
/// declaration in source order, separated by a blank line.
pub fn emit_program(program: &Program) -> String {
    let mut ctx = EmitContext::new();
    ctx.write(PRELUDE).expect("emitting into a String never fails");
    for decl in &program.decls {
        ctx.write_newline().expect("emitting into a String never fails");
        decl.emit(&mut ctx).expect("emitting into a String never fails");
    }
    ctx.output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::typecheck::Checker;

    fn emit_source(src: &str) -> String {
        let tokens = Lexer::new(src).lex().expect("lex");
        let program = Parser::parse(tokens).expect("parse");
        let mut sink = crate::diagnostics::DiagnosticSink::new();
        Checker::new(&program).check(&program, &mut sink);
        emit_program(&program)
    }

    #[test]
    fn emits_prelude_before_any_declaration() {
        let out = emit_source("define id(x: Int) -> Int\ngiven\n  x\n");
        assert!(out.starts_with(PRELUDE));
    }

    #[test]
    fn lowers_function_to_procedure_with_same_name_and_params() {
        let out = emit_source("define add(x: Int, y: Int) -> Int\ngiven\n  x + y\n");
        assert!(out.contains("function add(x, y) {"));
        assert!(out.contains("return (x + y);"));
    }

    #[test]
    fn lowers_unproven_precondition_to_runtime_assertion() {
        let out = emit_source("define half(x: Int) -> Int\n  expect x >= 0\ngiven\n  x\n");
        assert!(out.contains("if (!(x >= 0))"));
        assert!(out.contains("Precondition failed: x >= 0"));
    }

    #[test]
    fn lowers_integral_float_literal_with_a_decimal_point() {
        let out = emit_source("define f() -> Float\ngiven\n  1.0\n");
        assert!(out.contains("return 1.0;"));
    }

    #[test]
    fn lowers_sum_type_to_tagged_constructors() {
        let out = emit_source(
            "type Shape =\n  | Circle(Int)\n  | Square(Int)\ndefine area(s: Shape) -> Int\ngiven\n  0\n",
        );
        assert!(out.contains("function Circle(field0) {"));
        assert!(out.contains("tag: \"Circle\""));
        assert!(out.contains("function Square(field0) {"));
    }
}
