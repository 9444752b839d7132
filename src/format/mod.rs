//! The canonical formatter: renders a parsed [`Program`](crate::ast::Program)
//! back to source text in exactly one way, independent of how the
//! original was laid out. Unlike a formatter that preserves the
//! author's blank lines and wrapping, this one only ever emits a single
//! blank line between top-level declarations and never auto-inserts
//! parentheses beyond what the parser already recorded as an explicit
//! `Paren` node.

mod context;
mod decl;
mod expr;
mod stmt;

pub use context::FormatterContext;

use crate::ast::Program;
use crate::config::Config;

/// Anything that can render itself into a [`FormatterContext`].
pub trait Format {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error>;
}

/// Formats a whole program using the indent width from `config`.
pub fn format_program(program: &Program, config: &Config) -> String {
    let mut ctx = FormatterContext::with_indent_size(config.formatter_indent_width);
    program
        .format(&mut ctx)
        .expect("formatting into a String never fails");
    ctx.output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn format_source(src: &str) -> String {
        let tokens = Lexer::new(src).lex().expect("lex");
        let program = Parser::parse(tokens).expect("parse");
        format_program(&program, &Config::default())
    }

    #[test]
    fn formats_simple_function_with_canonical_indent() {
        let out = format_source("define add(x: Int, y: Int) -> Int\ngiven\n  x + y\n");
        assert_eq!(out, "define add(x: Int, y: Int) -> Int\ngiven\n  x + y\n");
    }

    #[test]
    fn renders_contracts_indented_under_signature() {
        let out = format_source(
            "define half(x: Int) -> Int\n  expect x >= 0\n  ensure result >= 0\ngiven\n  x\n",
        );
        assert_eq!(
            out,
            "define half(x: Int) -> Int\n  expect x >= 0\n  ensure result >= 0\ngiven\n  x\n"
        );
    }

    #[test]
    fn separates_top_level_declarations_with_one_blank_line() {
        let out = format_source(
            "define one() -> Int\ngiven\n  1\ndefine two() -> Int\ngiven\n  2\n",
        );
        assert_eq!(
            out,
            "define one() -> Int\ngiven\n  1\n\ndefine two() -> Int\ngiven\n  2\n"
        );
    }

    #[test]
    fn preserves_explicit_parens_only() {
        let out = format_source("define f(x: Int) -> Int\ngiven\n  (x + 1) * 2\n");
        assert_eq!(out, "define f(x: Int) -> Int\ngiven\n  (x + 1) * 2\n");
    }

    #[test]
    fn renders_integral_float_literals_with_a_decimal_point() {
        let out = format_source("define f() -> Float\ngiven\n  1.0\n");
        assert_eq!(out, "define f() -> Float\ngiven\n  1.0\n");
    }
}
