//! End-to-end tests against the public `Pipeline` API, exercising the
//! lex/parse/check/verify/optimize/emit boundary the way `vbl` does.

use vibelang::ast::{Decl, ExprKind, VerificationOutcome};
use vibelang::config::{Config, VerificationLevel};
use vibelang::lexer::{Lexer, TokenKind};
use vibelang::pipeline::{Pipeline, Stage};

fn full(config: VerificationLevel) -> Config {
    Config {
        verification_level: config,
        ..Config::default()
    }
}

#[test]
fn lexes_nested_indentation_into_balanced_indent_dedent_pairs() {
    let src = "define f()\n  when x\n    g()\n";
    let tokens = Lexer::new(src).lex().expect("lex");
    let kinds: Vec<&TokenKind> = tokens
        .iter()
        .map(|t| &t.kind)
        .filter(|k| !matches!(k, TokenKind::Newline))
        .collect();

    assert_eq!(
        kinds,
        vec![
            &TokenKind::Define,
            &TokenKind::Ident("f".into()),
            &TokenKind::LParen,
            &TokenKind::RParen,
            &TokenKind::Indent,
            &TokenKind::When,
            &TokenKind::Ident("x".into()),
            &TokenKind::Indent,
            &TokenKind::Ident("g".into()),
            &TokenKind::LParen,
            &TokenKind::RParen,
            &TokenKind::Dedent,
            &TokenKind::Dedent,
            &TokenKind::Eof,
        ]
    );
}

#[test]
fn parses_arithmetic_with_standard_precedence() {
    let src = "define f() -> Bool\ngiven\n  1 + 2 * 3 == 7\n";
    let out = Pipeline::run_to(src, &Config::default(), Stage::Parse);
    assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.all());
    let program = out.program.expect("parsed program");
    let Decl::Function(f) = &program.decls[0] else {
        panic!("expected a function declaration");
    };
    let tail = f.body.tail_expr().expect("tail expression");

    let ExprKind::Binary { op: outer_op, left, right } = &tail.kind else {
        panic!("expected top-level binary expression, got {:?}", tail.kind);
    };
    assert_eq!(*outer_op, vibelang::ast::BinOp::Eq);
    assert_eq!(right.kind, ExprKind::Int(7));

    let ExprKind::Binary { op: add_op, left: one, right: mul } = &left.kind else {
        panic!("expected addition on the left of ==, got {:?}", left.kind);
    };
    assert_eq!(*add_op, vibelang::ast::BinOp::Add);
    assert_eq!(one.kind, ExprKind::Int(1));

    let ExprKind::Binary { op: mul_op, left: two, right: three } = &mul.kind else {
        panic!("expected multiplication nested under the addition, got {:?}", mul.kind);
    };
    assert_eq!(*mul_op, vibelang::ast::BinOp::Mul);
    assert_eq!(two.kind, ExprKind::Int(2));
    assert_eq!(three.kind, ExprKind::Int(3));
}

#[test]
fn reports_a_return_type_mismatch() {
    let src = "define bad(x: Int) -> String\ngiven\n  x\n";
    let out = Pipeline::run_to(src, &Config::default(), Stage::Check);
    assert!(out.diagnostics.has_errors());
    let messages: Vec<String> = out
        .diagnostics
        .all()
        .iter()
        .map(|d| d.message.clone())
        .collect();
    assert!(
        messages.iter().any(|m| m.contains("Int") && m.contains("String")),
        "expected a message naming both types, got {messages:?}"
    );
}

#[test]
fn proven_contracts_emit_no_runtime_assertion() {
    let src = "define add(x: Int, y: Int) -> Int\n  expect x >= 0\n  expect y >= 0\n  ensure result >= x\ngiven\n  x + y\n";
    let out = Pipeline::run_to(src, &full(VerificationLevel::Hybrid), Stage::Verify);
    assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.all());
    let program = out.program.expect("checked program");
    let Decl::Function(f) = &program.decls[0] else {
        panic!("expected a function declaration");
    };
    assert_eq!(f.postconditions[0].outcome(), Some(VerificationOutcome::Proven));

    let out = Pipeline::run_to(src, &full(VerificationLevel::Hybrid), Stage::Emit);
    let emitted = out.emitted.expect("emitted source");
    assert!(!emitted.contains("Postcondition failed"));
}

#[test]
fn unproven_postcondition_becomes_a_runtime_assertion() {
    let src = "define halve(x: Int) -> Int\n  ensure result * 2 == x\ngiven\n  x / 2\n";
    let out = Pipeline::run_to(src, &full(VerificationLevel::Hybrid), Stage::Emit);
    assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.all());
    let emitted = out.emitted.expect("emitted source");
    assert!(emitted.contains("Postcondition failed: result * 2 == x"));
}

#[test]
fn full_verification_rejects_the_same_unproven_contract() {
    let src = "define halve(x: Int) -> Int\n  ensure result * 2 == x\ngiven\n  x / 2\n";
    let out = Pipeline::run_to(src, &full(VerificationLevel::Full), Stage::Emit);
    assert!(out.diagnostics.has_errors());
    assert!(out.emitted.is_none());
}

#[test]
fn optimizer_collapses_a_statically_known_branch() {
    let src = "define f() -> Int\ngiven\n  when true\n    1\n  otherwise\n    2\n";
    let out = Pipeline::run_to(src, &Config::default(), Stage::Optimize);
    assert!(!out.diagnostics.has_errors());
    let optimized = out.optimized.expect("optimized program");
    let Decl::Function(f) = &optimized.decls[0] else {
        panic!("expected a function declaration");
    };
    let tail = f.body.tail_expr().expect("tail expression");
    assert_eq!(tail.kind, ExprKind::Int(1));
}

#[test]
fn formatting_a_program_twice_reaches_a_fixed_point() {
    let src = "define  add(x:Int,y:Int)->Int\ngiven\n    x+y\n";
    let once = Pipeline::run_to(src, &Config::default(), Stage::Format)
        .formatted
        .expect("first format");
    let twice = Pipeline::run_to(&once, &Config::default(), Stage::Format)
        .formatted
        .expect("second format");
    assert_eq!(once, twice);
}

#[test]
fn reparsing_formatted_output_reproduces_the_same_ast() {
    let src = "define add(x: Int, y: Int) -> Int\ngiven\n  x + y\n";
    let original = Pipeline::run_to(src, &Config::default(), Stage::Parse)
        .program
        .expect("original parse");
    let formatted = Pipeline::run_to(src, &Config::default(), Stage::Format)
        .formatted
        .expect("formatted source");
    let reparsed = Pipeline::run_to(&formatted, &Config::default(), Stage::Parse)
        .program
        .expect("reparsed program");
    assert_eq!(original, reparsed);
}

#[test]
fn type_checking_is_deterministic_across_repeated_runs() {
    let src = "define bad(x: Int) -> String\ngiven\n  x\n";
    let first: Vec<String> = Pipeline::run_to(src, &Config::default(), Stage::Check)
        .diagnostics
        .all()
        .iter()
        .map(|d| d.message.clone())
        .collect();
    let second: Vec<String> = Pipeline::run_to(src, &Config::default(), Stage::Check)
        .diagnostics
        .all()
        .iter()
        .map(|d| d.message.clone())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn verification_level_none_never_reports_a_refutable_contract() {
    let src = "define broken() -> Int\n  ensure 1 > 2\ngiven\n  1\n";
    let out = Pipeline::run_to(src, &full(VerificationLevel::None), Stage::Emit);
    assert!(!out.diagnostics.has_errors());
    assert!(out.emitted.is_some());
}

#[test]
fn runtime_level_residualizes_a_provable_precondition() {
    let src = "define half(x: Int) -> Int\n  expect x >= 0\ngiven\n  x\n";
    let out = Pipeline::run_to(src, &full(VerificationLevel::Runtime), Stage::Emit);
    assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.all());
    let emitted = out.emitted.expect("emitted source");
    assert!(emitted.contains("Precondition failed: x >= 0"));
}

#[test]
fn formatting_and_emitting_preserve_integral_float_literals() {
    let src = "define f() -> Float\ngiven\n  1.0\n";
    let formatted = Pipeline::run_to(src, &Config::default(), Stage::Format)
        .formatted
        .expect("formatted source");
    assert!(formatted.contains("1.0"));

    let reparsed = Pipeline::run_to(&formatted, &Config::default(), Stage::Parse)
        .program
        .expect("reparsed program");
    let Decl::Function(f) = &reparsed.decls[0] else {
        panic!("expected a function declaration");
    };
    assert_eq!(f.body.tail_expr().unwrap().kind, ExprKind::Float(1.0));
}

#[test]
fn sum_type_declaration_compiles_to_tagged_constructors() {
    let src = "type Shape =\n  | Circle(Int)\n  | Square(Int)\ndefine area(s: Shape) -> Int\ngiven\n  0\n";
    let out = Pipeline::run_to(src, &Config::default(), Stage::Emit);
    assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.all());
    let emitted = out.emitted.expect("emitted source");
    assert!(emitted.contains("function Circle(field0)"));
    assert!(emitted.contains("function Square(field0)"));
    assert!(emitted.starts_with("function Success(value)"));
}
