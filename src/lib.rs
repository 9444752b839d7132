//! Front-end compiler pipeline: lex, parse, type-check, verify,
//! optimize, format, and emit.

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod format;
pub mod lexer;
pub mod optimize;
pub mod parser;
pub mod pipeline;
pub mod typecheck;
pub mod verify;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticSink, Pass, Severity};
pub use pipeline::{Pipeline, Stage};
