//! The `vbl` driver: a thin CLI shell around `vibelang::Pipeline`,
//! one subcommand per stage boundary the core exposes.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::debug;

use vibelang::config::{Config, VerificationLevel};
use vibelang::diagnostics::{Diagnostic, DiagnosticSink, Severity};
use vibelang::pipeline::{Pipeline, Stage};

#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log internal pipeline progress to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// How hard the verifier should try before falling back to a
    /// residual runtime check.
    #[arg(long, global = true, default_value = "hybrid")]
    verification_level: VerificationLevel,

    /// Oracle budget in milliseconds, for a future SMT-backed oracle.
    #[arg(long, global = true, default_value_t = 1000)]
    verification_timeout_ms: u64,

    /// Indentation width used by `fmt` and `optimize`.
    #[arg(long, global = true, default_value_t = 2)]
    indent_width: usize,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Dump the token stream for a source file.
    Lex { file: PathBuf },
    /// Dump the parsed AST for a source file.
    Parse { file: PathBuf },
    /// Run the type checker and report diagnostics.
    Check { file: PathBuf },
    /// Run the verifier and report which contracts were proven.
    Verify { file: PathBuf },
    /// Optimize, then print the result as canonical source.
    Optimize { file: PathBuf },
    /// Print the canonical formatting of a source file.
    Fmt { file: PathBuf },
    /// Lower to target source text.
    Compile { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        simple_logger::init_with_level(log::Level::Debug).unwrap();
    }

    let config = Config {
        verification_level: cli.verification_level,
        verification_timeout_ms: cli.verification_timeout_ms,
        formatter_indent_width: cli.indent_width,
    };

    let file = match &cli.command {
        Command::Lex { file }
        | Command::Parse { file }
        | Command::Check { file }
        | Command::Verify { file }
        | Command::Optimize { file }
        | Command::Fmt { file }
        | Command::Compile { file } => file,
    };

    debug!("reading {}", file.display());
    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}: {err}", "error".red().bold());
            return ExitCode::FAILURE;
        }
    };

    match &cli.command {
        Command::Lex { .. } => run_lex(&source, &config),
        Command::Parse { .. } => run_parse(&source, &config),
        Command::Check { .. } => run_check(&source, &config),
        Command::Verify { .. } => run_verify(&source, &config),
        Command::Optimize { .. } => run_optimize(&source, &config),
        Command::Fmt { .. } => run_fmt(&source, &config),
        Command::Compile { .. } => run_compile(&source, &config),
    }
}

fn run_lex(source: &str, config: &Config) -> ExitCode {
    debug!("running pipeline to the lex stage");
    let out = Pipeline::run_to(source, config, Stage::Lex);
    for token in &out.tokens {
        println!(
            "{}:{} {:?} {:?}",
            token.span.start.0, token.span.start.1, token.kind, token.lexeme
        );
    }
    report(&out.diagnostics)
}

fn run_parse(source: &str, config: &Config) -> ExitCode {
    debug!("running pipeline to the parse stage");
    let out = Pipeline::run_to(source, config, Stage::Parse);
    if let Some(program) = &out.program {
        println!("{program:#?}");
    }
    report(&out.diagnostics)
}

fn run_check(source: &str, config: &Config) -> ExitCode {
    debug!("running pipeline to the check stage");
    let out = Pipeline::run_to(source, config, Stage::Check);
    report(&out.diagnostics)
}

fn run_verify(source: &str, config: &Config) -> ExitCode {
    debug!("running pipeline to the verify stage");
    let out = Pipeline::run_to(source, config, Stage::Verify);
    if let Some(program) = &out.program {
        print_verification_report(program);
    }
    report(&out.diagnostics)
}

fn run_optimize(source: &str, config: &Config) -> ExitCode {
    debug!("running pipeline to the optimize stage");
    let out = Pipeline::run_to(source, config, Stage::Optimize);
    if let Some(optimized) = &out.optimized {
        print!("{}", vibelang::format::format_program(optimized, config));
    }
    report(&out.diagnostics)
}

fn run_fmt(source: &str, config: &Config) -> ExitCode {
    debug!("running pipeline to the check stage for formatting");
    let out = Pipeline::run_to(source, config, Stage::Check);
    if let Some(program) = &out.program {
        print!("{}", vibelang::format::format_program(program, config));
    }
    report(&out.diagnostics)
}

fn run_compile(source: &str, config: &Config) -> ExitCode {
    debug!("running pipeline to the emit stage");
    let out = Pipeline::run_to(source, config, Stage::Emit);
    if let Some(emitted) = &out.emitted {
        print!("{emitted}");
    }
    report(&out.diagnostics)
}

fn print_verification_report(program: &vibelang::ast::Program) {
    use vibelang::ast::{Decl, VerificationOutcome};

    for decl in &program.decls {
        match decl {
            Decl::Type(t) => {
                for invariant in &t.invariants {
                    println!(
                        "{}.{}: {}",
                        t.name,
                        invariant.text,
                        outcome_label(invariant.outcome())
                    );
                }
            }
            Decl::Function(f) => {
                for pre in &f.preconditions {
                    println!("{}: expect {}: {}", f.name, pre.text, outcome_label(pre.outcome()));
                }
                for post in &f.postconditions {
                    println!(
                        "{}: ensure {}: {}",
                        f.name,
                        post.text,
                        outcome_label(post.outcome())
                    );
                }
            }
        }
    }

    fn outcome_label(outcome: Option<VerificationOutcome>) -> &'static str {
        match outcome {
            Some(VerificationOutcome::Proven) => "proven",
            Some(VerificationOutcome::Unproven) | None => "runtime",
            Some(VerificationOutcome::Refuted { .. }) => "failed",
        }
    }
}

fn report(diagnostics: &DiagnosticSink) -> ExitCode {
    for diagnostic in diagnostics.all() {
        print_diagnostic(diagnostic);
    }
    if diagnostics.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let label = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Note => "note".dimmed(),
    };
    eprintln!("{label}: {}", diagnostic.span.to_string(&diagnostic.message));
}
