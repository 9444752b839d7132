//! Shared diagnostic buffer threaded across every pass of the pipeline.
//!
//! Every pass appends to the same ordered `Vec<Diagnostic>` instead of
//! returning its own error type directly; this is what lets the driver
//! (and the test suite) observe the diagnostics of a halted pipeline
//! instead of only ever seeing the first pass's failure.

use std::fmt::{self, Display};

/// A 1-based line/column location plus the originating source, so an
/// error can be rendered with a caret-highlighted excerpt.
#[derive(Debug, Clone, Eq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: (usize, usize),
    pub end: (usize, usize),
    pub source: String,
}

impl Default for Span {
    fn default() -> Self {
        Span {
            start: (1, 1),
            end: (1, 1),
            source: String::new(),
        }
    }
}

impl PartialEq for Span {
    fn eq(&self, _other: &Span) -> bool {
        // Positions are metadata, not part of AST identity: two nodes
        // built from different source locations can still be equal.
        true
    }
}

impl Span {
    pub fn new(start: (usize, usize), end: (usize, usize), source: String) -> Self {
        Span { start, end, source }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
            source: self.source.clone(),
        }
    }

    /// Recover the literal source text this span covers, used verbatim
    /// in emitted contract failure messages.
    pub fn text(&self) -> String {
        if self.source.is_empty() {
            return String::new();
        }
        let lines: Vec<&str> = self.source.split('\n').collect();
        if self.start.0 == self.end.0 {
            let line = lines.get(self.start.0 - 1).copied().unwrap_or("");
            let s = self.start.1.saturating_sub(1).min(line.len());
            let e = self.end.1.saturating_sub(1).max(s).min(line.len());
            return line[s..e].to_string();
        }
        let mut out = String::new();
        for ln in self.start.0..=self.end.0 {
            let line = lines.get(ln - 1).copied().unwrap_or("");
            if ln == self.start.0 {
                let s = self.start.1.saturating_sub(1).min(line.len());
                out.push_str(&line[s..]);
            } else if ln == self.end.0 {
                let e = self.end.1.saturating_sub(1).min(line.len());
                out.push_str(&line[..e]);
            } else {
                out.push_str(line);
            }
            if ln != self.end.0 {
                out.push('\n');
            }
        }
        out
    }

    /// Render a caret-highlighted excerpt of the offending source line(s).
    pub fn to_string(&self, msg: impl ToString) -> String {
        let Span { start, end, source } = self;
        if source.is_empty() {
            return format!("{}:{}: {}", start.0, start.1, msg.to_string());
        }

        let lines: Vec<&str> = source.lines().collect();
        let line_idx = start.0.saturating_sub(1).min(lines.len().saturating_sub(1));
        let line_str = lines.get(line_idx).copied().unwrap_or("");

        let margin = format!("{}", end.0).len();
        let fill: String = " ".repeat(margin);

        let caret_col = start.1.saturating_sub(1).min(line_str.len());
        let caret = " ".repeat(caret_col) + "^";

        format!(
            "{fill} |\n{line} |{text}\n{fill} |{caret}--- {msg}",
            fill = fill,
            line = start.0,
            text = line_str,
            caret = caret,
            msg = msg.to_string()
        )
    }
}

/// The pass that produced a diagnostic, so callers can filter the
/// shared buffer down to what a single CLI subcommand cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Pass {
    Lexical,
    Syntactic,
    Semantic,
    Verification,
    Optimization,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub pass: Pass,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// Textual source of a contract/invariant, populated by the
    /// verifier for `Pass::Verification` diagnostics.
    pub contract_text: Option<String>,
}

impl Diagnostic {
    pub fn error(pass: Pass, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            pass,
            severity: Severity::Error,
            message: message.into(),
            span,
            contract_text: None,
        }
    }

    pub fn warning(pass: Pass, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            pass,
            severity: Severity::Warning,
            message: message.into(),
            span,
            contract_text: None,
        }
    }

    pub fn with_contract(mut self, text: impl Into<String>) -> Self {
        self.contract_text = Some(text.into());
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.span.start.0, self.span.start.1, self.message
        )?;
        if let Some(text) = &self.contract_text {
            write!(f, " (contract: `{text}`)")?;
        }
        Ok(())
    }
}

/// Accumulator shared by every pass; order of insertion is source
/// order by construction since each pass walks the tree left to right.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn for_pass(&self, pass: Pass) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.pass == pass).collect()
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
