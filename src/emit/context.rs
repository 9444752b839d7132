use std::fmt::Write;

/// Output buffer, indentation bookkeeping, and the two pieces of
/// per-emission state the lowering needs: a counter for deterministic
/// match-scrutinee names (`given` nests, so names must not collide) and
/// the name a `result` identifier inside a postcondition should lower
/// to once the function's tail value has been bound to a local.
#[derive(Debug, Clone)]
pub struct EmitContext {
    pub output: String,
    indent_level: usize,
    indent_string: String,
    match_counter: usize,
    pub result_name: Option<String>,
}

impl EmitContext {
    pub fn new() -> Self {
        EmitContext {
            output: String::new(),
            indent_level: 0,
            indent_string: "  ".to_string(),
            match_counter: 0,
            result_name: None,
        }
    }

    pub fn write(&mut self, text: &str) -> Result<(), std::fmt::Error> {
        self.output.write_str(text)
    }

    pub fn write_indent(&mut self) -> Result<(), std::fmt::Error> {
        for _ in 0..self.indent_level {
            self.output.write_str(&self.indent_string)?;
        }
        Ok(())
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn with_indent<F>(&mut self, f: F) -> Result<(), std::fmt::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), std::fmt::Error>,
    {
        self.indent();
        let result = f(self);
        self.dedent();
        result
    }

    pub fn write_newline(&mut self) -> Result<(), std::fmt::Error> {
        self.write("\n")
    }

    pub fn write_indented_line(&mut self, text: &str) -> Result<(), std::fmt::Error> {
        self.write_indent()?;
        self.write(text)?;
        self.write_newline()
    }

    /// A fresh, deterministic name for a `given` scrutinee binding.
    /// Sequential rather than random so emitted output is stable across
    /// runs on the same input, per the no-nondeterministic-identifiers
    /// requirement.
    pub fn fresh_match_name(&mut self) -> String {
        let n = self.match_counter;
        self.match_counter += 1;
        format!("__match{n}")
    }
}

impl Default for EmitContext {
    fn default() -> Self {
        Self::new()
    }
}
