//! Indentation-sensitive tokenizer.
//!
//! The lexer is pure: it consumes the whole source string up front and
//! produces a finite token stream terminated by `Eof`, synthesizing
//! `Indent`/`Dedent` events from an indent stack the way Python's
//! tokenizer does. Mixing tabs into leading whitespace, or indenting
//! by anything other than exactly 2 columns at a time, is a lexical
//! error.

mod token;

pub use token::*;

use std::{error::Error, fmt::Display};

use crate::diagnostics::Span;

const INDENT_WIDTH: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.span.to_string(&self.message).as_str())
    }
}

impl Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    source: String,
    position: usize,
    line: usize,
    col: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            bytes: input.as_bytes(),
            source: input.to_string(),
            position: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.position + offset).copied()
    }

    fn span_point(&self) -> (usize, usize) {
        (self.line, self.col)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input[self.position..].chars().next()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn err(&self, message: impl Into<String>, start: (usize, usize)) -> LexError {
        LexError {
            message: message.into(),
            span: Span::new(start, self.span_point(), self.source.clone()),
        }
    }

    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        loop {
            if self.at_line_start {
                if self.position >= self.bytes.len() {
                    break;
                }
                if self.handle_line_start()? {
                    continue;
                }
            }

            let Some(b) = self.peek_byte() else { break };

            match b {
                b' ' | b'\t' => {
                    self.advance();
                }
                b'\r' => {
                    self.advance();
                }
                b'\n' => {
                    let start = self.span_point();
                    self.advance();
                    self.push(TokenKind::Newline, "\n", start);
                    self.at_line_start = true;
                }
                b'#' => self.lex_comment()?,
                b'"' => self.lex_string()?,
                b'0'..=b'9' => self.lex_number()?,
                b if is_ident_start(b) => self.lex_ident()?,
                _ => self.lex_operator()?,
            }
        }

        let last_point = self.span_point();
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, "", last_point);
        }
        self.push(TokenKind::Eof, "", last_point);

        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>, start: (usize, usize)) {
        let span = Span::new(start, self.span_point(), self.source.clone());
        self.tokens.push(Token::new(kind, lexeme, span));
    }

    /// Measures leading whitespace of the current physical line,
    /// reconciles it against the indent stack, and reports whether the
    /// line was entirely blank/comment-only (and thus should be
    /// skipped without starting real tokenization).
    fn handle_line_start(&mut self) -> LexResult<bool> {
        let line_start = self.span_point();
        let mut indent = 0usize;
        let mut cursor = self.position;
        let mut saw_tab = false;

        while let Some(b) = self.bytes.get(cursor) {
            match b {
                b' ' => {
                    indent += 1;
                    cursor += 1;
                }
                b'\t' => {
                    saw_tab = true;
                    cursor += 1;
                }
                _ => break,
            }
        }

        let rest_is_blank = matches!(self.bytes.get(cursor), None | Some(b'\n') | Some(b'\r'));
        let rest_is_comment = self.bytes.get(cursor) == Some(&b'#');

        if saw_tab && !(rest_is_blank) {
            return Err(self.err(
                "tabs are not permitted in leading whitespace",
                line_start,
            ));
        }

        if rest_is_blank || rest_is_comment {
            // Blank and comment-only lines never trigger indent events.
            for _ in 0..(cursor - self.position) {
                self.advance();
            }
            if rest_is_comment {
                self.lex_comment()?;
            }
            if self.peek_byte() == Some(b'\n') {
                self.advance();
            } else if self.position >= self.bytes.len() {
                return Ok(false);
            }
            return Ok(true);
        }

        for _ in 0..(cursor - self.position) {
            self.advance();
        }

        let top = *self.indent_stack.last().unwrap();
        if indent > top {
            if indent != top + INDENT_WIDTH {
                return Err(self.err(
                    format!(
                        "indentation must increase by exactly {INDENT_WIDTH} spaces, found {} extra",
                        indent - top
                    ),
                    line_start,
                ));
            }
            self.indent_stack.push(indent);
            self.push(TokenKind::Indent, "", line_start);
        } else if indent < top {
            while *self.indent_stack.last().unwrap() > indent {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent, "", line_start);
            }
            if *self.indent_stack.last().unwrap() != indent {
                return Err(self.err("unindent does not match any outer indentation level", line_start));
            }
        }

        self.at_line_start = false;
        Ok(false)
    }

    fn lex_comment(&mut self) -> LexResult<()> {
        let start = self.span_point();
        self.advance(); // first '#'
        if self.peek_byte() == Some(b'#') {
            self.advance(); // second '#'
            loop {
                match self.peek_byte() {
                    None => return Err(self.err("unterminated block comment", start)),
                    Some(b'#') if self.peek_at(1) == Some(b'#') => {
                        self.advance();
                        self.advance();
                        break;
                    }
                    Some(_) => {
                        self.advance();
                    }
                }
            }
        } else {
            while let Some(b) = self.peek_byte() {
                if b == b'\n' {
                    break;
                }
                self.advance();
            }
        }
        Ok(())
    }

    fn lex_string(&mut self) -> LexResult<()> {
        let start = self.span_point();
        self.advance(); // opening quote
        let mut raw = String::new();
        loop {
            match self.peek_byte() {
                None => return Err(self.err("unterminated string literal", start)),
                Some(b'\n') => return Err(self.err("unterminated string literal", start)),
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    raw.push(self.advance().unwrap());
                    match self.peek_byte() {
                        Some(_) => raw.push(self.advance().unwrap()),
                        None => return Err(self.err("unterminated string literal", start)),
                    }
                }
                Some(_) => raw.push(self.advance().unwrap()),
            }
        }

        let value = unescape::unescape(&raw)
            .ok_or_else(|| self.err("invalid escape sequence in string literal", start))?;
        self.push(TokenKind::Str(value), format!("\"{raw}\""), start);
        Ok(())
    }

    fn lex_number(&mut self) -> LexResult<()> {
        let start = self.span_point();
        let mut lexeme = String::new();
        while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            lexeme.push(self.advance().unwrap());
        }

        if self.peek_byte() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            lexeme.push(self.advance().unwrap()); // '.'
            while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                lexeme.push(self.advance().unwrap());
            }
            let value: f64 = lexeme
                .parse()
                .map_err(|_| self.err("malformed float literal", start))?;
            self.push(TokenKind::Float(value), lexeme, start);
        } else {
            let value: i64 = lexeme
                .parse()
                .map_err(|_| self.err("malformed integer literal", start))?;
            self.push(TokenKind::Int(value), lexeme, start);
        }
        Ok(())
    }

    fn lex_ident(&mut self) -> LexResult<()> {
        let start = self.span_point();
        let mut lexeme = String::new();
        while let Some(b) = self.peek_byte() {
            if is_ident_continue(b) {
                lexeme.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        let kind = TokenKind::keyword(&lexeme).unwrap_or_else(|| TokenKind::Ident(lexeme.clone()));
        self.push(kind, lexeme, start);
        Ok(())
    }

    fn lex_operator(&mut self) -> LexResult<()> {
        let start = self.span_point();
        let two = (self.peek_byte(), self.peek_at(1));
        let (kind, len): (TokenKind, usize) = match two {
            (Some(b'-'), Some(b'>')) => (TokenKind::Arrow, 2),
            (Some(b'='), Some(b'=')) => (TokenKind::EqEq, 2),
            (Some(b'!'), Some(b'=')) => (TokenKind::NotEq, 2),
            (Some(b'<'), Some(b'=')) => (TokenKind::LtEq, 2),
            (Some(b'>'), Some(b'=')) => (TokenKind::GtEq, 2),
            (Some(b'&'), Some(b'&')) => (TokenKind::AndAnd, 2),
            (Some(b'|'), Some(b'|')) => (TokenKind::OrOr, 2),
            (Some(b'('), _) => (TokenKind::LParen, 1),
            (Some(b')'), _) => (TokenKind::RParen, 1),
            (Some(b'['), _) => (TokenKind::LBracket, 1),
            (Some(b']'), _) => (TokenKind::RBracket, 1),
            (Some(b'{'), _) => (TokenKind::LBrace, 1),
            (Some(b'}'), _) => (TokenKind::RBrace, 1),
            (Some(b':'), _) => (TokenKind::Colon, 1),
            (Some(b','), _) => (TokenKind::Comma, 1),
            (Some(b'.'), _) => (TokenKind::Dot, 1),
            (Some(b'|'), _) => (TokenKind::Pipe, 1),
            (Some(b'='), _) => (TokenKind::Assign, 1),
            (Some(b'+'), _) => (TokenKind::Plus, 1),
            (Some(b'-'), _) => (TokenKind::Minus, 1),
            (Some(b'*'), _) => (TokenKind::Star, 1),
            (Some(b'/'), _) => (TokenKind::Slash, 1),
            (Some(b'%'), _) => (TokenKind::Percent, 1),
            (Some(b'<'), _) => (TokenKind::Lt, 1),
            (Some(b'>'), _) => (TokenKind::Gt, 1),
            (Some(b'!'), _) => (TokenKind::Bang, 1),
            (Some(c), _) => {
                return Err(self.err(format!("illegal character '{}'", c as char), start));
            }
            (None, _) => return Ok(()),
        };

        let mut lexeme = String::new();
        for _ in 0..len {
            lexeme.push(self.advance().unwrap());
        }
        self.push(kind, lexeme, start);
        Ok(())
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !matches!(k, TokenKind::Newline))
            .collect()
    }

    #[test]
    fn lexes_indentation_scenario_s1() {
        let src = "define f()\n  when x\n    g()\n";
        let kinds = kinds(src);
        use TokenKind::*;
        assert_eq!(
            kinds,
            vec![
                Define,
                Ident("f".into()),
                LParen,
                RParen,
                Indent,
                When,
                Ident("x".into()),
                Indent,
                Ident("g".into()),
                LParen,
                RParen,
                Dedent,
                Dedent,
                Eof,
            ]
        );
    }

    #[test]
    fn rejects_tabs_in_indentation() {
        let src = "define f()\n\twhen x\n";
        assert!(Lexer::new(src).lex().is_err());
    }

    #[test]
    fn rejects_misaligned_dedent() {
        let src = "define f()\n  when x\n g()\n";
        assert!(Lexer::new(src).lex().is_err());
    }

    #[test]
    fn skips_blank_and_comment_only_lines_without_indent_events() {
        let src = "define f()\n  # a comment\n\n  x\n";
        let kinds = kinds(src);
        use TokenKind::*;
        assert_eq!(
            kinds,
            vec![
                Define,
                Ident("f".into()),
                LParen,
                RParen,
                Indent,
                Ident("x".into()),
                Dedent,
                Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_escapes() {
        let src = "\"a\\nb\"\n";
        let toks = Lexer::new(src).lex().unwrap();
        assert_eq!(toks[0].kind, TokenKind::Str("a\nb".into()));
    }

    #[test]
    fn maximal_munch_on_operators() {
        let kinds = kinds("a -> b == c\n");
        use TokenKind::*;
        assert_eq!(
            kinds,
            vec![Ident("a".into()), Arrow, Ident("b".into()), EqEq, Ident("c".into())]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(Lexer::new("\"abc\n").lex().is_err());
    }
}
