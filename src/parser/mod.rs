//! Recursive-descent parser with precedence climbing for expressions.
//!
//! Consumes the flat token stream produced by the lexer (`Indent`/
//! `Dedent`/`Newline` included) and builds the tagged tree in one pass,
//! with no backtracking beyond the bounded lookahead each production
//! needs. Stops at the first error, mirroring the lexer.

mod cursor;

use std::error::Error;
use std::fmt::{self, Display};

use crate::ast::*;
use crate::diagnostics::Span;
use crate::lexer::{Token, TokenKind};

use cursor::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    pub fn eof(item: &str) -> ParseError {
        ParseError {
            message: format!("unexpected end of input while parsing {item}"),
            span: None,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => f.write_str(span.to_string(&self.message).as_str()),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    cursor: Cursor,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
        }
    }

    pub fn parse(tokens: Vec<Token>) -> ParseResult<Program> {
        Parser::new(tokens).parse_program()
    }

    fn here(&self) -> Span {
        self.cursor.peek().span.clone()
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            span: Some(self.here()),
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.cursor.check(kind)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ParseResult<Token> {
        if self.check(&kind) {
            Ok(self.cursor.advance())
        } else {
            let found = &self.cursor.peek().kind;
            Err(self.error(format!("expected {what}, found {found:?}")))
        }
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<(String, Span)> {
        match self.cursor.peek().kind.clone() {
            TokenKind::Ident(name) => {
                let span = self.here();
                self.cursor.advance();
                Ok((name, span))
            }
            other => Err(self.error(format!("expected {what}, found {other:?}"))),
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.cursor.advance();
            true
        } else {
            false
        }
    }

    // ---- top level ----------------------------------------------------

    fn parse_program(&mut self) -> ParseResult<Program> {
        let mut program = Program::default();
        while !self.check(&TokenKind::Eof) {
            if self.check(&TokenKind::Import) {
                program.imports.push(self.parse_import()?);
            } else {
                program.decls.push(self.parse_decl()?);
            }
        }
        Ok(program)
    }

    fn parse_import(&mut self) -> ParseResult<Import> {
        let start = self.here();
        self.expect(TokenKind::Import, "import")?;
        let mut path = Vec::new();
        let (first, _) = self.expect_ident("module path segment")?;
        path.push(first);
        while self.eat(&TokenKind::Dot) {
            let (seg, _) = self.expect_ident("module path segment")?;
            path.push(seg);
        }
        let end = self.here();
        self.expect(TokenKind::Newline, "newline after import")?;
        Ok(Import {
            path,
            span: start.merge(&end),
        })
    }

    fn parse_decl(&mut self) -> ParseResult<Decl> {
        if self.check(&TokenKind::Type) {
            Ok(Decl::Type(self.parse_type_decl()?))
        } else if self.check(&TokenKind::Define) {
            Ok(Decl::Function(self.parse_fn_decl()?))
        } else {
            Err(self.error("expected a type or function declaration"))
        }
    }

    // ---- type declarations ---------------------------------------------

    fn parse_type_decl(&mut self) -> ParseResult<TypeDecl> {
        let start = self.here();
        self.expect(TokenKind::Type, "type")?;
        let (name, _) = self.expect_ident("type name")?;

        let mut type_params = Vec::new();
        while let TokenKind::Ident(param) = self.cursor.peek().kind.clone() {
            type_params.push(param);
            self.cursor.advance();
        }

        self.expect(TokenKind::Assign, "'=' in type declaration")?;
        let (def, invariants) = self.parse_type_body()?;
        let end = self.here();

        Ok(TypeDecl {
            name,
            type_params,
            def,
            invariants,
            span: start.merge(&end),
        })
    }

    fn parse_type_body(&mut self) -> ParseResult<(TypeDef, Vec<Contract>)> {
        if self.check(&TokenKind::Newline) {
            self.cursor.advance();
            self.expect(TokenKind::Indent, "indented type body")?;
            let mut variants = Vec::new();
            let mut invariants = Vec::new();
            loop {
                if self.check(&TokenKind::Pipe) {
                    variants.push(self.parse_variant()?);
                } else if self.check(&TokenKind::Invariant) {
                    invariants.push(self.parse_invariant_line(ContractKind::Invariant)?);
                } else {
                    break;
                }
            }
            self.expect(TokenKind::Dedent, "end of type body")?;
            Ok((TypeDef::Sum(variants), invariants))
        } else {
            let base = self.parse_type_expr()?;
            self.expect(TokenKind::Newline, "newline after type definition")?;
            let mut invariants = Vec::new();
            if self.eat(&TokenKind::Indent) {
                while self.check(&TokenKind::Invariant) {
                    invariants.push(self.parse_invariant_line(ContractKind::Invariant)?);
                }
                self.expect(TokenKind::Dedent, "end of invariant block")?;
            }
            let def = if invariants.is_empty() {
                TypeDef::Alias(base)
            } else {
                TypeDef::Refined { base }
            };
            Ok((def, invariants))
        }
    }

    fn parse_variant(&mut self) -> ParseResult<Variant> {
        let start = self.here();
        self.expect(TokenKind::Pipe, "'|'")?;
        let (name, _) = self.expect_ident("variant name")?;
        let mut payload = Vec::new();
        if self.eat(&TokenKind::LParen) {
            if !self.check(&TokenKind::RParen) {
                loop {
                    payload.push(self.parse_type_expr()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "')' after variant payload")?;
        }
        let end = self.here();
        self.expect(TokenKind::Newline, "newline after variant")?;
        Ok(Variant {
            name,
            payload,
            span: start.merge(&end),
        })
    }

    fn parse_invariant_line(&mut self, kind: ContractKind) -> ParseResult<Contract> {
        let start = self.here();
        self.expect(TokenKind::Invariant, "invariant")?;
        let expr = self.parse_expr()?;
        let text = expr.span.text();
        let end = self.here();
        self.expect(TokenKind::Newline, "newline after invariant")?;
        Ok(Contract::new(kind, expr, text, start.merge(&end)))
    }

    // ---- function declarations -----------------------------------------

    fn parse_fn_decl(&mut self) -> ParseResult<FnDecl> {
        let start = self.here();
        self.expect(TokenKind::Define, "define")?;
        let (name, _) = self.expect_ident("function name")?;
        self.expect(TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let pstart = self.here();
                let (pname, _) = self.expect_ident("parameter name")?;
                self.expect(TokenKind::Colon, "':' after parameter name")?;
                let pty = self.parse_type_expr()?;
                let pend = self.here();
                params.push(Param {
                    name: pname,
                    ty: pty,
                    span: pstart.merge(&pend),
                });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after parameters")?;
        self.expect(TokenKind::Arrow, "'->' before return type")?;
        let return_type = self.parse_type_expr()?;
        self.expect(TokenKind::Newline, "newline after function signature")?;

        let mut preconditions = Vec::new();
        let mut postconditions = Vec::new();
        if self.eat(&TokenKind::Indent) {
            loop {
                if self.check(&TokenKind::Expect) {
                    preconditions.push(self.parse_contract_line(
                        TokenKind::Expect,
                        ContractKind::Precondition,
                    )?);
                } else if self.check(&TokenKind::Ensure) {
                    postconditions.push(self.parse_contract_line(
                        TokenKind::Ensure,
                        ContractKind::Postcondition,
                    )?);
                } else {
                    break;
                }
            }
            self.expect(TokenKind::Dedent, "end of contract block")?;
        }

        self.expect(TokenKind::Given, "'given' to introduce the function body")?;
        self.expect(TokenKind::Newline, "newline after 'given'")?;
        self.expect(TokenKind::Indent, "indented function body")?;
        let body = self.parse_block_body()?;
        self.expect(TokenKind::Dedent, "end of function body")?;
        let end = self.here();

        Ok(FnDecl {
            name,
            params,
            return_type,
            preconditions,
            postconditions,
            body,
            span: start.merge(&end),
        })
    }

    fn parse_contract_line(
        &mut self,
        keyword: TokenKind,
        kind: ContractKind,
    ) -> ParseResult<Contract> {
        let start = self.here();
        self.expect(keyword, "contract keyword")?;
        let expr = self.parse_expr()?;
        let text = expr.span.text();
        let end = self.here();
        self.expect(TokenKind::Newline, "newline after contract")?;
        Ok(Contract::new(kind, expr, text, start.merge(&end)))
    }

    // ---- statements and blocks ------------------------------------------

    fn parse_block_body(&mut self) -> ParseResult<Block> {
        let start = self.here();
        let mut statements = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.check(&TokenKind::Eof) {
            statements.push(self.parse_stmt()?);
            // A statement whose value is itself an indented block (when,
            // given) has already consumed its own trailing newline as
            // part of closing that block; only a single-line statement
            // needs one eaten here.
            if self.check(&TokenKind::Newline) {
                self.cursor.advance();
            } else if !self.check(&TokenKind::Dedent) && !self.check(&TokenKind::Eof) {
                return Err(self.error("expected newline after statement"));
            }
        }
        let end = self.here();
        Ok(Block::new(statements, start.merge(&end)))
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        if self.check(&TokenKind::Let) {
            let start = self.here();
            self.cursor.advance();
            let (name, _) = self.expect_ident("binding name")?;
            let annotation = if self.eat(&TokenKind::Colon) {
                Some(self.parse_type_expr()?)
            } else {
                None
            };
            self.expect(TokenKind::Assign, "'=' in let binding")?;
            let value = self.parse_expr()?;
            let end = self.here();
            return Ok(Stmt::Let {
                name,
                annotation,
                value,
                span: start.merge(&end),
            });
        }

        let start = self.here();
        let expr = self.parse_expr()?;
        if self.check(&TokenKind::Assign) {
            let target = match &expr.kind {
                ExprKind::Ident(name) => name.clone(),
                _ => return Err(self.error("assignment target must be an identifier")),
            };
            self.cursor.advance();
            let value = self.parse_expr()?;
            let end = self.here();
            Ok(Stmt::Assign {
                target,
                value,
                span: start.merge(&end),
            })
        } else {
            Ok(Stmt::Expr(expr))
        }
    }

    // ---- expressions: precedence climbing -------------------------------

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::OrOr) {
            self.cursor.advance();
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::AndAnd) {
            self.cursor.advance();
            let right = self.parse_equality()?;
            left = binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = if self.check(&TokenKind::EqEq) {
                BinOp::Eq
            } else if self.check(&TokenKind::NotEq) {
                BinOp::NotEq
            } else {
                break;
            };
            self.cursor.advance();
            let right = self.parse_comparison()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = if self.check(&TokenKind::Lt) {
                BinOp::Lt
            } else if self.check(&TokenKind::Gt) {
                BinOp::Gt
            } else if self.check(&TokenKind::LtEq) {
                BinOp::LtEq
            } else if self.check(&TokenKind::GtEq) {
                BinOp::GtEq
            } else {
                break;
            };
            self.cursor.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.check(&TokenKind::Plus) {
                BinOp::Add
            } else if self.check(&TokenKind::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            self.cursor.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.check(&TokenKind::Star) {
                BinOp::Mul
            } else if self.check(&TokenKind::Slash) {
                BinOp::Div
            } else if self.check(&TokenKind::Percent) {
                BinOp::Mod
            } else {
                break;
            };
            self.cursor.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.here();
        if self.eat(&TokenKind::Minus) {
            let operand = self.parse_unary()?;
            let end = operand.span.clone();
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                },
                start.merge(&end),
            ));
        }
        if self.eat(&TokenKind::Bang) {
            let operand = self.parse_unary()?;
            let end = operand.span.clone();
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                },
                start.merge(&end),
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let start = self.here();
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                let (field, _) = self.expect_ident("field name")?;
                let end = self.here();
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        field,
                    },
                    start.merge(&end),
                );
            } else if self.check(&TokenKind::LParen) {
                self.cursor.advance();
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')' after call arguments")?;
                let end = self.here();
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    start.merge(&end),
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.here();
        let kind = self.cursor.peek().kind.clone();
        match kind {
            TokenKind::Int(n) => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Int(n), start))
            }
            TokenKind::Float(n) => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Float(n), start))
            }
            TokenKind::Str(s) => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Str(s), start))
            }
            TokenKind::True => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Bool(true), start))
            }
            TokenKind::False => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Bool(false), start))
            }
            TokenKind::Ident(name) => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Ident(name), start))
            }
            TokenKind::LBrace => {
                self.cursor.advance();
                let mut fields = Vec::new();
                if !self.check(&TokenKind::RBrace) {
                    loop {
                        let (fname, _) = self.expect_ident("field name")?;
                        self.expect(TokenKind::Colon, "':' after field name")?;
                        let fval = self.parse_expr()?;
                        fields.push((fname, fval));
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self.here();
                self.expect(TokenKind::RBrace, "'}' after record fields")?;
                Ok(Expr::new(ExprKind::Record(fields), start.merge(&end)))
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expr()?;
                let end = self.here();
                self.expect(TokenKind::RParen, "')' to close parenthesized expression")?;
                Ok(Expr::new(ExprKind::Paren(Box::new(inner)), start.merge(&end)))
            }
            TokenKind::LBracket => {
                self.cursor.advance();
                let mut elems = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elems.push(self.parse_expr()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self.here();
                self.expect(TokenKind::RBracket, "']' to close array literal")?;
                Ok(Expr::new(ExprKind::Array(elems), start.merge(&end)))
            }
            TokenKind::When => self.parse_when_expr(),
            TokenKind::Given => self.parse_given_expr(),
            TokenKind::Eof => Err(ParseError::eof("an expression")),
            other => Err(self.error(format!("expected an expression, found {other:?}"))),
        }
    }

    fn parse_when_expr(&mut self) -> ParseResult<Expr> {
        let start = self.here();
        self.expect(TokenKind::When, "when")?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Newline, "newline after 'when' condition")?;
        self.expect(TokenKind::Indent, "indented 'when' body")?;
        let then_branch = self.parse_block_body()?;
        self.expect(TokenKind::Dedent, "end of 'when' body")?;

        let else_branch = if self.eat(&TokenKind::Otherwise) {
            self.expect(TokenKind::Newline, "newline after 'otherwise'")?;
            self.expect(TokenKind::Indent, "indented 'otherwise' body")?;
            let block = self.parse_block_body()?;
            self.expect(TokenKind::Dedent, "end of 'otherwise' body")?;
            Some(block)
        } else {
            None
        };

        let end = self.here();
        Ok(Expr::new(
            ExprKind::When {
                condition: Box::new(condition),
                then_branch,
                else_branch,
            },
            start.merge(&end),
        ))
    }

    fn parse_given_expr(&mut self) -> ParseResult<Expr> {
        let start = self.here();
        self.expect(TokenKind::Given, "given")?;
        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::Newline, "newline after 'given' scrutinee")?;
        self.expect(TokenKind::Indent, "indented 'given' cases")?;
        let mut cases = Vec::new();
        while !self.check(&TokenKind::Dedent) {
            let pattern = self.parse_pattern()?;
            self.expect(TokenKind::Arrow, "'->' after pattern")?;
            let value = self.parse_expr()?;
            if self.check(&TokenKind::Newline) {
                self.cursor.advance();
            } else if !self.check(&TokenKind::Dedent) {
                return Err(self.error("expected newline after case"));
            }
            cases.push((pattern, value));
        }
        self.expect(TokenKind::Dedent, "end of 'given' cases")?;
        let end = self.here();
        Ok(Expr::new(
            ExprKind::Given {
                scrutinee: Box::new(scrutinee),
                cases,
            },
            start.merge(&end),
        ))
    }

    fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.here();
        match self.cursor.peek().kind.clone() {
            TokenKind::Ident(name) if name == "_" => {
                self.cursor.advance();
                Ok(Pattern::Wildcard(start))
            }
            TokenKind::Ident(name) if name.chars().next().is_some_and(char::is_uppercase) => {
                self.cursor.advance();
                let mut subpatterns = Vec::new();
                if self.eat(&TokenKind::LParen) {
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            subpatterns.push(self.parse_pattern()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "')' after constructor pattern")?;
                }
                let end = self.here();
                Ok(Pattern::Constructor {
                    name,
                    subpatterns,
                    span: start.merge(&end),
                })
            }
            TokenKind::Ident(name) => {
                self.cursor.advance();
                Ok(Pattern::Ident(name, start))
            }
            TokenKind::Int(n) => {
                self.cursor.advance();
                Ok(Pattern::Literal(LiteralPattern::Int(n), start))
            }
            TokenKind::Float(n) => {
                self.cursor.advance();
                Ok(Pattern::Literal(LiteralPattern::Float(n), start))
            }
            TokenKind::Str(s) => {
                self.cursor.advance();
                Ok(Pattern::Literal(LiteralPattern::Str(s), start))
            }
            TokenKind::True => {
                self.cursor.advance();
                Ok(Pattern::Literal(LiteralPattern::Bool(true), start))
            }
            TokenKind::False => {
                self.cursor.advance();
                Ok(Pattern::Literal(LiteralPattern::Bool(false), start))
            }
            other => Err(self.error(format!("expected a pattern, found {other:?}"))),
        }
    }

    // ---- type expressions -----------------------------------------------

    fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        let start = self.here();
        if self.eat(&TokenKind::LParen) {
            let mut params = Vec::new();
            if !self.check(&TokenKind::RParen) {
                loop {
                    params.push(self.parse_type_expr()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "')' in function type")?;
            self.expect(TokenKind::Arrow, "'->' in function type")?;
            let result = self.parse_type_expr()?;
            let end = result.span();
            return Ok(TypeExpr::Function {
                params,
                result: Box::new(result),
                span: start.merge(&end),
            });
        }

        if self.eat(&TokenKind::LBracket) {
            let inner = self.parse_type_expr()?;
            let end = self.here();
            self.expect(TokenKind::RBracket, "']' to close array type")?;
            return Ok(TypeExpr::Array(Box::new(inner), start.merge(&end)));
        }

        let (name, _) = self.expect_ident("type name")?;
        let mut args = Vec::new();
        if self.eat(&TokenKind::Lt) {
            loop {
                args.push(self.parse_type_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt, "'>' to close type arguments")?;
        }
        let end = self.here();
        let span = start.merge(&end);

        if name == "Result" && args.len() == 2 {
            let mut it = args.into_iter();
            let ok = it.next().unwrap();
            let err = it.next().unwrap();
            Ok(TypeExpr::Result(Box::new(ok), Box::new(err), span))
        } else {
            Ok(TypeExpr::Named { name, args, span })
        }
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(&right.span);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> ParseResult<Program> {
        let tokens = Lexer::new(src).lex().expect("lex failed");
        Parser::parse(tokens)
    }

    #[test]
    fn parses_contracted_function_s4() {
        let src = "define add(x: Int, y: Int) -> Int\n  expect x >= 0\n  expect y >= 0\n  ensure result >= x\ngiven\n  x + y\n";
        let program = parse(src).unwrap();
        assert_eq!(program.decls.len(), 1);
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function decl");
        };
        assert_eq!(f.name, "add");
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.preconditions.len(), 2);
        assert_eq!(f.postconditions.len(), 1);
        assert_eq!(f.body.statements.len(), 1);
    }

    #[test]
    fn parses_function_without_contracts_s3() {
        let src = "define bad(x: Int) -> String\ngiven\n  x\n";
        let program = parse(src).unwrap();
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function decl");
        };
        assert!(f.preconditions.is_empty());
        assert!(f.postconditions.is_empty());
    }

    #[test]
    fn missing_given_is_a_parse_error() {
        let src = "define f() -> Int\n  x\n";
        assert!(parse(src).is_err());
    }

    #[test]
    fn parses_when_otherwise() {
        let src = "define f(x: Int) -> Int\ngiven\n  when x > 0\n    x\n  otherwise\n    0\n";
        let program = parse(src).unwrap();
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function decl");
        };
        let Stmt::Expr(e) = &f.body.statements[0] else {
            panic!("expected expression statement");
        };
        assert!(matches!(e.kind, ExprKind::When { else_branch: Some(_), .. }));
    }

    #[test]
    fn parses_given_pattern_match() {
        let src = "define f(x: Option) -> Int\ngiven\n  given x\n    Some(v) -> v\n    None -> 0\n";
        let program = parse(src).unwrap();
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function decl");
        };
        let Stmt::Expr(e) = &f.body.statements[0] else {
            panic!("expected expression statement");
        };
        let ExprKind::Given { cases, .. } = &e.kind else {
            panic!("expected given expression");
        };
        assert_eq!(cases.len(), 2);
    }

    #[test]
    fn parses_sum_type_decl() {
        let src = "type Option =\n  | Some(Int)\n  | None\n";
        let program = parse(src).unwrap();
        let Decl::Type(t) = &program.decls[0] else {
            panic!("expected type decl");
        };
        let TypeDef::Sum(variants) = &t.def else {
            panic!("expected sum type");
        };
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].name, "Some");
        assert_eq!(variants[0].payload.len(), 1);
    }

    #[test]
    fn parses_refined_type_with_invariant() {
        let src = "type Positive = Int\n  invariant value > 0\n";
        let program = parse(src).unwrap();
        let Decl::Type(t) = &program.decls[0] else {
            panic!("expected type decl");
        };
        assert!(matches!(t.def, TypeDef::Refined { .. }));
        assert_eq!(t.invariants.len(), 1);
        assert_eq!(t.invariants[0].text, "value > 0");
    }

    #[test]
    fn parses_plain_alias_without_invariants() {
        let src = "type Age = Int\n";
        let program = parse(src).unwrap();
        let Decl::Type(t) = &program.decls[0] else {
            panic!("expected type decl");
        };
        assert!(matches!(t.def, TypeDef::Alias(_)));
        assert!(t.invariants.is_empty());
    }

    #[test]
    fn parses_record_and_member_and_call() {
        let src = "define f() -> Int\ngiven\n  { x: 1, y: 2 }.x\n";
        let program = parse(src).unwrap();
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function decl");
        };
        let Stmt::Expr(e) = &f.body.statements[0] else {
            panic!("expected expression statement");
        };
        assert!(matches!(e.kind, ExprKind::Member { .. }));
    }

    #[test]
    fn parses_import() {
        let src = "import a.b.c\ndefine f() -> Int\ngiven\n  0\n";
        let program = parse(src).unwrap();
        assert_eq!(program.imports.len(), 1);
        assert_eq!(program.imports[0].path, vec!["a", "b", "c"]);
    }
}
