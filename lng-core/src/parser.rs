//! Recursive-descent parser with one token of lookahead.
//!
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! program    := (NEWLINE)* statement ((NEWLINE)+ statement)* (NEWLINE)* EOF
//! statement  := "int" IDENTIFIER "=" expr
//!             | "print" "(" expr ")"
//!             | expr
//! expr       := term (("+" | "-") term)*
//! term       := factor (("*" | "/") factor)*
//! factor     := ("+" | "-") factor
//!             | INT
//!             | IDENTIFIER ("=" expr)?
//!             | "(" expr ")"
//! ```
//!
//! Binary operators fold left-associatively. The first error encountered
//! is returned; there is no recovery and no multi-error aggregation.

use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::lexer::{Keyword, Token, TokenKind, TypeName};

pub fn parse(tokens: Vec<Token>) -> Result<Program, CoreError> {
    // The lexer always ends the stream with Eof; an empty slice can only
    // come from another caller and means an empty program.
    if tokens.is_empty() {
        return Ok(Program {
            statements: Vec::new(),
        });
    }
    Parser { tokens, index: 0 }.parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    fn parse_program(&mut self) -> Result<Program, CoreError> {
        let mut statements = Vec::new();

        self.skip_newlines();
        statements.push(self.parse_statement()?);

        loop {
            if self.skip_newlines() == 0 {
                // No separator: the statement list ends here without
                // consuming further input.
                break;
            }
            if matches!(self.current().kind, TokenKind::Eof) {
                break;
            }
            statements.push(self.parse_statement()?);
        }

        if !matches!(self.current().kind, TokenKind::Eof) {
            return Err(self.syntax_error("Expected '+', '-', '*' or '/'"));
        }

        Ok(Program { statements })
    }

    /// Dispatch on the leading token; each branch commits once it matches.
    fn parse_statement(&mut self) -> Result<Stmt, CoreError> {
        match self.current().kind {
            TokenKind::TypeName(TypeName::Int) => {
                self.advance();

                let (name, span) = match &self.current().kind {
                    TokenKind::Ident(name) => (name.clone(), self.current().span),
                    _ => return Err(self.syntax_error("Expected identifier")),
                };
                self.advance();

                if !matches!(self.current().kind, TokenKind::Equals) {
                    return Err(self.syntax_error("Expected '='"));
                }
                self.advance();

                let init = self.parse_expr()?;
                Ok(Stmt::Declare { name, span, init })
            }
            TokenKind::Keyword(Keyword::Print) => {
                self.advance();

                if !matches!(self.current().kind, TokenKind::LParen) {
                    return Err(self.syntax_error("Expected '('"));
                }
                self.advance();

                let expr = self.parse_expr()?;

                if !matches!(self.current().kind, TokenKind::RParen) {
                    return Err(self.syntax_error("Expected ')'"));
                }
                self.advance();

                Ok(Stmt::Print(expr))
            }
            _ => Ok(Stmt::Expr(self.parse_expr()?)),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, CoreError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, CoreError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, CoreError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Plus => {
                self.advance();
                Ok(Expr::unary(UnaryOp::Pos, self.parse_factor()?))
            }
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::unary(UnaryOp::Neg, self.parse_factor()?))
            }
            TokenKind::Int(value) => {
                self.advance();
                Ok(Expr::Int(value))
            }
            TokenKind::Ident(name) => {
                self.advance();
                // One token of lookahead decides access vs. reassignment.
                if matches!(self.current().kind, TokenKind::Equals) {
                    self.advance();
                    let value = self.parse_expr()?;
                    Ok(Expr::Assign {
                        name,
                        span: token.span,
                        value: Box::new(value),
                    })
                } else {
                    Ok(Expr::Var {
                        name,
                        span: token.span,
                    })
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                if !matches!(self.current().kind, TokenKind::RParen) {
                    return Err(self.syntax_error("Expected ')'"));
                }
                self.advance();
                Ok(expr)
            }
            _ => Err(self.syntax_error("Expected int or float")),
        }
    }

    fn skip_newlines(&mut self) -> usize {
        let mut count = 0;
        while matches!(self.current().kind, TokenKind::Newline) {
            self.advance();
            count += 1;
        }
        count
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn advance(&mut self) {
        // The trailing Eof token is sticky.
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn syntax_error(&self, message: &str) -> CoreError {
        CoreError::Syntax(Diagnostic::new(
            "Invalid Syntax",
            message,
            self.current().span,
        ))
    }
}
