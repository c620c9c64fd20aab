//! Lexer: source text to token stream.

use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::span::{Position, Source, Span};

/// Kind of a token produced by the lexer.
///
/// Literal payloads live directly in the kind; the span records where the
/// token came from. The lexer attaches no meaning beyond recognizing the
/// keyword and type-name sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Special
    Eof,
    /// Statement separator.
    Newline,

    // Literals and names
    Int(i64),
    Ident(String),
    Keyword(Keyword),
    TypeName(TypeName),

    // Operators and punctuation
    Plus,   // +
    Minus,  // -
    Star,   // *
    Slash,  // /
    LParen, // (
    RParen, // )
    Equals, // =
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Int,
}

/// A single token with its kind and span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Result of lexing a source buffer.
///
/// `error` is fatal when present; `tokens` then holds whatever was
/// produced before the fault and is advisory only.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub error: Option<Diagnostic>,
}

/// Lex a source buffer into tokens, stopping at the first fault.
pub fn lex(source: &Source) -> LexResult {
    let mut lexer = Lexer {
        text: &source.text,
        pos: Position::start(),
        current: source.text.chars().next(),
    };
    lexer.run()
}

/// `lex`, collapsed into the `Result` shape the rest of the pipeline uses.
pub fn tokenize(source: &Source) -> Result<Vec<Token>, CoreError> {
    let LexResult { tokens, error } = lex(source);
    match error {
        Some(diag) => Err(CoreError::Lex(diag)),
        None => Ok(tokens),
    }
}

struct Lexer<'src> {
    text: &'src str,
    pos: Position,
    current: Option<char>,
}

impl<'src> Lexer<'src> {
    fn run(&mut self) -> LexResult {
        let mut tokens = Vec::new();

        while let Some(ch) = self.current {
            match ch {
                ' ' | '\t' => self.advance(),
                '\n' => tokens.push(self.char_token(TokenKind::Newline, ch)),
                '0'..='9' => match self.lex_number() {
                    Ok(tok) => tokens.push(tok),
                    Err(diag) => {
                        return LexResult {
                            tokens,
                            error: Some(diag),
                        };
                    }
                },
                '+' => tokens.push(self.char_token(TokenKind::Plus, ch)),
                '-' => tokens.push(self.char_token(TokenKind::Minus, ch)),
                '*' => tokens.push(self.char_token(TokenKind::Star, ch)),
                '/' => tokens.push(self.char_token(TokenKind::Slash, ch)),
                '(' => tokens.push(self.char_token(TokenKind::LParen, ch)),
                ')' => tokens.push(self.char_token(TokenKind::RParen, ch)),
                '=' => tokens.push(self.char_token(TokenKind::Equals, ch)),
                _ if ch.is_alphabetic() => tokens.push(self.lex_ident_or_keyword()),
                _ => {
                    let start = self.pos;
                    self.advance();
                    let diag = Diagnostic::new(
                        "Illegal Character",
                        format!("'{ch}'"),
                        char_span(start, ch),
                    );
                    return LexResult {
                        tokens,
                        error: Some(diag),
                    };
                }
            }
        }

        // Zero-width EOF marker at the end of input.
        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(self.pos, self.pos),
        });

        LexResult {
            tokens,
            error: None,
        }
    }

    /// Emit a token for the single character under the cursor and step
    /// past it; every operator arm advances through here.
    fn char_token(&mut self, kind: TokenKind, ch: char) -> Token {
        let start = self.pos;
        self.advance();
        Token {
            kind,
            span: char_span(start, ch),
        }
    }

    fn lex_number(&mut self) -> Result<Token, Diagnostic> {
        let start = self.pos;
        let mut saw_dot = false;

        // Maximal run of digits with at most one '.'; a second '.' ends
        // the run unconsumed.
        while let Some(ch) = self.current {
            match ch {
                '0'..='9' => self.advance(),
                '.' if !saw_dot => {
                    saw_dot = true;
                    self.advance();
                }
                _ => break,
            }
        }

        let span = Span::new(start, self.pos);
        if saw_dot {
            return Err(Diagnostic::new(
                "Unsupported Literal",
                "floating point literals are unsupported",
                span,
            ));
        }

        let text = &self.text[start.offset..self.pos.offset];
        let value: i64 = text.parse().map_err(|_| {
            Diagnostic::new("Unsupported Literal", "integer literal out of range", span)
        })?;

        Ok(Token {
            kind: TokenKind::Int(value),
            span,
        })
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while let Some(ch) = self.current {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let span = Span::new(start, self.pos);
        let text = &self.text[start.offset..self.pos.offset];
        let kind = match text {
            "print" => TokenKind::Keyword(Keyword::Print),
            "int" => TokenKind::TypeName(TypeName::Int),
            _ => TokenKind::Ident(text.to_string()),
        };

        Token { kind, span }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current {
            self.pos.advance(ch);
            self.current = self.text[self.pos.offset..].chars().next();
        }
    }
}

/// Span of a single character. The end stays on the start's line even for
/// the newline token, so no token span ever crosses a line boundary.
fn char_span(start: Position, ch: char) -> Span {
    let end = Position {
        offset: start.offset + ch.len_utf8(),
        line: start.line,
        column: start.column + 1,
    };
    Span::new(start, end)
}
