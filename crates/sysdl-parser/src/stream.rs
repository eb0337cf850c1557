//! Token stream for the hand-written parser.
//!
//! Wraps the lexed `(Token, byte span)` list with single-token lookahead,
//! expect-or-error consumption, and synchronization to the next declaration
//! boundary for error recovery.

use std::ops::Range;

use crate::error::SyntaxError;
use crate::token::Token;

pub struct TokenStream<'src> {
    src: &'src str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
}

impl<'src> TokenStream<'src> {
    pub fn new(src: &'src str, tokens: Vec<(Token, Range<usize>)>) -> Self {
        Self {
            src,
            tokens,
            pos: 0,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Advance and return the current token.
    pub fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(tok, _)| tok.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Whether the current token matches `expected` by discriminant.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the current token if it matches `expected`.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance past it.
    pub fn expect(&mut self, expected: Token) -> Result<(), SyntaxError> {
        if self.check(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here(match self.peek() {
                Some(found) => format!("expected {expected}, found {found}"),
                None => format!("expected {expected}, found end of input"),
            }))
        }
    }

    /// Expect any identifier and return its text.
    pub fn expect_ident(&mut self, what: &str) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(Token::Ident(_)) => match self.advance() {
                Some(Token::Ident(name)) => Ok(name),
                _ => unreachable!("peeked identifier disappeared"),
            },
            Some(found) => Err(self.error_here(format!("expected {what}, found {found}"))),
            None => Err(self.error_here(format!("expected {what}, found end of input"))),
        }
    }

    /// Expect an integer literal, with optional leading `-`.
    pub fn expect_integer(&mut self, what: &str) -> Result<i128, SyntaxError> {
        let negative = self.eat(&Token::Minus);
        match self.peek() {
            Some(Token::Integer(_)) => match self.advance() {
                Some(Token::Integer(v)) => Ok(if negative { -v } else { v }),
                _ => unreachable!("peeked integer disappeared"),
            },
            Some(found) => Err(self.error_here(format!("expected {what}, found {found}"))),
            None => Err(self.error_here(format!("expected {what}, found end of input"))),
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Byte offset of the current token (end of input at EOF).
    pub fn offset(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some((_, span)) => span.start,
            None => self
                .tokens
                .last()
                .map(|(_, span)| span.end)
                .unwrap_or(0),
        }
    }

    /// Byte offset just past the previously consumed token.
    pub fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].1.end
        }
    }

    /// Source slice covering byte range `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> &'src str {
        &self.src[start.min(self.src.len())..end.min(self.src.len())]
    }

    /// Build a syntax error at the current position.
    pub fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at(self.src, self.offset(), message)
    }

    /// Skip tokens until the next declaration boundary: the start of an
    /// annotation or `fn` declaration, a `group` header, or a closing brace.
    pub fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek() {
                Some(Token::Fn) | Some(Token::AttrStart) | Some(Token::Group)
                | Some(Token::RBrace) => break,
                _ => {
                    self.pos += 1;
                }
            }
        }
    }
}
