//! Lexical analysis.
//!
//! Produces a token vector that always ends in [`TokenKind::Eof`]. Invalid
//! input becomes [`TokenKind::Error`] tokens with an `E100` diagnostic, so
//! the parser can keep going and report as much as possible in one pass.

use crate::token::{lookup_keyword, Token, TokenKind};
use loom_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use loom_source::{FileId, Span};

/// Code for all lexical errors.
pub const LEX_ERROR: DiagnosticCode = DiagnosticCode::error(100);

/// Lexes `source`. Whitespace and comments are skipped.
pub fn lex(source: &str, file: FileId, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        source: source.as_bytes(),
        pos: 0,
        file,
        sink,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
}

impl<'a> Lexer<'a> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            if self.pos >= self.source.len() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: self.span_from(self.pos),
                });
                return tokens;
            }
            tokens.push(self.next_token());
        }
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn error(&self, msg: &str, span: Span) {
        self.sink.emit(Diagnostic::error(LEX_ERROR, msg, span));
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.peek().is_ascii_whitespace() && self.pos < self.source.len() {
                self.pos += 1;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'/' {
                while self.pos < self.source.len() && self.peek() != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.pos >= self.source.len() {
                        self.error("unterminated block comment", self.span_from(start));
                        return;
                    }
                    if self.peek() == b'*' && self.peek_at(1) == b'/' {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }
            return;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();

        if b == b'@' && is_ident_start(self.peek_at(1)) {
            self.pos += 1;
            self.eat_ident_chars();
            return self.token(TokenKind::Identifier, start);
        }
        if is_ident_start(b) {
            self.eat_ident_chars();
            let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
            let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
            return self.token(kind, start);
        }
        if b.is_ascii_digit() {
            return self.lex_number(start);
        }
        if b == b'"' {
            return self.lex_string(start);
        }

        let kind = match b {
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b';' => TokenKind::Semicolon,
            b':' => TokenKind::Colon,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b'?' => TokenKind::Question,
            b'=' => TokenKind::Equals,
            b'-' => TokenKind::Minus,
            _ => {
                // Skip the whole UTF-8 sequence so spans stay on char boundaries.
                self.pos += utf8_len(b);
                let span = self.span_from(start);
                self.error("unexpected character", span);
                return Token {
                    kind: TokenKind::Error,
                    span,
                };
            }
        };
        self.pos += 1;
        self.token(kind, start)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn eat_ident_chars(&mut self) {
        while is_ident_char(self.peek()) && self.pos < self.source.len() {
            self.pos += 1;
        }
    }

    fn lex_number(&mut self, start: usize) -> Token {
        while self.peek().is_ascii_digit() {
            self.pos += 1;
        }
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.pos += 1;
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), b'L' | b'l' | b'M' | b'm' | b'D' | b'd' | b'F' | b'f') {
            self.pos += 1;
        }
        if is_ident_char(self.peek()) {
            self.eat_ident_chars();
            let span = self.span_from(start);
            self.error("invalid numeric literal", span);
            return self.token(TokenKind::Error, start);
        }
        self.token(TokenKind::NumberLiteral, start)
    }

    fn lex_string(&mut self, start: usize) -> Token {
        self.pos += 1;
        loop {
            match self.peek() {
                b'"' => {
                    self.pos += 1;
                    return self.token(TokenKind::StringLiteral, start);
                }
                b'\\' if self.pos + 1 < self.source.len() => self.pos += 2,
                b'\n' => break,
                _ if self.pos >= self.source.len() => break,
                _ => self.pos += 1,
            }
        }
        let span = self.span_from(start);
        self.error("unterminated string literal", span);
        Token {
            kind: TokenKind::Error,
            span,
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn utf8_len(first: u8) -> usize {
    match first {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}
