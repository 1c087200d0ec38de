//! Token kinds for the generated-source language.

use loom_source::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A token kind. Literal and identifier text is recovered from the span.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    // === Keywords ===
    /// `using`
    Using,
    /// `namespace`
    Namespace,
    /// `class`
    Class,
    /// `public`
    Public,
    /// `internal`
    Internal,
    /// `protected`
    Protected,
    /// `private`
    Private,
    /// `sealed`
    Sealed,
    /// `abstract`
    Abstract,
    /// `static`
    Static,
    /// `partial`
    Partial,
    /// `readonly`
    Readonly,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,

    // === Built-in type keywords ===
    /// `string`
    KwString,
    /// `int`
    KwInt,
    /// `long`
    KwLong,
    /// `bool`
    KwBool,
    /// `double`
    KwDouble,
    /// `decimal`
    KwDecimal,
    /// `float`
    KwFloat,
    /// `byte`
    KwByte,
    /// `char`
    KwChar,
    /// `object`
    KwObject,

    // === Punctuation ===
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `?`
    Question,
    /// `=`
    Equals,
    /// `-`
    Minus,

    // === Literals and names ===
    /// An identifier, optionally `@`-prefixed.
    Identifier,
    /// A double-quoted string.
    StringLiteral,
    /// Digits, optionally with a fractional part and an `L`/`M`/`D`/`F` suffix.
    NumberLiteral,

    /// A lexer error; a diagnostic has already been emitted.
    Error,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns `true` for modifier keywords.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Internal
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Sealed
                | TokenKind::Abstract
                | TokenKind::Static
                | TokenKind::Partial
                | TokenKind::Readonly
        )
    }

    /// Returns `true` for built-in type keywords.
    pub fn is_builtin_type(self) -> bool {
        matches!(
            self,
            TokenKind::KwString
                | TokenKind::KwInt
                | TokenKind::KwLong
                | TokenKind::KwBool
                | TokenKind::KwDouble
                | TokenKind::KwDecimal
                | TokenKind::KwFloat
                | TokenKind::KwByte
                | TokenKind::KwChar
                | TokenKind::KwObject
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Question => "'?'",
            TokenKind::Equals => "'='",
            TokenKind::Minus => "'-'",
            TokenKind::Identifier => "identifier",
            TokenKind::StringLiteral => "string literal",
            TokenKind::NumberLiteral => "number literal",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of file",
            kw => return write!(f, "keyword '{}'", keyword_text(*kw).unwrap_or("?")),
        };
        f.write_str(s)
    }
}

/// A token kind with its location.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token {
    /// The kind.
    pub kind: TokenKind,
    /// Where it appears.
    pub span: Span,
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("using", TokenKind::Using),
    ("namespace", TokenKind::Namespace),
    ("class", TokenKind::Class),
    ("public", TokenKind::Public),
    ("internal", TokenKind::Internal),
    ("protected", TokenKind::Protected),
    ("private", TokenKind::Private),
    ("sealed", TokenKind::Sealed),
    ("abstract", TokenKind::Abstract),
    ("static", TokenKind::Static),
    ("partial", TokenKind::Partial),
    ("readonly", TokenKind::Readonly),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("null", TokenKind::Null),
    ("string", TokenKind::KwString),
    ("int", TokenKind::KwInt),
    ("long", TokenKind::KwLong),
    ("bool", TokenKind::KwBool),
    ("double", TokenKind::KwDouble),
    ("decimal", TokenKind::KwDecimal),
    ("float", TokenKind::KwFloat),
    ("byte", TokenKind::KwByte),
    ("char", TokenKind::KwChar),
    ("object", TokenKind::KwObject),
];

/// Looks up a keyword. Keywords are case-sensitive.
pub fn lookup_keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS.iter().find(|(k, _)| *k == text).map(|(_, t)| *t)
}

fn keyword_text(kind: TokenKind) -> Option<&'static str> {
    KEYWORDS.iter().find(|(_, t)| *t == kind).map(|(k, _)| *k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(lookup_keyword("class"), Some(TokenKind::Class));
        assert_eq!(lookup_keyword("Class"), None);
        assert_eq!(lookup_keyword("get"), None);
    }

    #[test]
    fn classification() {
        assert!(TokenKind::Partial.is_modifier());
        assert!(!TokenKind::Class.is_modifier());
        assert!(TokenKind::KwDecimal.is_builtin_type());
        assert!(!TokenKind::Identifier.is_builtin_type());
    }

    #[test]
    fn display() {
        assert_eq!(TokenKind::RightBrace.to_string(), "'}'");
        assert_eq!(TokenKind::Class.to_string(), "keyword 'class'");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }
}
