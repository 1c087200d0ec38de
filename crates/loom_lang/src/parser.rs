//! Recursive descent parser.
//!
//! The [`Parser`] consumes the token stream from [`crate::lexer::lex`] and
//! builds a [`CompilationUnit`]. Syntax errors are reported as `E101`, use of
//! a feature newer than the configured [`LanguageVersion`] as `E102`. After an
//! error the parser resynchronises at the next `;`, `}` or declaration start
//! so one malformed member does not hide problems further down.

use crate::ast::*;
use crate::lexer::LEX_ERROR;
use crate::token::{Token, TokenKind};
use loom_common::{Ident, Interner};
use loom_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use loom_source::{LanguageVersion, ParseOptions, Span};

/// Code for syntax errors.
pub const SYNTAX_ERROR: DiagnosticCode = DiagnosticCode::error(101);

/// Code for syntax that needs a newer language version.
pub const FEATURE_UNAVAILABLE: DiagnosticCode = DiagnosticCode::error(102);

/// Parser state for one unit.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    options: ParseOptions,
    interner: &'src Interner,
    sink: &'src DiagnosticSink,
}

impl<'src> Parser<'src> {
    /// Creates a parser over a token stream ending in [`TokenKind::Eof`].
    pub fn new(
        tokens: Vec<Token>,
        source: &'src str,
        options: ParseOptions,
        interner: &'src Interner,
        sink: &'src DiagnosticSink,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            options,
            interner,
            sink,
        }
    }

    // ========================================================================
    // Primitive operations
    // ========================================================================

    fn current(&self) -> TokenKind {
        self.tokens.get(self.pos).map_or(TokenKind::Eof, |t| t.kind)
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(t) => t.span,
            None => self.tokens.last().map_or(Span::DUMMY, |t| t.span),
        }
    }

    fn current_text(&self) -> &'src str {
        let span = self.current_span();
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|p| self.tokens.get(p)) {
            Some(t) => t.span,
            None => self.current_span(),
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.tokens.get(self.pos + 1).is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.expected(&kind.to_string());
        false
    }

    fn expect_ident(&mut self) -> Option<Ident> {
        if !self.at(TokenKind::Identifier) {
            self.expected("identifier");
            return None;
        }
        let text = self.current_text();
        let ident = self
            .interner
            .get_or_intern(text.strip_prefix('@').unwrap_or(text));
        self.advance();
        Some(ident)
    }

    // ========================================================================
    // Errors and recovery
    // ========================================================================

    fn error_at(&self, msg: impl Into<String>, span: Span) {
        self.sink.emit(Diagnostic::error(SYNTAX_ERROR, msg, span));
    }

    fn expected(&self, what: &str) {
        // The lexer already reported error tokens.
        if self.at(TokenKind::Error) {
            return;
        }
        self.error_at(
            format!("expected {what}, found {}", self.current()),
            self.current_span(),
        );
    }

    fn require(&self, version: LanguageVersion, feature: &str, span: Span) {
        if !self.options.allows(version) {
            self.sink.emit(Diagnostic::error(
                FEATURE_UNAVAILABLE,
                format!(
                    "{feature} requires language version {version} or newer (current: {})",
                    self.options.version
                ),
                span,
            ));
        }
    }

    /// Skips a `{ ... }` block including nested blocks. Stops at EOF.
    fn skip_block(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current() {
                TokenKind::Eof => return,
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_one(&mut self) {
        if self.at(TokenKind::LeftBrace) {
            self.skip_block();
        } else {
            self.advance();
        }
    }

    /// Skips to the end of the current member: past the next `;`, or up to
    /// (not including) a `}` that closes the enclosing type.
    fn recover_member(&mut self) {
        loop {
            match self.current() {
                TokenKind::Eof | TokenKind::RightBrace => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                _ => self.skip_one(),
            }
        }
    }

    /// Skips to the next declaration start. Always consumes at least one token.
    /// When `in_block` is set, stops before a `}` that closes a namespace.
    fn recover_declaration(&mut self, in_block: bool) {
        self.skip_one();
        while !self.at_eof()
            && !self.at_declaration_start()
            && !self.at(TokenKind::Namespace)
            && !(in_block && self.at(TokenKind::RightBrace))
        {
            self.skip_one();
        }
    }

    fn at_declaration_start(&self) -> bool {
        let kind = self.current();
        kind == TokenKind::Class || kind == TokenKind::LeftBracket || kind.is_modifier()
    }

    // ========================================================================
    // Compilation unit and namespaces
    // ========================================================================

    /// Parses the whole token stream.
    pub fn parse_unit(&mut self) -> CompilationUnit {
        let mut unit = CompilationUnit::default();
        self.parse_usings(&mut unit);

        let mut file_namespace: Option<QualifiedName> = None;
        while !self.at_eof() {
            if self.at(TokenKind::Namespace) {
                let start = self.current_span();
                self.advance();
                let Some(name) = self.parse_qualified_name() else {
                    self.recover_declaration(false);
                    continue;
                };
                if self.eat(TokenKind::Semicolon) {
                    let span = start.to(self.prev_span());
                    self.require(LanguageVersion::V2, "file-scoped namespace", span);
                    if file_namespace.is_some() || !unit.types.is_empty() {
                        self.error_at(
                            "file-scoped namespace must precede all type declarations",
                            span,
                        );
                    } else {
                        file_namespace = Some(name);
                    }
                } else {
                    self.parse_namespace_body(&mut unit, name);
                }
            } else if self.at_declaration_start() {
                if let Some(decl) = self.parse_type_decl(file_namespace.clone()) {
                    unit.types.push(decl);
                }
            } else if self.at(TokenKind::Using) {
                self.error_at(
                    "using directives must precede all declarations",
                    self.current_span(),
                );
                self.recover_member();
            } else {
                self.expected("type or namespace declaration");
                self.recover_declaration(false);
            }
        }
        unit
    }

    fn parse_usings(&mut self, unit: &mut CompilationUnit) {
        while self.at(TokenKind::Using) {
            let start = self.current_span();
            self.advance();
            match self.parse_qualified_name() {
                Some(namespace) => {
                    self.expect(TokenKind::Semicolon);
                    unit.usings.push(UsingDirective {
                        namespace,
                        span: start.to(self.prev_span()),
                    });
                }
                None => self.recover_member(),
            }
        }
    }

    /// Parses `{ usings? (namespace | type)* }` after a namespace name.
    fn parse_namespace_body(&mut self, unit: &mut CompilationUnit, name: QualifiedName) {
        if !self.expect(TokenKind::LeftBrace) {
            self.recover_declaration(false);
            return;
        }
        self.parse_usings(unit);
        while !self.at(TokenKind::RightBrace) && !self.at_eof() {
            if self.eat(TokenKind::Namespace) {
                let Some(inner) = self.parse_qualified_name() else {
                    self.recover_declaration(true);
                    continue;
                };
                let mut parts = name.parts.clone();
                parts.extend(inner.parts);
                let nested = QualifiedName {
                    parts,
                    span: inner.span,
                };
                self.parse_namespace_body(unit, nested);
            } else if self.at_declaration_start() {
                if let Some(decl) = self.parse_type_decl(Some(name.clone())) {
                    unit.types.push(decl);
                }
            } else {
                self.expected("type declaration");
                self.recover_declaration(true);
            }
        }
        self.expect(TokenKind::RightBrace);
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn parse_type_decl(&mut self, namespace: Option<QualifiedName>) -> Option<TypeDecl> {
        let start = self.current_span();
        let attributes = self.parse_attribute_lists();
        let modifiers = self.parse_modifiers();
        if !self.expect(TokenKind::Class) {
            self.recover_declaration(namespace.is_some());
            return None;
        }
        let name_span = self.current_span();
        let Some(name) = self.expect_ident() else {
            self.recover_declaration(namespace.is_some());
            return None;
        };

        let mut bases = Vec::new();
        if self.eat(TokenKind::Colon) {
            loop {
                match self.parse_type() {
                    Some(ty) => bases.push(ty),
                    None => break,
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        let mut members = Vec::new();
        if self.expect(TokenKind::LeftBrace) {
            while !self.at(TokenKind::RightBrace) && !self.at_eof() {
                if let Some(member) = self.parse_member() {
                    members.push(member);
                }
            }
            if self.at_eof() {
                let type_name = self.interner.resolve(name);
                self.error_at(
                    format!("expected '}}' to close class '{type_name}', found end of file"),
                    self.current_span(),
                );
            } else {
                self.advance();
            }
        } else {
            self.recover_declaration(namespace.is_some());
        }

        Some(TypeDecl {
            attributes,
            modifiers,
            namespace,
            name,
            name_span,
            bases,
            members,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_member(&mut self) -> Option<MemberDecl> {
        let start = self.current_span();
        let attributes = self.parse_attribute_lists();
        let modifiers = self.parse_modifiers();

        if self.at(TokenKind::Class) {
            self.error_at(
                "nested type declarations are not supported",
                self.current_span(),
            );
            while !self.at(TokenKind::LeftBrace) && !self.at_eof() {
                self.advance();
            }
            self.skip_block();
            return None;
        }

        let ty = match self.parse_type() {
            Some(ty) => ty,
            None => {
                self.recover_member();
                return None;
            }
        };
        let name_span = self.current_span();
        let Some(name) = self.expect_ident() else {
            self.recover_member();
            return None;
        };

        let kind = match self.current() {
            TokenKind::Semicolon => {
                self.advance();
                MemberKind::Field { initializer: None }
            }
            TokenKind::Equals => {
                self.advance();
                let initializer = self.parse_literal();
                if initializer.is_none() || !self.expect(TokenKind::Semicolon) {
                    self.recover_member();
                }
                MemberKind::Field { initializer }
            }
            TokenKind::LeftBrace => MemberKind::Property {
                accessors: self.parse_accessors(),
            },
            TokenKind::LeftParen => {
                self.error_at(
                    "methods are not supported in generated models",
                    self.current_span(),
                );
                while !self.at_eof()
                    && !self.at(TokenKind::LeftBrace)
                    && !self.at(TokenKind::RightBrace)
                    && !self.eat(TokenKind::RightParen)
                {
                    self.advance();
                }
                if self.at(TokenKind::LeftBrace) {
                    self.skip_block();
                } else {
                    self.recover_member();
                }
                return None;
            }
            _ => {
                self.expected("';', '=' or '{'");
                self.recover_member();
                return None;
            }
        };

        Some(MemberDecl {
            attributes,
            modifiers,
            ty,
            name,
            name_span,
            kind,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_accessors(&mut self) -> Vec<Accessor> {
        let mut accessors = Vec::new();
        self.advance(); // '{'
        while !self.at(TokenKind::RightBrace) && !self.at_eof() {
            let span = self.current_span();
            let kind = match (self.current(), self.current_text()) {
                (TokenKind::Identifier, "get") => Some(AccessorKind::Get),
                (TokenKind::Identifier, "set") => Some(AccessorKind::Set),
                (TokenKind::Identifier, "init") => Some(AccessorKind::Init),
                _ => None,
            };
            let Some(kind) = kind else {
                self.expected("accessor ('get', 'set' or 'init')");
                self.recover_member();
                continue;
            };
            if kind == AccessorKind::Init {
                self.require(LanguageVersion::V2, "'init' accessor", span);
            }
            self.advance();
            self.expect(TokenKind::Semicolon);
            accessors.push(Accessor { kind, span });
        }
        self.expect(TokenKind::RightBrace);
        accessors
    }

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut mods = Modifiers::default();
        while self.current().is_modifier() {
            let span = self.current_span();
            let flag = match self.current() {
                TokenKind::Sealed => Some(&mut mods.is_sealed),
                TokenKind::Abstract => Some(&mut mods.is_abstract),
                TokenKind::Static => Some(&mut mods.is_static),
                TokenKind::Partial => Some(&mut mods.is_partial),
                TokenKind::Readonly => Some(&mut mods.is_readonly),
                _ => None,
            };
            let duplicate = match flag {
                Some(flag) => std::mem::replace(flag, true),
                None => {
                    let visibility = match self.current() {
                        TokenKind::Public => Visibility::Public,
                        TokenKind::Internal => Visibility::Internal,
                        TokenKind::Protected => Visibility::Protected,
                        _ => Visibility::Private,
                    };
                    match mods.visibility.replace(visibility) {
                        Some(prev) if prev != visibility => {
                            self.error_at("more than one accessibility modifier", span);
                            false
                        }
                        Some(_) => true,
                        None => false,
                    }
                }
            };
            if duplicate {
                self.error_at("duplicate modifier", span);
            }
            self.advance();
        }
        mods
    }

    fn parse_attribute_lists(&mut self) -> Vec<Attribute> {
        let mut attrs = Vec::new();
        while self.eat(TokenKind::LeftBracket) {
            loop {
                if let Some(attr) = self.parse_attribute() {
                    attrs.push(attr);
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            if !self.expect(TokenKind::RightBracket) {
                while !self.at_eof() && !self.eat(TokenKind::RightBracket) {
                    if self.at_declaration_start() && !self.at(TokenKind::LeftBracket) {
                        break;
                    }
                    self.advance();
                }
            }
        }
        attrs
    }

    fn parse_attribute(&mut self) -> Option<Attribute> {
        let name = self.parse_qualified_name()?;
        let mut args = Vec::new();
        if self.eat(TokenKind::LeftParen) {
            if !self.at(TokenKind::RightParen) {
                loop {
                    if let Some(lit) = self.parse_literal() {
                        args.push(lit);
                    }
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RightParen);
        }
        let span = name.span.to(self.prev_span());
        Some(Attribute { name, args, span })
    }

    // ========================================================================
    // Types, names and literals
    // ========================================================================

    fn parse_qualified_name(&mut self) -> Option<QualifiedName> {
        let start = self.current_span();
        let mut parts = vec![self.expect_ident()?];
        while self.at(TokenKind::Dot) && self.peek_is(TokenKind::Identifier) {
            self.advance();
            parts.push(self.expect_ident()?);
        }
        Some(QualifiedName {
            parts,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_type(&mut self) -> Option<TypeSyntax> {
        let start = self.current_span();
        let name = match self.current() {
            TokenKind::KwString => TypeName::Builtin(BuiltinType::String),
            TokenKind::KwInt => TypeName::Builtin(BuiltinType::Int),
            TokenKind::KwLong => TypeName::Builtin(BuiltinType::Long),
            TokenKind::KwBool => TypeName::Builtin(BuiltinType::Bool),
            TokenKind::KwDouble => TypeName::Builtin(BuiltinType::Double),
            TokenKind::KwDecimal => TypeName::Builtin(BuiltinType::Decimal),
            TokenKind::KwFloat => TypeName::Builtin(BuiltinType::Float),
            TokenKind::KwByte => TypeName::Builtin(BuiltinType::Byte),
            TokenKind::KwChar => TypeName::Builtin(BuiltinType::Char),
            TokenKind::KwObject => TypeName::Builtin(BuiltinType::Object),
            TokenKind::Identifier => TypeName::Named(self.parse_qualified_name()?),
            _ => {
                self.expected("type");
                return None;
            }
        };
        if matches!(name, TypeName::Builtin(_)) {
            self.advance();
        }
        let nullable = self.eat(TokenKind::Question);
        let array = if self.at(TokenKind::LeftBracket) && self.peek_is(TokenKind::RightBracket) {
            self.advance();
            self.advance();
            true
        } else {
            false
        };
        Some(TypeSyntax {
            name,
            nullable,
            array,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_literal(&mut self) -> Option<Literal> {
        let span = self.current_span();
        let kind = match self.current() {
            TokenKind::StringLiteral => LiteralKind::String(self.unescape(span)),
            TokenKind::NumberLiteral => self.number(self.current_text(), false, span)?,
            TokenKind::True => LiteralKind::Bool(true),
            TokenKind::False => LiteralKind::Bool(false),
            TokenKind::Null => LiteralKind::Null,
            TokenKind::Minus if self.peek_is(TokenKind::NumberLiteral) => {
                self.advance();
                let number_span = self.current_span();
                self.number(self.current_text(), true, span.to(number_span))?
            }
            _ => {
                self.expected("literal");
                return None;
            }
        };
        self.advance();
        Some(Literal {
            kind,
            span: span.to(self.prev_span()),
        })
    }

    fn number(&mut self, text: &str, negative: bool, span: Span) -> Option<LiteralKind> {
        let sign = if negative { "-" } else { "" };
        let is_real = text.contains('.')
            || text.ends_with(['m', 'M', 'd', 'D', 'f', 'F']);
        if is_real {
            return Some(LiteralKind::Real(format!("{sign}{text}")));
        }
        let digits = text.trim_end_matches(['l', 'L']);
        match format!("{sign}{digits}").parse::<i64>() {
            Ok(v) => Some(LiteralKind::Integer(v)),
            Err(_) => {
                self.error_at("integer literal is too large", span);
                self.advance();
                None
            }
        }
    }

    fn unescape(&self, span: Span) -> String {
        let raw = self
            .source
            .get(span.start as usize + 1..span.end as usize - 1)
            .unwrap_or("");
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                other => {
                    self.sink.emit(Diagnostic::error(
                        LEX_ERROR,
                        format!(
                            "unrecognized escape sequence '\\{}'",
                            other.map(String::from).unwrap_or_default()
                        ),
                        span,
                    ));
                }
            }
        }
        out
    }
}
