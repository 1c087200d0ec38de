//! Front end for the generated-model source language.
//!
//! The language is a small, C#-flavoured declaration language: `using`
//! directives, namespaces, and classes with attributes, fields and
//! auto-properties. Model generators emit it; the compiler in
//! `loom_compiler` turns it into a binary module.
//!
//! - **Lexer** ([`lexer`]): bytes to tokens, comments skipped, `E100` on bad input.
//! - **Parser** ([`parser`]): recursive descent with resynchronisation, `E101`
//!   for syntax errors and `E102` for features beyond the configured version.
//! - **AST** ([`ast`]): spanned syntax nodes.

#![warn(missing_docs)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::CompilationUnit;
pub use token::{Token, TokenKind};

use loom_common::Interner;
use loom_diagnostics::DiagnosticSink;
use loom_source::SourceUnit;

/// Parses a source unit under its own [`ParseOptions`](loom_source::ParseOptions).
///
/// Problems are reported to `sink`; the returned tree contains everything
/// that could be recovered.
pub fn parse_unit(unit: &SourceUnit, interner: &Interner, sink: &DiagnosticSink) -> CompilationUnit {
    let tokens = lexer::lex(unit.text(), unit.id(), sink);
    parser::Parser::new(tokens, unit.text(), unit.options(), interner, sink).parse_unit()
}
