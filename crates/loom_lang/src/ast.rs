//! Syntax tree for one compilation unit.
//!
//! Namespaces are flattened: each [`TypeDecl`] records the namespace it was
//! declared in. Every node carries the [`Span`] it was parsed from.

use loom_common::Ident;
use loom_source::Span;
use serde::{Deserialize, Serialize};

/// A parsed compilation unit.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// `using` directives, from the top of the unit and from namespace blocks.
    pub usings: Vec<UsingDirective>,
    /// Type declarations in source order.
    pub types: Vec<TypeDecl>,
}

/// A dotted name such as `System.CodeDom.Compiler`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Name segments, left to right.
    pub parts: Vec<Ident>,
    /// The full extent.
    pub span: Span,
}

/// `using Some.Namespace;`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsingDirective {
    /// The imported namespace.
    pub namespace: QualifiedName,
    /// The whole directive.
    pub span: Span,
}

/// Accessibility keywords.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Visibility {
    /// `public`
    Public,
    /// `internal`
    Internal,
    /// `protected`
    Protected,
    /// `private`
    Private,
}

/// Modifier keywords attached to a declaration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Explicit accessibility, if any.
    pub visibility: Option<Visibility>,
    /// `sealed`
    pub is_sealed: bool,
    /// `abstract`
    pub is_abstract: bool,
    /// `static`
    pub is_static: bool,
    /// `partial`
    pub is_partial: bool,
    /// `readonly`
    pub is_readonly: bool,
}

/// A `class` declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Attribute lists preceding the declaration.
    pub attributes: Vec<Attribute>,
    /// Modifiers.
    pub modifiers: Modifiers,
    /// Enclosing namespace, if any.
    pub namespace: Option<QualifiedName>,
    /// The class name.
    pub name: Ident,
    /// Span of the name token.
    pub name_span: Span,
    /// The base list after `:`.
    pub bases: Vec<TypeSyntax>,
    /// Members in source order.
    pub members: Vec<MemberDecl>,
    /// The whole declaration.
    pub span: Span,
}

/// A field or property.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemberDecl {
    /// Attribute lists preceding the member.
    pub attributes: Vec<Attribute>,
    /// Modifiers.
    pub modifiers: Modifiers,
    /// Declared type.
    pub ty: TypeSyntax,
    /// Member name.
    pub name: Ident,
    /// Span of the name token.
    pub name_span: Span,
    /// Field or property specifics.
    pub kind: MemberKind,
    /// The whole member.
    pub span: Span,
}

/// What kind of member a [`MemberDecl`] is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MemberKind {
    /// `Type Name;` or `Type Name = literal;`
    Field {
        /// Optional constant initializer.
        initializer: Option<Literal>,
    },
    /// `Type Name { get; set; }`
    Property {
        /// Accessors in source order.
        accessors: Vec<Accessor>,
    },
}

/// Kinds of property accessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum AccessorKind {
    /// `get;`
    Get,
    /// `set;`
    Set,
    /// `init;`
    Init,
}

/// One property accessor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Accessor {
    /// Which accessor.
    pub kind: AccessorKind,
    /// Where it appears.
    pub span: Span,
}

/// Types spelled with a keyword.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BuiltinType {
    /// `string`
    String,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `bool`
    Bool,
    /// `double`
    Double,
    /// `decimal`
    Decimal,
    /// `float`
    Float,
    /// `byte`
    Byte,
    /// `char`
    Char,
    /// `object`
    Object,
}

impl BuiltinType {
    /// The runtime type a keyword aliases.
    pub fn full_name(self) -> &'static str {
        match self {
            BuiltinType::String => "System.String",
            BuiltinType::Int => "System.Int32",
            BuiltinType::Long => "System.Int64",
            BuiltinType::Bool => "System.Boolean",
            BuiltinType::Double => "System.Double",
            BuiltinType::Decimal => "System.Decimal",
            BuiltinType::Float => "System.Single",
            BuiltinType::Byte => "System.Byte",
            BuiltinType::Char => "System.Char",
            BuiltinType::Object => "System.Object",
        }
    }
}

/// How a type is named in source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeName {
    /// A keyword alias.
    Builtin(BuiltinType),
    /// A simple or dotted name, resolved later.
    Named(QualifiedName),
}

/// A type reference as written, with `?` and `[]` decorations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSyntax {
    /// The named type.
    pub name: TypeName,
    /// Trailing `?`.
    pub nullable: bool,
    /// Trailing `[]`.
    pub array: bool,
    /// The whole type expression.
    pub span: Span,
}

/// `[Name(args)]`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute name as written (the `Attribute` suffix may be omitted).
    pub name: QualifiedName,
    /// Positional constant arguments.
    pub args: Vec<Literal>,
    /// The attribute including its argument list.
    pub span: Span,
}

/// Constant values usable in initializers and attribute arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    /// A string with escapes already processed.
    String(String),
    /// An integer that fits in `i64`.
    Integer(i64),
    /// A number with a fractional part or a real suffix, kept as written.
    Real(String),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
}

/// A literal with its span.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    /// The value.
    pub kind: LiteralKind,
    /// Where it appears.
    pub span: Span,
}
