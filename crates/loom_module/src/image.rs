//! In-memory form of a compiled module.

use loom_common::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::ModuleIdentity;

/// The kind of module produced.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OutputKind {
    /// A library with no entry point.
    Library,
}

/// Optimization level the module was built at.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OptimizationLevel {
    /// Debug build; carries [`DebugInfo`].
    Debug,
    /// Release build; no debug info.
    Release,
}

/// Accessibility of a type or member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Visibility {
    /// Visible to every module.
    Public,
    /// Visible to the declaring type and its subclasses.
    Protected,
    /// Visible inside the declaring module.
    Internal,
    /// Visible inside the declaring type.
    Private,
}

impl Visibility {
    /// Returns `true` for visibilities that form part of the module's public surface.
    pub fn is_exported(self) -> bool {
        matches!(self, Visibility::Public | Visibility::Protected)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        };
        f.write_str(s)
    }
}

/// The module a [`TypeRef`] points into.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ModuleRef {
    /// The module that contains the reference.
    This,
    /// An entry of [`ModuleImage::references`], by index.
    Reference(u32),
}

/// A reference to a type by full name.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TypeRef {
    /// Module that defines the type.
    pub module: ModuleRef,
    /// Namespace-qualified name, e.g. `System.String`.
    pub full_name: String,
    /// `T?`
    pub nullable: bool,
    /// `T[]`
    pub array: bool,
}

impl TypeRef {
    /// A plain (non-nullable, non-array) reference.
    pub fn named(module: ModuleRef, full_name: impl Into<String>) -> Self {
        Self {
            module,
            full_name: full_name.into(),
            nullable: false,
            array: false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)?;
        if self.nullable {
            f.write_str("?")?;
        }
        if self.array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// A constant value stored in a field initializer or attribute argument.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ConstValue {
    /// String constant.
    String(String),
    /// Integer constant.
    Integer(i64),
    /// Real constant, kept as its source spelling.
    Real(String),
    /// Boolean constant.
    Bool(bool),
    /// `null`
    Null,
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::String(s) => write!(f, "{s:?}"),
            ConstValue::Integer(n) => write!(f, "{n}"),
            ConstValue::Real(r) => f.write_str(r),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Null => f.write_str("null"),
        }
    }
}

/// An attribute application.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AttributeDef {
    /// The attribute type.
    pub ty: TypeRef,
    /// Positional constructor arguments.
    pub args: Vec<ConstValue>,
}

/// Whether a type is a reference or value type.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TypeKind {
    /// Reference type.
    Class,
    /// Value type.
    Struct,
}

/// A field definition.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Accessibility.
    pub visibility: Visibility,
    /// Field type.
    pub ty: TypeRef,
    /// `static`
    pub is_static: bool,
    /// `readonly`
    pub is_readonly: bool,
    /// Initializer, when the field has one.
    pub initializer: Option<ConstValue>,
    /// Attributes applied to the field.
    pub attributes: Vec<AttributeDef>,
}

/// The setter an auto-property has, if any.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SetterKind {
    /// Read-only property.
    None,
    /// `set;`
    Set,
    /// `init;`
    Init,
}

/// An auto-property definition.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property name.
    pub name: String,
    /// Accessibility.
    pub visibility: Visibility,
    /// Property type.
    pub ty: TypeRef,
    /// `static`
    pub is_static: bool,
    /// Whether a getter exists.
    pub getter: bool,
    /// Kind of setter.
    pub setter: SetterKind,
    /// Attributes applied to the property.
    pub attributes: Vec<AttributeDef>,
}

/// A type definition exported by a module.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TypeDef {
    /// Dotted namespace, or `None` for the global namespace.
    pub namespace: Option<String>,
    /// Simple name.
    pub name: String,
    /// Accessibility.
    pub visibility: Visibility,
    /// Reference or value type.
    pub kind: TypeKind,
    /// `sealed`
    pub is_sealed: bool,
    /// `abstract`
    pub is_abstract: bool,
    /// `static`
    pub is_static: bool,
    /// Whether the type derives from `System.Attribute`.
    pub is_attribute: bool,
    /// Base type; `None` only for the root object type.
    pub base: Option<TypeRef>,
    /// Attributes applied to the type.
    pub attributes: Vec<AttributeDef>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    /// Properties in declaration order.
    pub properties: Vec<PropertyDef>,
}

impl TypeDef {
    /// Creates an empty public class with the given base.
    pub fn class(namespace: Option<&str>, name: &str, base: Option<TypeRef>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            visibility: Visibility::Public,
            kind: TypeKind::Class,
            is_sealed: false,
            is_abstract: false,
            is_static: false,
            is_attribute: false,
            base,
            attributes: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// The namespace-qualified name.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// One line-table entry of [`DebugInfo`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DebugLine {
    /// Full name of the type.
    pub type_name: String,
    /// Member name, or `None` for the type declaration itself.
    pub member: Option<String>,
    /// 1-based source line.
    pub line: u32,
}

/// Source mapping emitted for debug builds.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Name of the compiled source.
    pub source_name: String,
    /// Hash of the compiled source text.
    pub source_hash: ContentHash,
    /// Declaration lines.
    pub lines: Vec<DebugLine>,
}

/// A complete compiled module.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ModuleImage {
    /// This module's identity.
    pub identity: ModuleIdentity,
    /// Output kind.
    pub kind: OutputKind,
    /// Optimization level.
    pub optimization: OptimizationLevel,
    /// Identities of referenced modules, indexed by [`ModuleRef::Reference`].
    pub references: Vec<ModuleIdentity>,
    /// Types defined by this module.
    pub types: Vec<TypeDef>,
    /// Debug info, present only for debug builds.
    pub debug: Option<DebugInfo>,
}

impl ModuleImage {
    /// Creates an empty release library.
    pub fn library(identity: ModuleIdentity) -> Self {
        Self {
            identity,
            kind: OutputKind::Library,
            optimization: OptimizationLevel::Release,
            references: Vec::new(),
            types: Vec::new(),
            debug: None,
        }
    }

    /// Looks up a type by full name.
    pub fn find_type(&self, full_name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.full_name() == full_name)
    }

    /// The exported API of the module, one line per type and member.
    ///
    /// Two modules with equal surfaces expose the same types, members,
    /// member types and attributes. The listing is sorted by type name so it
    /// does not depend on declaration order across partial declarations.
    pub fn public_surface(&self) -> Vec<String> {
        let mut types: Vec<&TypeDef> = self
            .types
            .iter()
            .filter(|t| t.visibility.is_exported())
            .collect();
        types.sort_by_key(|t| t.full_name());

        let mut out = Vec::new();
        for ty in types {
            let mut header = format!("{} ", ty.visibility);
            if ty.is_static {
                header.push_str("static ");
            }
            if ty.is_abstract {
                header.push_str("abstract ");
            }
            if ty.is_sealed {
                header.push_str("sealed ");
            }
            header.push_str(match ty.kind {
                TypeKind::Class => "class ",
                TypeKind::Struct => "struct ",
            });
            header.push_str(&ty.full_name());
            if let Some(base) = &ty.base {
                header.push_str(" : ");
                header.push_str(&base.to_string());
            }
            header.push_str(&render_attributes(&ty.attributes));
            out.push(header);

            for field in ty.fields.iter().filter(|f| f.visibility.is_exported()) {
                let mut line = format!("  {} ", field.visibility);
                if field.is_static {
                    line.push_str("static ");
                }
                if field.is_readonly {
                    line.push_str("readonly ");
                }
                line.push_str(&format!("field {}: {}", field.name, field.ty));
                if let Some(value) = &field.initializer {
                    line.push_str(&format!(" = {value}"));
                }
                line.push_str(&render_attributes(&field.attributes));
                out.push(line);
            }

            for prop in ty.properties.iter().filter(|p| p.visibility.is_exported()) {
                let mut line = format!("  {} ", prop.visibility);
                if prop.is_static {
                    line.push_str("static ");
                }
                line.push_str(&format!("property {}: {} {{", prop.name, prop.ty));
                if prop.getter {
                    line.push_str(" get;");
                }
                match prop.setter {
                    SetterKind::None => {}
                    SetterKind::Set => line.push_str(" set;"),
                    SetterKind::Init => line.push_str(" init;"),
                }
                line.push_str(" }");
                line.push_str(&render_attributes(&prop.attributes));
                out.push(line);
            }
        }
        out
    }
}

fn render_attributes(attrs: &[AttributeDef]) -> String {
    let mut out = String::new();
    for attr in attrs {
        let args: Vec<String> = attr.args.iter().map(ToString::to_string).collect();
        out.push_str(&format!(" [{}({})]", attr.ty.full_name, args.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Version;

    fn sample() -> ModuleImage {
        let mut image = ModuleImage::library(ModuleIdentity::new("Sample", Version::new(1, 0, 0)));
        image
            .references
            .push(ModuleIdentity::new("Loom.Runtime", Version::new(1, 0, 0)));
        let object = TypeRef::named(ModuleRef::Reference(0), "System.Object");

        let mut foo = TypeDef::class(Some("Site.Models"), "Foo", Some(object.clone()));
        foo.properties.push(PropertyDef {
            name: "Bar".to_string(),
            visibility: Visibility::Public,
            ty: TypeRef {
                nullable: true,
                ..TypeRef::named(ModuleRef::Reference(0), "System.String")
            },
            is_static: false,
            getter: true,
            setter: SetterKind::Set,
            attributes: Vec::new(),
        });
        foo.fields.push(FieldDef {
            name: "hidden".to_string(),
            visibility: Visibility::Private,
            ty: TypeRef::named(ModuleRef::Reference(0), "System.Int32"),
            is_static: false,
            is_readonly: false,
            initializer: None,
            attributes: Vec::new(),
        });

        let mut internal = TypeDef::class(None, "Helper", Some(object));
        internal.visibility = Visibility::Internal;

        image.types.push(internal);
        image.types.push(foo);
        image
    }

    #[test]
    fn full_name_with_and_without_namespace() {
        let image = sample();
        assert_eq!(image.types[0].full_name(), "Helper");
        assert_eq!(image.types[1].full_name(), "Site.Models.Foo");
    }

    #[test]
    fn find_type_by_full_name() {
        let image = sample();
        assert!(image.find_type("Site.Models.Foo").is_some());
        assert!(image.find_type("Foo").is_none());
    }

    #[test]
    fn surface_lists_only_exported_items() {
        let surface = sample().public_surface();
        assert_eq!(
            surface,
            vec![
                "public class Site.Models.Foo : System.Object".to_string(),
                "  public property Bar: System.String? { get; set; }".to_string(),
            ]
        );
    }

    #[test]
    fn surface_renders_attributes_and_constants() {
        let mut image = sample();
        let attr = AttributeDef {
            ty: TypeRef::named(
                ModuleRef::Reference(1),
                "System.CodeDom.Compiler.GeneratedCodeAttribute",
            ),
            args: vec![
                ConstValue::String("gen".to_string()),
                ConstValue::String("1.0".to_string()),
            ],
        };
        let foo = &mut image.types[1];
        foo.attributes.push(attr);
        foo.fields.push(FieldDef {
            name: "Limit".to_string(),
            visibility: Visibility::Public,
            ty: TypeRef::named(ModuleRef::Reference(0), "System.Int32"),
            is_static: true,
            is_readonly: false,
            initializer: Some(ConstValue::Integer(10)),
            attributes: Vec::new(),
        });

        let surface = image.public_surface();
        assert!(surface[0].ends_with(
            "[System.CodeDom.Compiler.GeneratedCodeAttribute(\"gen\", \"1.0\")]"
        ));
        assert!(surface.contains(&"  public static field Limit: System.Int32 = 10".to_string()));
    }

    #[test]
    fn type_ref_display() {
        let t = TypeRef {
            module: ModuleRef::This,
            full_name: "Site.Models.Foo".to_string(),
            nullable: true,
            array: true,
        };
        assert_eq!(t.to_string(), "Site.Models.Foo?[]");
    }
}
