//! The built-in modules every compilation references.
//!
//! [`core_runtime`] defines the primitive types model sources use, and
//! [`codegen_attributes`] defines the attribute generated code is tagged
//! with. Neither has a backing file.

use crate::identity::{ModuleIdentity, Version};
use crate::image::{ModuleImage, ModuleRef, TypeDef, TypeKind, TypeRef};
use crate::loader::LoadedModule;

/// Name of the core runtime module.
pub const CORE_RUNTIME_NAME: &str = "Loom.Runtime";

/// Name of the code-generation attribute module.
pub const CODEGEN_NAME: &str = "Loom.CodeGen";

/// Full name of the root object type.
pub const OBJECT_TYPE: &str = "System.Object";

/// Full name of the attribute base type.
pub const ATTRIBUTE_TYPE: &str = "System.Attribute";

const VALUE_TYPES: &[&str] = &[
    "Int32", "Int64", "Boolean", "Double", "Decimal", "Single", "Byte", "Char", "DateTime",
    "Guid",
];

/// Identity of [`core_runtime`].
pub fn core_runtime_identity() -> ModuleIdentity {
    ModuleIdentity::new(CORE_RUNTIME_NAME, Version::new(1, 0, 0))
}

/// Identity of [`codegen_attributes`].
pub fn codegen_identity() -> ModuleIdentity {
    ModuleIdentity::new(CODEGEN_NAME, Version::new(1, 0, 0))
}

/// The core runtime: `System.Object`, `System.String`, `System.Attribute`
/// and the primitive value types.
pub fn core_runtime() -> LoadedModule {
    let mut image = ModuleImage::library(core_runtime_identity());
    let object = TypeRef::named(ModuleRef::This, OBJECT_TYPE);

    image.types.push(TypeDef::class(Some("System"), "Object", None));

    let mut string = TypeDef::class(Some("System"), "String", Some(object.clone()));
    string.is_sealed = true;
    image.types.push(string);

    let mut attribute = TypeDef::class(Some("System"), "Attribute", Some(object.clone()));
    attribute.is_abstract = true;
    attribute.is_attribute = true;
    image.types.push(attribute);

    for name in VALUE_TYPES {
        let mut ty = TypeDef::class(Some("System"), name, Some(object.clone()));
        ty.kind = TypeKind::Struct;
        ty.is_sealed = true;
        image.types.push(ty);
    }

    LoadedModule::in_memory(image)
}

/// The code-generation module: `System.CodeDom.Compiler.GeneratedCodeAttribute`.
pub fn codegen_attributes() -> LoadedModule {
    let mut image = ModuleImage::library(codegen_identity());
    image.references.push(core_runtime_identity());

    let mut generated = TypeDef::class(
        Some("System.CodeDom.Compiler"),
        "GeneratedCodeAttribute",
        Some(TypeRef::named(ModuleRef::Reference(0), ATTRIBUTE_TYPE)),
    );
    generated.is_sealed = true;
    generated.is_attribute = true;
    image.types.push(generated);

    LoadedModule::in_memory(image)
}

/// Both baselines, core runtime first.
pub fn all() -> Vec<LoadedModule> {
    vec![core_runtime(), codegen_attributes()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_runtime_has_primitives() {
        let core = core_runtime();
        for name in ["System.Object", "System.String", "System.Int32", "System.Guid"] {
            assert!(core.find_type(name).is_some(), "missing {name}");
        }
        assert!(core.find_type("System.Object").unwrap().base.is_none());
        assert_eq!(
            core.find_type("System.Int32").unwrap().kind,
            TypeKind::Struct
        );
    }

    #[test]
    fn attribute_base_is_attribute() {
        let core = core_runtime();
        assert!(core.find_type(ATTRIBUTE_TYPE).unwrap().is_attribute);
        assert!(!core.find_type("System.String").unwrap().is_attribute);
    }

    #[test]
    fn generated_code_attribute() {
        let codegen = codegen_attributes();
        let ty = codegen
            .find_type("System.CodeDom.Compiler.GeneratedCodeAttribute")
            .unwrap();
        assert!(ty.is_attribute);
        assert_eq!(ty.base.as_ref().unwrap().full_name, ATTRIBUTE_TYPE);
        assert_eq!(codegen.image().references, vec![core_runtime_identity()]);
    }

    #[test]
    fn baselines_have_no_location() {
        assert!(all().iter().all(|m| m.location().is_none()));
    }
}
