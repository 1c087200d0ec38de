//! The binary module format produced by the compiler.
//!
//! A module file is a small validated header followed by a bincode-encoded
//! [`ModuleImage`]: the module's identity, the identities it references, and
//! the type definitions it exports. [`load_module`] reads one back from disk,
//! and [`baseline`] provides the two built-in modules every compilation is
//! resolved against.

#![warn(missing_docs)]

pub mod baseline;
pub mod codec;
pub mod error;
pub mod identity;
pub mod image;
pub mod loader;

pub use codec::{decode_module, encode_module, MODULE_EXTENSION};
pub use error::ModuleError;
pub use identity::{IdentityComparer, ModuleIdentity, Version};
pub use image::{
    AttributeDef, ConstValue, DebugInfo, DebugLine, FieldDef, ModuleImage, ModuleRef,
    OptimizationLevel, OutputKind, PropertyDef, SetterKind, TypeDef, TypeKind, TypeRef, Visibility,
};
pub use loader::{load_module, LoadedModule};
