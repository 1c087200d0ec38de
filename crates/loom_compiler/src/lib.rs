//! Compiles generated model source into binary modules.
//!
//! A [`ReferenceSet`] is resolved once from the host's loaded binaries and
//! then shared by every compile. [`SourceCompiler::compile`] parses one
//! source text, binds it against the reference set, and publishes the
//! resulting module to the requested path. Every attempt yields a
//! [`CompilationOutcome`]; failures are diagnostics, never panics.

#![warn(missing_docs)]

pub mod binder;
pub mod compiler;
pub mod emit;
pub mod options;
pub mod reference;

pub use compiler::{CompilationOutcome, SourceCompiler};
pub use options::CompilerOptions;
pub use reference::{BinaryHandle, ReferenceSet, TypeLookup};
