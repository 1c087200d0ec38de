//! Foundational types shared by every Loom crate.
//!
//! Provides the XXH3 [`ContentHash`] used for module checksums and host-side
//! fingerprints, and the interned [`Ident`] used by the source language.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
