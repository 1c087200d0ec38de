//! Source units, spans and resolved locations.
//!
//! A [`SourceUnit`] is the immutable pairing of generated source text with the
//! [`ParseOptions`] it must be read under. [`Span`]s point into a unit by byte
//! offset and are turned into 1-indexed [`Location`]s for diagnostics.

#![warn(missing_docs)]

pub mod location;
pub mod options;
pub mod span;
pub mod unit;

pub use location::Location;
pub use options::{LanguageVersion, ParseOptions};
pub use span::{FileId, Span};
pub use unit::SourceUnit;
