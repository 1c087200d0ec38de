//! Loading and validation of `loom.toml`.
//!
//! The file only configures the host side of the pipeline: where derived
//! cache paths live, which reference modules to offer the compiler, and how
//! cache ownership is arbitrated. Compiler options are fixed and cannot be
//! configured.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use types::{CacheConfig, LoomConfig, ReferencesConfig};
