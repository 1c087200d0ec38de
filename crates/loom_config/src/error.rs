//! Configuration errors.

/// Errors raised while loading `loom.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML was malformed or had unexpected types.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A value was present but unusable.
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}
