//! Errors raised while reading or writing module files.

use std::path::PathBuf;

/// Failure to encode, decode or load a module.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// The file could not be read.
    #[error("module I/O error at {path}: {source}")]
    Io {
        /// The module path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The header is missing, truncated, or carries the wrong magic bytes.
    #[error("invalid module header in {path}: {reason}")]
    InvalidHeader {
        /// The module path.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// The file was written by an incompatible format version.
    #[error("module format version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The module path.
        path: PathBuf,
        /// The version this build reads.
        expected: u32,
        /// The version found in the file.
        actual: u32,
    },

    /// The payload does not match the checksum recorded in the header.
    #[error("module checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The module path.
        path: PathBuf,
        /// Checksum from the header.
        expected: String,
        /// Checksum of the payload as read.
        actual: String,
    },

    /// bincode failed to encode or decode.
    #[error("module serialization error: {reason}")]
    Serialization {
        /// The bincode error message.
        reason: String,
    },
}
