//! Error types for cache operations.

use std::path::PathBuf;

use loom_diagnostics::{Diagnostic, FailureKind};

/// Errors from the ownership lease.
#[derive(Debug, thiserror::Error)]
pub enum OwnershipError {
    /// The lease file could not be read or written.
    #[error("lease I/O error at {path}: {source}")]
    Io {
        /// The lease file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The lease record could not be encoded.
    #[error("failed to encode lease record: {reason}")]
    Encode {
        /// Description of the failure.
        reason: String,
    },
}

/// Errors returned by [`CompilerService::get_or_compile`](crate::CompilerService::get_or_compile).
///
/// A failed call never leaves a file at the output path.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The source file could not be read as UTF-8 text.
    #[error("cannot read source {path}: {source}")]
    SourceRead {
        /// The source path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler reported errors. `diagnostics` is the full list, verbatim.
    #[error("compiling {path} failed: {kind} ({count} diagnostics)", count = .diagnostics.len())]
    CompilationFailed {
        /// The output path that was not populated.
        path: PathBuf,
        /// Classification of the first error.
        kind: FailureKind,
        /// Every diagnostic the compiler produced.
        diagnostics: Vec<Diagnostic>,
    },

    /// Another writer published the output path first. Retrying returns it.
    #[error("{path} was published by another writer")]
    PublishConflict {
        /// The contended output path.
        path: PathBuf,
    },

    /// This process does not hold the ownership lease and may not populate the cache.
    #[error("not the cache owner; refusing to populate {path}")]
    NotOwner {
        /// The output path that was requested.
        path: PathBuf,
    },

    /// The ownership lease failed.
    #[error(transparent)]
    Ownership(#[from] OwnershipError),
}

impl CacheError {
    /// The failure taxonomy entry for this error, when it concerns compilation.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            CacheError::SourceRead { .. } => Some(FailureKind::Io),
            CacheError::CompilationFailed { kind, .. } => Some(*kind),
            CacheError::PublishConflict { .. } => Some(FailureKind::Emit),
            CacheError::NotOwner { .. } | CacheError::Ownership(_) => None,
        }
    }

    /// Compiler diagnostics carried by the error; empty for non-compile errors.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CacheError::CompilationFailed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_diagnostics::DiagnosticCode;
    use loom_source::Span;

    #[test]
    fn compilation_failed_display_counts_diagnostics() {
        let err = CacheError::CompilationFailed {
            path: PathBuf::from("out/foo.bin"),
            kind: FailureKind::Parse,
            diagnostics: vec![Diagnostic::error(
                DiagnosticCode::error(101),
                "expected '}'",
                Span::DUMMY,
            )],
        };
        let msg = err.to_string();
        assert!(msg.contains("foo.bin"));
        assert!(msg.contains("parse error"));
        assert!(msg.contains("1 diagnostics"));
        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.failure_kind(), Some(FailureKind::Parse));
    }

    #[test]
    fn source_read_is_io() {
        let err = CacheError::SourceRead {
            path: PathBuf::from("missing.cs"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.failure_kind(), Some(FailureKind::Io));
        assert!(err.diagnostics().is_empty());
    }

    #[test]
    fn ownership_converts() {
        let err: CacheError = OwnershipError::Encode {
            reason: "bad".to_string(),
        }
        .into();
        assert!(matches!(err, CacheError::Ownership(_)));
        assert!(err.failure_kind().is_none());
    }
}
