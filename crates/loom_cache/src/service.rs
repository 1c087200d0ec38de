//! The compile-and-cache entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use loom_compiler::{BinaryHandle, ReferenceSet, SourceCompiler};
use loom_diagnostics::FailureKind;

use crate::error::CacheError;
use crate::locks::PathLocks;
use crate::ownership::{OwnershipLock, SoleOwner};

/// What is known about one output path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// No file and nobody compiling.
    Uncompiled,
    /// A thread of this process holds the path.
    Compiling,
    /// A file is present and will be returned as-is.
    Compiled,
}

/// Compiles generated sources into modules cached on disk.
///
/// A present output file is trusted: it is returned without reading the
/// source or checking that it was built from the same text. Callers must
/// derive distinct output paths for distinct sources.
pub struct CompilerService {
    compiler: SourceCompiler,
    references: ReferenceSet,
    locks: PathLocks,
    ownership: Arc<dyn OwnershipLock>,
}

impl CompilerService {
    /// Resolves `candidates` into the reference set every compile will use.
    ///
    /// The process is assumed to be the sole owner of its cache; see
    /// [`with_ownership`](Self::with_ownership).
    pub fn new(candidates: impl IntoIterator<Item = BinaryHandle>) -> Self {
        let references = ReferenceSet::build(candidates);
        tracing::debug!(references = references.len(), "compiler service ready");
        Self {
            compiler: SourceCompiler::new(),
            references,
            locks: PathLocks::new(),
            ownership: Arc::new(SoleOwner),
        }
    }

    /// Replaces the ownership lease consulted before populating the cache.
    pub fn with_ownership(mut self, ownership: Arc<dyn OwnershipLock>) -> Self {
        self.ownership = ownership;
        self
    }

    /// The reference set bound to this service.
    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// The compiler in use.
    pub fn compiler(&self) -> &SourceCompiler {
        &self.compiler
    }

    /// The ownership lease in use.
    pub fn ownership(&self) -> &dyn OwnershipLock {
        self.ownership.as_ref()
    }

    /// Reports the state of `output_path`.
    pub fn state(&self, output_path: &Path) -> CacheState {
        if output_path.exists() {
            CacheState::Compiled
        } else if self.locks.is_locked(output_path) {
            CacheState::Compiling
        } else {
            CacheState::Uncompiled
        }
    }

    /// Returns `output_path`, compiling `source_path` into it first if no
    /// file is there yet.
    ///
    /// On error nothing is left at `output_path`.
    pub fn get_or_compile(
        &self,
        source_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf, CacheError> {
        if output_path.exists() {
            tracing::debug!(path = %output_path.display(), "module cache hit");
            return Ok(output_path.to_path_buf());
        }
        if !self.ownership.is_owner() {
            return Err(CacheError::NotOwner {
                path: output_path.to_path_buf(),
            });
        }
        self.locks
            .with_lock(output_path, || self.populate(source_path, output_path))
    }

    fn populate(&self, source_path: &Path, output_path: &Path) -> Result<PathBuf, CacheError> {
        // Another thread may have finished while this one waited.
        if output_path.exists() {
            tracing::debug!(path = %output_path.display(), "module cache hit after wait");
            return Ok(output_path.to_path_buf());
        }

        let text = std::fs::read_to_string(source_path).map_err(|e| CacheError::SourceRead {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        let outcome = self
            .compiler
            .compile(&text, &self.references, output_path);

        if outcome.succeeded {
            tracing::info!(
                source = %source_path.display(),
                path = %output_path.display(),
                "published module"
            );
            return Ok(output_path.to_path_buf());
        }

        if outcome.lost_publish_race() {
            tracing::warn!(path = %output_path.display(), "module published by another writer");
            return Err(CacheError::PublishConflict {
                path: output_path.to_path_buf(),
            });
        }

        let kind = outcome.failure_kind().unwrap_or(FailureKind::Emit);
        tracing::warn!(
            source = %source_path.display(),
            path = %output_path.display(),
            %kind,
            "module compilation failed"
        );
        Err(CacheError::CompilationFailed {
            path: output_path.to_path_buf(),
            kind,
            diagnostics: outcome.diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverOwner;

    impl OwnershipLock for NeverOwner {
        fn try_acquire(&self) -> Result<bool, crate::OwnershipError> {
            Ok(false)
        }
        fn release(&self) -> Result<(), crate::OwnershipError> {
            Ok(())
        }
        fn is_owner(&self) -> bool {
            false
        }
        fn renew(&self) -> Result<bool, crate::OwnershipError> {
            Ok(false)
        }
    }

    #[test]
    fn state_transitions() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("m.cs");
        std::fs::write(&source, "public class Foo { }").unwrap();
        let out = tmp.path().join("m.bin");

        let service = CompilerService::new(Vec::new());
        assert_eq!(service.state(&out), CacheState::Uncompiled);
        service.get_or_compile(&source, &out).unwrap();
        assert_eq!(service.state(&out), CacheState::Compiled);
    }

    #[test]
    fn non_owner_cannot_populate_but_can_hit() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("m.cs");
        std::fs::write(&source, "public class Foo { }").unwrap();
        let out = tmp.path().join("m.bin");

        let service = CompilerService::new(Vec::new()).with_ownership(Arc::new(NeverOwner));
        let err = service.get_or_compile(&source, &out).unwrap_err();
        assert!(matches!(err, CacheError::NotOwner { .. }));
        assert!(!out.exists());

        std::fs::write(&out, b"prebuilt").unwrap();
        assert_eq!(service.get_or_compile(&source, &out).unwrap(), out);
    }

    #[test]
    fn unreadable_source_is_source_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        let service = CompilerService::new(Vec::new());
        let err = service
            .get_or_compile(&tmp.path().join("absent.cs"), &tmp.path().join("x.bin"))
            .unwrap_err();
        assert!(matches!(err, CacheError::SourceRead { .. }));
        assert_eq!(err.failure_kind(), Some(FailureKind::Io));
    }

    #[test]
    fn non_utf8_source_is_source_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("bin.cs");
        std::fs::write(&source, [0xff, 0xfe, 0x00]).unwrap();
        let service = CompilerService::new(Vec::new());
        let err = service
            .get_or_compile(&source, &tmp.path().join("x.bin"))
            .unwrap_err();
        assert!(matches!(err, CacheError::SourceRead { .. }));
    }

    #[test]
    fn service_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompilerService>();
    }
}
