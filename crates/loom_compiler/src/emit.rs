//! Lowering bound types into a module image and publishing it.
//!
//! Publication writes the encoded module to a temporary file in the target
//! directory and then links it into place with a no-clobber rename. Readers
//! therefore see either no file or a complete one, and when several writers
//! race for one path exactly one of them succeeds.

use std::io::Write;
use std::path::Path;

use loom_diagnostics::{Diagnostic, DiagnosticCode};
use loom_module::{encode_module, DebugInfo, ModuleImage, OptimizationLevel};
use loom_source::{SourceUnit, Span};

use crate::binder::BoundModule;
use crate::options::CompilerOptions;
use crate::reference::ReferenceSet;

/// The module could not be written.
pub const WRITE_FAILED: DiagnosticCode = DiagnosticCode::error(301);
/// Another writer published the output path first.
pub const OUTPUT_EXISTS: DiagnosticCode = DiagnosticCode::error(302);

/// Builds the module image for `bound`.
pub fn lower(
    bound: BoundModule,
    source: &SourceUnit,
    references: &ReferenceSet,
    options: &CompilerOptions,
) -> ModuleImage {
    let debug = match options.optimization() {
        OptimizationLevel::Debug => Some(DebugInfo {
            source_name: source.name().to_string(),
            source_hash: source.content_hash(),
            lines: bound.lines,
        }),
        OptimizationLevel::Release => None,
    };
    ModuleImage {
        identity: options.module_identity(),
        kind: options.output_kind(),
        optimization: options.optimization(),
        references: references.identities(),
        types: bound.types,
        debug,
    }
}

/// Writes `image` to `output_path` unless a file is already there.
///
/// The parent directory must exist. On failure nothing is left at
/// `output_path` and the temporary file is removed.
pub fn publish(image: &ModuleImage, output_path: &Path) -> Result<(), Diagnostic> {
    let write_failed = |what: String| Diagnostic::error(WRITE_FAILED, what, Span::DUMMY);

    let bytes = encode_module(image)
        .map_err(|e| write_failed(format!("could not encode module: {e}")))?;

    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        write_failed(format!(
            "could not create a temporary file in '{}': {e}",
            dir.display()
        ))
    })?;
    temp.write_all(&bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| {
            write_failed(format!(
                "could not write module for '{}': {e}",
                output_path.display()
            ))
        })?;

    match temp.persist_noclobber(output_path) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(Diagnostic::error(
                OUTPUT_EXISTS,
                format!(
                    "output path '{}' was populated by another writer",
                    output_path.display()
                ),
                Span::DUMMY,
            ))
        }
        Err(err) => Err(write_failed(format!(
            "could not publish module to '{}': {}",
            output_path.display(),
            err.error
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_module::{load_module, ModuleIdentity, Version};
    use loom_source::{FileId, ParseOptions};

    fn image() -> ModuleImage {
        ModuleImage::library(ModuleIdentity::new("GeneratedModels", Version::new(1, 0, 0)))
    }

    #[test]
    fn publish_writes_loadable_module() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out.lmod");
        publish(&image(), &out).unwrap();
        let loaded = load_module(&out).unwrap();
        assert_eq!(loaded.identity().name, "GeneratedModels");
    }

    #[test]
    fn publish_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out.lmod");
        std::fs::write(&out, b"first").unwrap();
        let err = publish(&image(), &out).unwrap_err();
        assert_eq!(err.code, OUTPUT_EXISTS);
        assert_eq!(std::fs::read(&out).unwrap(), b"first");
        // Only the pre-existing file remains.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_directory_is_write_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("absent").join("out.lmod");
        let err = publish(&image(), &out).unwrap_err();
        assert_eq!(err.code, WRITE_FAILED);
        assert!(!out.exists());
    }

    #[test]
    fn release_lowering_drops_debug_info() {
        let source = SourceUnit::new(FileId::from_raw(0), "m.cs", String::new(), ParseOptions::latest());
        let refs = ReferenceSet::build(Vec::new());
        let release = lower(BoundModule::default(), &source, &refs, &CompilerOptions::fixed());
        assert!(release.debug.is_none());
        assert_eq!(release.references.len(), 2);

        let debug_opts = CompilerOptions::fixed().with_optimization(OptimizationLevel::Debug);
        let debug = lower(BoundModule::default(), &source, &refs, &debug_opts);
        assert_eq!(debug.debug.unwrap().source_name, "m.cs");
    }
}
