//! `loom compile`: compile a source file through the module cache.
//!
//! 1. Load `loom.toml` (or defaults)
//! 2. Collect reference modules from the config and `--reference`
//! 3. Derive the output path from the source content unless `--out` is given
//! 4. Take the ownership lease when the cache is configured as exclusive
//! 5. Run the cache and print the module path or the diagnostics

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use loom_cache::{CacheError, CompilerService, FileLease, OwnershipLock};
use loom_common::ContentHash;
use loom_compiler::{BinaryHandle, CompilerOptions};
use loom_config::LoomConfig;
use loom_diagnostics::{Diagnostic, DiagnosticRenderer, Severity, TerminalRenderer};
use loom_module::MODULE_EXTENSION;
use loom_source::{FileId, ParseOptions, SourceUnit};

use crate::{CompileArgs, GlobalArgs, ReportFormat};

/// Runs the `loom compile` command.
///
/// Returns exit code 0 when a module is available at the output path and 1
/// when compilation failed.
pub fn run(args: &CompileArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = global.load_config()?;

    let candidates: Vec<BinaryHandle> = config
        .references
        .paths
        .iter()
        .chain(&args.references)
        .map(BinaryHandle::file)
        .collect();

    let output = match &args.out {
        Some(out) => out.clone(),
        None => derive_output_path(&config, &args.source)?,
    };

    tracing::debug!(
        source = %args.source.display(),
        output = %output.display(),
        references = candidates.len(),
        "compiling through the module cache"
    );
    let mut service = CompilerService::new(candidates);
    if config.cache.exclusive {
        std::fs::create_dir_all(&config.cache.dir)?;
        let lease = FileLease::for_process(
            &config.cache.dir,
            Duration::from_secs(config.cache.lease_seconds),
        );
        if !lease.try_acquire()? {
            tracing::warn!(
                cache = %config.cache.dir.display(),
                "cache is owned by another process; only cached modules are available"
            );
        }
        service = service.with_ownership(Arc::new(lease));
    }

    match service.get_or_compile(&args.source, &output) {
        Ok(path) => {
            println!("{}", path.display());
            Ok(0)
        }
        Err(CacheError::CompilationFailed {
            kind, diagnostics, ..
        }) => {
            report(&diagnostics, &args.source, args.format, global);
            if !global.quiet {
                let errors = diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Error)
                    .count();
                eprintln!(
                    "error: could not compile {} ({kind}, {errors} error{})",
                    args.source.display(),
                    if errors == 1 { "" } else { "s" }
                );
            }
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

/// `<cache.dir>/<content hash>.lmod`, creating the directory if needed.
fn derive_output_path(config: &LoomConfig, source: &Path) -> Result<PathBuf, std::io::Error> {
    let text = std::fs::read_to_string(source)?;
    std::fs::create_dir_all(&config.cache.dir)?;
    Ok(output_path_for(&config.cache.dir, &text))
}

fn output_path_for(cache_dir: &Path, text: &str) -> PathBuf {
    let hash = ContentHash::from_text(text);
    cache_dir.join(format!("{hash}.{MODULE_EXTENSION}"))
}

fn report(diagnostics: &[Diagnostic], source: &Path, format: ReportFormat, global: &GlobalArgs) {
    match format {
        ReportFormat::Text => {
            // Spans are byte offsets into the compiled text, so a unit built
            // from the same file lines up with them.
            let unit = std::fs::read_to_string(source).ok().map(|text| {
                SourceUnit::new(
                    FileId::from_raw(0),
                    CompilerOptions::SOURCE_NAME,
                    text,
                    ParseOptions::latest(),
                )
            });
            let renderer = TerminalRenderer::new(global.color);
            for diag in diagnostics {
                eprintln!("{}", renderer.render(diag, unit.as_ref()));
            }
        }
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(diagnostics).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}
