//! The single-unit source compiler.

use std::path::Path;

use loom_common::Interner;
use loom_diagnostics::{Diagnostic, DiagnosticSink, FailureKind, Severity};
use loom_source::{FileId, SourceUnit};

use crate::binder;
use crate::emit::{self, OUTPUT_EXISTS};
use crate::options::CompilerOptions;
use crate::reference::ReferenceSet;

/// The result of one compile attempt.
///
/// Produced for every call, successful or not. Diagnostics carry resolved
/// locations so they remain meaningful after the source text is gone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilationOutcome {
    /// `true` only when no error was reported and the module was published.
    pub succeeded: bool,
    /// Every diagnostic, in the order reported.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationOutcome {
    /// Error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Classifies a failed outcome by its first error.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        if self.succeeded {
            return None;
        }
        self.errors().find_map(|d| d.code.failure_kind())
    }

    /// Whether the compile failed only because another writer published the
    /// output path first.
    pub fn lost_publish_race(&self) -> bool {
        let mut errors = self.errors().peekable();
        !self.succeeded && errors.peek().is_some() && errors.all(|d| d.code == OUTPUT_EXISTS)
    }
}

/// Compiles generated source text into a module file.
///
/// Holds only the fixed [`CompilerOptions`]; the reference set is supplied
/// per call. A compiler can be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct SourceCompiler {
    options: CompilerOptions,
}

impl SourceCompiler {
    /// Creates a compiler with the fixed options.
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::fixed())
    }

    /// Creates a compiler with explicit options.
    pub fn with_options(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles `source_text` against `references` and publishes the module
    /// to `output_path`.
    ///
    /// Nothing is written when any error is reported, and an existing file at
    /// `output_path` is never replaced.
    pub fn compile(
        &self,
        source_text: &str,
        references: &ReferenceSet,
        output_path: &Path,
    ) -> CompilationOutcome {
        let source = SourceUnit::new(
            FileId::from_raw(0),
            CompilerOptions::SOURCE_NAME,
            source_text.to_string(),
            self.options.parse_options(),
        );
        let interner = Interner::new();
        let sink = DiagnosticSink::new();

        let unit = loom_lang::parse_unit(&source, &interner, &sink);
        if !sink.has_errors() {
            let bound = binder::bind(
                &unit,
                &source,
                &interner,
                references,
                self.options.identity_comparer(),
                &sink,
            );
            if !sink.has_errors() {
                let image = emit::lower(bound, &source, references, &self.options);
                if let Err(diag) = emit::publish(&image, output_path) {
                    sink.emit(diag);
                }
            }
        }

        let succeeded = !sink.has_errors();
        let diagnostics: Vec<Diagnostic> = sink
            .take_all()
            .into_iter()
            .map(|d| d.locate(&source))
            .collect();

        if succeeded {
            tracing::debug!(path = %output_path.display(), "compiled module");
        } else {
            tracing::debug!(
                path = %output_path.display(),
                errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count(),
                "compilation failed"
            );
        }
        CompilationOutcome {
            succeeded,
            diagnostics,
        }
    }
}
