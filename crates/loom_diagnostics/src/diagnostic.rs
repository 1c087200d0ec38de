//! The diagnostic record.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use loom_source::{Location, SourceUnit, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compiler message with severity, code and source location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity; any `Error` fails the compilation.
    pub severity: Severity,
    /// Stable code identifying the kind of problem.
    pub code: DiagnosticCode,
    /// Human-readable message.
    pub message: String,
    /// Byte range in the source unit, or [`Span::DUMMY`].
    pub span: Span,
    /// Line/column form of `span`, filled in by [`Diagnostic::locate`].
    pub location: Option<Location>,
    /// Extra `note:` lines.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            span,
            location: None,
            notes: Vec::new(),
        }
    }

    /// Creates an error.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Error, code, message, span)
    }

    /// Creates a warning.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Warning, code, message, span)
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Resolves `span` against `unit` so the diagnostic stands on its own
    /// once the unit is gone.
    pub fn locate(mut self, unit: &SourceUnit) -> Self {
        self.location = unit.locate(self.span);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {loc}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_source::{FileId, ParseOptions};

    #[test]
    fn constructors_set_severity() {
        let e = Diagnostic::error(DiagnosticCode::error(101), "boom", Span::DUMMY);
        let w = Diagnostic::warning(DiagnosticCode::warning(201), "hmm", Span::DUMMY);
        assert_eq!(e.severity, Severity::Error);
        assert_eq!(w.severity, Severity::Warning);
        assert!(e.location.is_none());
    }

    #[test]
    fn locate_and_display() {
        let unit = SourceUnit::new(
            FileId::from_raw(0),
            "Models.cs",
            "class A\n{ Strin x; }".to_string(),
            ParseOptions::latest(),
        );
        let diag = Diagnostic::error(
            DiagnosticCode::error(201),
            "type 'Strin' not found",
            Span::new(unit.id(), 10, 15),
        )
        .with_note("check the reference set")
        .locate(&unit);
        assert_eq!(diag.location.as_ref().map(|l| l.line), Some(2));
        assert_eq!(
            diag.to_string(),
            "error[E201]: type 'Strin' not found at Models.cs:2:3"
        );
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn display_without_location() {
        let diag = Diagnostic::error(DiagnosticCode::error(301), "disk full", Span::DUMMY);
        assert_eq!(diag.to_string(), "error[E301]: disk full");
    }
}
