//! Text rendering of diagnostics.

use crate::diagnostic::Diagnostic;
use loom_source::SourceUnit;

/// Formats diagnostics for output.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic. `unit` supplies the source line when it is
    /// still available; without it only the location is shown.
    fn render(&self, diag: &Diagnostic, unit: Option<&SourceUnit>) -> String;

    /// Renders a list, separated by blank lines.
    fn render_all(&self, diags: &[Diagnostic], unit: Option<&SourceUnit>) -> String {
        diags
            .iter()
            .map(|d| self.render(d, unit))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// rustc-style terminal output:
///
/// ```text
/// error[E201]: type 'Strin' not found
///   --> Models.cs:2:3
///    |
///  2 | { Strin x; }
///    |   ^^^^^
/// ```
pub struct TerminalRenderer {
    /// Wrap the severity header in ANSI colour codes.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, diag: &Diagnostic) -> String {
        let head = format!("{}[{}]", diag.severity, diag.code);
        if !self.color {
            return head;
        }
        let colour = if diag.severity.is_error() { 31 } else { 33 };
        format!("\x1b[1;{colour}m{head}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, unit: Option<&SourceUnit>) -> String {
        let mut out = format!("{}: {}\n", self.header(diag), diag.message);

        if let Some(loc) = &diag.location {
            out.push_str(&format!("  --> {loc}\n"));
            if let Some(unit) = unit.filter(|u| u.id() == diag.span.file) {
                let line_num = loc.line.to_string();
                let pad = " ".repeat(line_num.len());
                let width = if loc.line == loc.end_line {
                    diag.span.len().max(1) as usize
                } else {
                    1
                };
                out.push_str(&format!("{pad} |\n"));
                out.push_str(&format!(
                    "{line_num} | {}\n",
                    unit.line_text(diag.span.start)
                ));
                out.push_str(&format!(
                    "{pad} | {}{}\n",
                    " ".repeat(loc.column as usize - 1),
                    "^".repeat(width)
                ));
            }
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;
    use loom_source::{FileId, ParseOptions, Span};

    fn unit() -> SourceUnit {
        SourceUnit::new(
            FileId::from_raw(0),
            "Models.cs",
            "class A\n{ Strin x; }\n".to_string(),
            ParseOptions::latest(),
        )
    }

    #[test]
    fn renders_snippet_and_carets() {
        let unit = unit();
        let diag = Diagnostic::error(
            DiagnosticCode::error(201),
            "type 'Strin' not found",
            Span::new(unit.id(), 10, 15),
        )
        .locate(&unit);
        let out = TerminalRenderer::new(false).render(&diag, Some(&unit));
        assert!(out.contains("error[E201]: type 'Strin' not found"));
        assert!(out.contains("--> Models.cs:2:3"));
        assert!(out.contains("2 | { Strin x; }"));
        assert!(out.contains(" |   ^^^^^"));
    }

    #[test]
    fn renders_location_without_unit() {
        let unit = unit();
        let diag = Diagnostic::error(
            DiagnosticCode::error(201),
            "missing",
            Span::new(unit.id(), 10, 15),
        )
        .locate(&unit);
        let out = TerminalRenderer::new(false).render(&diag, None);
        assert!(out.contains("--> Models.cs:2:3"));
        assert!(!out.contains('^'));
    }

    #[test]
    fn renders_notes_and_dummy_spans() {
        let diag = Diagnostic::warning(DiagnosticCode::warning(201), "dup", Span::DUMMY)
            .with_note("remove one of them");
        let out = TerminalRenderer::new(false).render(&diag, None);
        assert!(out.starts_with("warning[W201]: dup"));
        assert!(!out.contains("-->"));
        assert!(out.contains("= note: remove one of them"));
    }

    #[test]
    fn color_wraps_header() {
        let diag = Diagnostic::error(DiagnosticCode::error(101), "x", Span::DUMMY);
        let out = TerminalRenderer::new(true).render(&diag, None);
        assert!(out.starts_with("\x1b[1;31m"));
    }

    #[test]
    fn render_all_joins() {
        let diags = vec![
            Diagnostic::error(DiagnosticCode::error(101), "a", Span::DUMMY),
            Diagnostic::error(DiagnosticCode::error(101), "b", Span::DUMMY),
        ];
        let out = TerminalRenderer::new(false).render_all(&diags, None);
        assert!(out.contains("a\n\nerror"));
    }
}
