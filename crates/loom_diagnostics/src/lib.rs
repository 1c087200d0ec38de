//! Structured compiler diagnostics.
//!
//! Every problem found while compiling generated source is a [`Diagnostic`]
//! with a [`Severity`], a [`DiagnosticCode`] and a location. Diagnostics are
//! collected in a [`DiagnosticSink`] and classified into a [`FailureKind`] so
//! callers can tell malformed input from missing references or emit failures.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode, FailureKind};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
