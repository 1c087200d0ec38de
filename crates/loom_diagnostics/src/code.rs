//! Diagnostic codes and the failure taxonomy derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix category of a diagnostic code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `E` codes.
    Error,
    /// `W` codes.
    Warning,
}

impl Category {
    /// The display prefix.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// Why a compilation failed.
///
/// The hundreds digit of a code selects the kind: `1xx` parse, `2xx`
/// reference resolution, `3xx` emit. `Io` is never carried by a code; it
/// describes failures reading the source before compilation starts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FailureKind {
    /// The source text is malformed.
    Parse,
    /// A name did not resolve against the unit or the reference set.
    ReferenceResolution,
    /// The module could not be written to its target.
    Emit,
    /// The source file could not be read.
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Parse => "parse error",
            FailureKind::ReferenceResolution => "reference resolution error",
            FailureKind::Emit => "emit failure",
            FailureKind::Io => "I/O error",
        };
        f.write_str(s)
    }
}

/// A diagnostic code such as `E101` or `W201`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Prefix category.
    pub category: Category,
    /// Three-digit number.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// Shorthand for an `E` code.
    pub const fn error(number: u16) -> Self {
        Self::new(Category::Error, number)
    }

    /// Shorthand for a `W` code.
    pub const fn warning(number: u16) -> Self {
        Self::new(Category::Warning, number)
    }

    /// The failure kind this code belongs to, by its hundreds digit.
    pub fn failure_kind(self) -> Option<FailureKind> {
        match self.number / 100 {
            1 => Some(FailureKind::Parse),
            2 => Some(FailureKind::ReferenceResolution),
            3 => Some(FailureKind::Emit),
            _ => None,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        assert_eq!(DiagnosticCode::error(101).to_string(), "E101");
        assert_eq!(DiagnosticCode::warning(7).to_string(), "W007");
    }

    #[test]
    fn failure_kind_by_hundreds() {
        assert_eq!(
            DiagnosticCode::error(101).failure_kind(),
            Some(FailureKind::Parse)
        );
        assert_eq!(
            DiagnosticCode::error(201).failure_kind(),
            Some(FailureKind::ReferenceResolution)
        );
        assert_eq!(
            DiagnosticCode::error(302).failure_kind(),
            Some(FailureKind::Emit)
        );
        assert_eq!(DiagnosticCode::error(999).failure_kind(), None);
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::error(205);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
