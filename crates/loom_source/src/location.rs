//! Line/column locations for display.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A span resolved to 1-indexed line and column coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Display name of the source unit (usually its file path).
    pub source_name: String,
    /// Starting line, 1-indexed.
    pub line: u32,
    /// Starting column, 1-indexed, in bytes.
    pub column: u32,
    /// Ending line, 1-indexed.
    pub end_line: u32,
    /// Ending column, 1-indexed, in bytes.
    pub end_column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_name, self.line, self.column)
    }
}
