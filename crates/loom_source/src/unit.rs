//! The immutable source unit handed to the compiler.

use crate::location::Location;
use crate::options::ParseOptions;
use crate::span::{FileId, Span};
use loom_common::ContentHash;

/// Generated source text together with the options it is parsed under.
///
/// Line starts are indexed once on construction so diagnostics can resolve
/// spans without rescanning the text.
pub struct SourceUnit {
    id: FileId,
    name: String,
    text: String,
    options: ParseOptions,
    line_starts: Vec<u32>,
}

impl SourceUnit {
    /// Creates a unit. `name` is only used when displaying locations.
    pub fn new(id: FileId, name: impl Into<String>, text: String, options: ParseOptions) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| (i + 1) as u32),
            )
            .collect();
        Self {
            id,
            name: name.into(),
            text,
            options,
            line_starts,
        }
    }

    /// The unit's identifier.
    pub fn id(&self) -> FileId {
        self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parse options.
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Hash of the raw text.
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::from_text(&self.text)
    }

    /// Converts a byte offset to 1-indexed `(line, column)`.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (idx as u32 + 1, offset - self.line_starts[idx] + 1)
    }

    /// Returns the full line of text containing `offset`, without its newline.
    pub fn line_text(&self, offset: u32) -> &str {
        let (line, _) = self.line_col(offset);
        let start = self.line_starts[line as usize - 1] as usize;
        let end = self
            .line_starts
            .get(line as usize)
            .map_or(self.text.len(), |next| *next as usize - 1);
        self.text[start..end].trim_end_matches('\r')
    }

    /// Resolves a span in this unit. Dummy spans and spans belonging to other
    /// units yield `None`.
    pub fn locate(&self, span: Span) -> Option<Location> {
        if span.file != self.id || span.end as usize > self.text.len() {
            return None;
        }
        let (line, column) = self.line_col(span.start);
        let (end_line, end_column) = self.line_col(span.end.saturating_sub(1).max(span.start));
        Some(Location {
            source_name: self.name.clone(),
            line,
            column,
            end_line,
            end_column,
        })
    }

    /// Returns the text covered by `span`.
    pub fn snippet(&self, span: Span) -> &str {
        &self.text[span.start as usize..span.end as usize]
    }
}
