//! Byte ranges within a source unit.

use serde::{Deserialize, Serialize};

/// Identifies the source unit a [`Span`] belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// Used for spans that do not come from source text (emit failures, I/O).
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// Creates a `FileId` from a raw value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A half-open byte range `[start, end)` inside one source unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// Unit this span belongs to.
    pub file: FileId,
    /// Inclusive start offset.
    pub start: u32,
    /// Exclusive end offset.
    pub end: u32,
}

impl Span {
    /// A span with no source location.
    pub const DUMMY: Span = Span {
        file: FileId::DUMMY,
        start: 0,
        end: 0,
    };

    /// Creates a span.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Returns the smallest span covering both `self` and `other`.
    ///
    /// A dummy operand yields the other span unchanged.
    pub fn to(self, other: Span) -> Span {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        Span {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` for zero-length spans.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` for [`Span::DUMMY`]-like spans.
    pub fn is_dummy(&self) -> bool {
        self.file == FileId::DUMMY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_covers_both() {
        let f = FileId::from_raw(0);
        let a = Span::new(f, 4, 9);
        let b = Span::new(f, 7, 15);
        assert_eq!(a.to(b), Span::new(f, 4, 15));
        assert_eq!(b.to(a), Span::new(f, 4, 15));
    }

    #[test]
    fn to_ignores_dummy() {
        let s = Span::new(FileId::from_raw(0), 1, 2);
        assert_eq!(Span::DUMMY.to(s), s);
        assert_eq!(s.to(Span::DUMMY), s);
    }

    #[test]
    fn len_and_empty() {
        let f = FileId::from_raw(0);
        assert_eq!(Span::new(f, 3, 8).len(), 5);
        assert!(Span::new(f, 3, 3).is_empty());
        assert!(Span::DUMMY.is_dummy());
        assert!(!Span::new(f, 0, 0).is_dummy());
    }

    #[test]
    fn serde_roundtrip() {
        let s = Span::new(FileId::from_raw(2), 10, 20);
        let json = serde_json::to_string(&s).unwrap();
        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
