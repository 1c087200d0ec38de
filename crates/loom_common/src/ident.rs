//! Interned identifiers for the source language front end.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned name (type, member, namespace segment or attribute).
///
/// Equality and copying are `O(1)`. An `Ident` is only meaningful together
/// with the [`Interner`] that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Wraps a raw index. Intended for tests.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32`; `try_from_usize` rejects indices that do not
// fit, so `into_usize` always round-trips.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner backed by [`lasso::ThreadedRodeo`].
///
/// One interner lives for a single compile call; the resulting module image
/// stores resolved strings, never `Ident`s.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns `s`, reusing the existing identifier when already present.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Resolves an identifier back to its text.
    ///
    /// # Panics
    ///
    /// Panics if `ident` was produced by a different interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }

    /// Joins a dotted path of identifiers (`System.CodeDom.Compiler`).
    pub fn join(&self, parts: &[Ident]) -> String {
        parts
            .iter()
            .map(|p| self.resolve(*p))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
