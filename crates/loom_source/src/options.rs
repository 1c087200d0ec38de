//! Language version selection for the parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Versions of the generated-source language.
///
/// Declaration order is release order, so `PartialOrd` compares versions.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum LanguageVersion {
    /// Classes, fields, get/set properties, attributes, block namespaces.
    V1,
    /// Adds file-scoped namespaces and `init` accessors.
    V2,
}

impl LanguageVersion {
    /// The newest stable version.
    pub const LATEST: LanguageVersion = LanguageVersion::V2;
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageVersion::V1 => write!(f, "1"),
            LanguageVersion::V2 => write!(f, "2"),
        }
    }
}

/// Options a source unit is parsed under.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Language version gating syntax features.
    pub version: LanguageVersion,
}

impl ParseOptions {
    /// Options pinned to [`LanguageVersion::LATEST`].
    pub fn latest() -> Self {
        Self {
            version: LanguageVersion::LATEST,
        }
    }

    /// Returns a copy using `version`.
    pub fn with_version(self, version: LanguageVersion) -> Self {
        Self { version }
    }

    /// Returns `true` when `required` is available under these options.
    pub fn allows(&self, required: LanguageVersion) -> bool {
        self.version >= required
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_is_newest() {
        assert_eq!(LanguageVersion::LATEST, LanguageVersion::V2);
        assert!(LanguageVersion::V1 < LanguageVersion::LATEST);
    }

    #[test]
    fn allows_by_version() {
        let v1 = ParseOptions::latest().with_version(LanguageVersion::V1);
        assert!(v1.allows(LanguageVersion::V1));
        assert!(!v1.allows(LanguageVersion::V2));
        assert!(ParseOptions::default().allows(LanguageVersion::V2));
    }
}
