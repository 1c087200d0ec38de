//! XXH3-128 hashing for module checksums and source fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit XXH3 digest.
///
/// The module codec stores one of these in every header to detect torn or
/// tampered payloads. Hosts may also use it as the fingerprint that names a
/// cache entry, which is the only place content ever influences a cache path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Hashes a byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }

    /// Hashes UTF-8 text.
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Returns the first eight hex characters, for log lines.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}..)", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_hash() {
        assert_eq!(
            ContentHash::from_text("public class Foo {}"),
            ContentHash::from_bytes(b"public class Foo {}")
        );
    }

    #[test]
    fn different_input_different_hash() {
        assert_ne!(
            ContentHash::from_text("public class Foo {}"),
            ContentHash::from_text("public class Baz {}")
        );
    }

    #[test]
    fn display_is_32_hex_chars() {
        let s = ContentHash::from_text("x").to_string();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn short_is_prefix_of_display() {
        let h = ContentHash::from_text("prefix");
        assert_eq!(h.short().len(), 8);
        assert!(h.to_string().starts_with(&h.short()));
        assert!(format!("{h:?}").contains(&h.short()));
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_text("serde");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
