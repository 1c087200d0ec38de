//! Configuration types deserialized from `loom.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// Top-level `loom.toml` contents. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoomConfig {
    /// Cache placement and ownership.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Reference modules offered to the compiler.
    #[serde(default)]
    pub references: ReferencesConfig,
}

/// `[cache]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Directory that host-derived module paths are placed in.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// Length of an ownership lease, in seconds.
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: u64,
    /// When `true`, cache population requires holding the file lease in
    /// `dir`; otherwise this process is assumed to be the only writer.
    #[serde(default)]
    pub exclusive: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            lease_seconds: default_lease_seconds(),
            exclusive: false,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".loom-cache")
}

fn default_lease_seconds() -> u64 {
    30
}

/// `[references]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferencesConfig {
    /// Paths of compiled modules whose public types generated source may use.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}
