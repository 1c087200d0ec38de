//! Configuration file loading.

use crate::error::ConfigError;
use crate::types::LoomConfig;
use std::path::Path;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "loom.toml";

/// Loads `<dir>/loom.toml`.
///
/// Relative paths inside the file are resolved against `dir`.
pub fn load_config(dir: &Path) -> Result<LoomConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Loads a configuration file at an explicit path.
///
/// Relative paths inside the file are resolved against its parent directory.
pub fn load_config_file(path: &Path) -> Result<LoomConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_config_from_str(&content)?;
    if let Some(base) = path.parent() {
        anchor_paths(&mut config, base);
    }
    Ok(config)
}

/// Parses and validates configuration text. Paths are left as written.
pub fn load_config_from_str(content: &str) -> Result<LoomConfig, ConfigError> {
    let config: LoomConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &LoomConfig) -> Result<(), ConfigError> {
    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.dir must not be empty".to_string(),
        ));
    }
    if config.cache.lease_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "cache.lease_seconds must be at least 1".to_string(),
        ));
    }
    if let Some(p) = config
        .references
        .paths
        .iter()
        .find(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::ValidationError(format!(
            "references.paths contains an empty entry ({})",
            p.display()
        )));
    }
    Ok(())
}

fn anchor_paths(config: &mut LoomConfig, base: &Path) {
    if config.cache.dir.is_relative() {
        config.cache.dir = base.join(&config.cache.dir);
    }
    for p in &mut config.references.paths {
        if p.is_relative() {
            *p = base.join(&*p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_file_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.cache.dir, PathBuf::from(".loom-cache"));
        assert_eq!(config.cache.lease_seconds, 30);
        assert!(!config.cache.exclusive);
        assert!(config.references.paths.is_empty());
    }

    #[test]
    fn full_config() {
        let config = load_config_from_str(
            r#"
[cache]
dir = "out/models"
lease_seconds = 5
exclusive = true

[references]
paths = ["refs/Shared.lmod", "refs/Media.lmod"]
"#,
        )
        .unwrap();
        assert_eq!(config.cache.dir, PathBuf::from("out/models"));
        assert_eq!(config.cache.lease_seconds, 5);
        assert!(config.cache.exclusive);
        assert_eq!(config.references.paths.len(), 2);
    }

    #[test]
    fn zero_lease_rejected() {
        let err = load_config_from_str("[cache]\nlease_seconds = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_dir_rejected() {
        let err = load_config_from_str("[cache]\ndir = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = load_config_from_str("[compiler]\noptimization = \"debug\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_rejected() {
        let err = load_config_from_str("this is not toml {{").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_dir_anchors_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[cache]\ndir = \"cache\"\n[references]\npaths = [\"a.lmod\", \"/abs/b.lmod\"]\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.cache.dir, dir.path().join("cache"));
        assert_eq!(config.references.paths[0], dir.path().join("a.lmod"));
        assert_eq!(config.references.paths[1], PathBuf::from("/abs/b.lmod"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/loom")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
