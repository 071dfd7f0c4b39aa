//! Optional `~/.cxxpm/config.toml`, read once at startup to seed defaults
//! for flags the caller didn't pass. Precedence is CLI > config file >
//! built-in default; this struct only ever supplies the middle tier.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default value for `--package-root` when the flag is omitted.
    pub package_root: Option<String>,

    /// Default build-type name mapping, e.g. `{ "Debug" = "debug" }`.
    #[serde(default)]
    pub build_type_mapping: std::collections::HashMap<String, String>,

    /// Default value for `--verbose`.
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Reads `path` if present, falling back to defaults (with a warning)
    /// on a missing or malformed file.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("failed to load config from {}: {e:#}", path.display());
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_parses_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
package_root = "/opt/packages"
verbose = true

[build_type_mapping]
Debug = "debug"
Release = "release"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.package_root.as_deref(), Some("/opt/packages"));
        assert!(config.verbose);
        assert_eq!(config.build_type_mapping.get("Debug").unwrap(), "debug");
    }

    #[test]
    fn load_or_default_falls_back_when_missing() {
        let config = Config::load_or_default(Path::new("/does/not/exist/config.toml"));
        assert!(config.package_root.is_none());
    }
}
