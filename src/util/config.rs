//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.pipfile/config.toml` - User-wide defaults
//! - Project: `.pipfile/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.
//!
//! ```toml
//! [python]
//! interpreter = "/usr/bin/python3"
//!
//! [discovery]
//! max_depth = 3
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::manifest::DEFAULT_MAX_DEPTH;
use crate::util::fs::read_to_string;

/// Merged configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter used to read environment markers
    pub python: PythonConfig,

    /// Manifest discovery settings
    pub discovery: DiscoveryConfig,
}

/// Python interpreter settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Path to the interpreter (default: `python3` or `python` on PATH)
    pub interpreter: Option<PathBuf>,
}

/// Manifest discovery settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// How many directory levels to search upward
    pub max_depth: Option<usize>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.python.interpreter.is_some() {
            self.python.interpreter = other.python.interpreter;
        }
        if other.discovery.max_depth.is_some() {
            self.discovery.max_depth = other.discovery.max_depth;
        }
    }

    /// Discovery depth, falling back to the default.
    pub fn max_depth(&self) -> usize {
        self.discovery.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.pipfile/config.toml)
/// 2. Global config (~/.pipfile/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge(Config::load_or_default(global));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global config directory (~/.pipfile).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".pipfile"))
}

/// Get the global config path (~/.pipfile/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.pipfile/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".pipfile").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.python.interpreter.is_none());
        assert_eq!(config.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[python]
interpreter = "/opt/python/bin/python3"

[discovery]
max_depth = 5
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.python.interpreter,
            Some(PathBuf::from("/opt/python/bin/python3"))
        );
        assert_eq!(config.max_depth(), 5);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.python.interpreter = Some(PathBuf::from("python3"));
        base.discovery.max_depth = Some(2);

        let mut other = Config::default();
        other.discovery.max_depth = Some(4);

        base.merge(other);
        assert_eq!(base.python.interpreter, Some(PathBuf::from("python3")));
        assert_eq!(base.max_depth(), 4);
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[discovery]\nmax_depth = \"deep\"\n").unwrap();

        assert_eq!(Config::load_or_default(&path), Config::default());
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = project_config_path(tmp.path());
        std::fs::create_dir_all(project.parent().unwrap()).unwrap();

        std::fs::write(&global, "[python]\ninterpreter = \"global-python\"\n[discovery]\nmax_depth = 7\n").unwrap();
        std::fs::write(&project, "[python]\ninterpreter = \"project-python\"\n").unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(
            config.python.interpreter,
            Some(PathBuf::from("project-python"))
        );
        assert_eq!(config.max_depth(), 7);
    }
}
