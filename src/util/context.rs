//! Global context for command operations.
//!
//! Provides centralized access to the working directory, merged
//! configuration and manifest discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::manifest::{Manifest, MANIFEST_NAME};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};
use crate::util::process::find_python;

/// Manifest discovery failure.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(
        "could not find `{}` in {} or its parents (searched {max_depth} levels)",
        MANIFEST_NAME,
        .dir.display()
    )]
    NotFound { dir: PathBuf, max_depth: usize },
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Merged global and project configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context for the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context for a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let global = global_config_path();
        let config = load_config(global.as_deref(), &project_config_path(&cwd));
        GlobalContext { cwd, config }
    }

    /// Replace the loaded configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The interpreter to probe: configured, else the first one on PATH.
    pub fn python(&self) -> Option<PathBuf> {
        self.config.python.interpreter.clone().or_else(find_python)
    }

    /// Find an existing manifest starting from cwd and searching upward.
    ///
    /// `max_depth` overrides the configured depth.
    pub fn find_manifest(&self, max_depth: Option<usize>) -> Result<PathBuf, DiscoveryError> {
        let max_depth = max_depth.unwrap_or_else(|| self.config.max_depth());
        Manifest::find_existing(&self.cwd, max_depth).ok_or_else(|| DiscoveryError::NotFound {
            dir: self.cwd.clone(),
            max_depth,
        })
    }

    /// Use `explicit` if given, otherwise discover a manifest.
    pub fn manifest_path(&self, explicit: Option<&Path>) -> Result<PathBuf, DiscoveryError> {
        match explicit {
            Some(path) => Ok(self.cwd.join(path)),
            None => self.find_manifest(None),
        }
    }
}
