//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// One directory visited while walking upward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirLevel {
    /// Canonical path of the directory
    pub dir: PathBuf,
    /// Names of subdirectories, sorted
    pub dirs: Vec<String>,
    /// Names of everything else, sorted
    pub files: Vec<String>,
}

impl DirLevel {
    /// Whether a non-directory entry named `name` exists at this level.
    pub fn has_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f == name)
    }
}

/// Iterator walking from a directory up through its ancestors.
///
/// Each level is canonicalized and listed. The walk ends at the filesystem
/// root, or early when a level cannot be resolved or listed.
#[derive(Debug)]
pub struct WalkUp {
    next: Option<PathBuf>,
}

/// Walk upward from `start`, yielding each directory with its entries.
pub fn walk_up(start: &Path) -> WalkUp {
    WalkUp {
        next: Some(start.to_path_buf()),
    }
}

impl Iterator for WalkUp {
    type Item = DirLevel;

    fn next(&mut self) -> Option<DirLevel> {
        let dir = self.next.take()?;

        let dir = match fs::canonicalize(&dir) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("cannot resolve {}: {}", dir.display(), e);
                return None;
            }
        };

        let level = match list_dir(&dir) {
            Ok(level) => level,
            Err(e) => {
                tracing::warn!("{:#}", e);
                return None;
            }
        };

        self.next = dir.parent().map(Path::to_path_buf);
        tracing::debug!("walked up to {}", level.dir.display());
        Some(level)
    }
}

fn list_dir(dir: &Path) -> Result<DirLevel> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follows symlinks, so a link to a directory counts as a directory.
        if entry.path().is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }

    dirs.sort();
    files.sort();
    Ok(DirLevel {
        dir: dir.to_path_buf(),
        dirs,
        files,
    })
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}
