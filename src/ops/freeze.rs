//! Snapshot export.
//!
//! ```bash
//! pipfile freeze                 # print the snapshot
//! pipfile freeze -o Pipfile.json # write it to a file
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::Manifest;
use crate::util::fs::write_string;

/// Options for `freeze`.
#[derive(Debug, Clone, Default)]
pub struct FreezeOptions {
    /// Write the snapshot here instead of returning it for printing
    pub output: Option<PathBuf>,
}

/// Outcome of `freeze`.
#[derive(Debug, Clone)]
pub struct FreezeResult {
    /// Snapshot JSON, without trailing newline
    pub snapshot: String,

    /// File the snapshot was written to, if any
    pub written: Option<PathBuf>,
}

/// Produce the snapshot of `manifest`, optionally writing it to disk.
pub fn freeze(manifest: &Manifest, opts: &FreezeOptions) -> Result<FreezeResult> {
    let snapshot = manifest.snapshot()?;

    if let Some(ref output) = opts.output {
        write_string(output, &format!("{}\n", snapshot))
            .with_context(|| format!("failed to write snapshot to {}", output.display()))?;
        tracing::info!("wrote snapshot to {}", output.display());
    }

    Ok(FreezeResult {
        snapshot,
        written: opts.output.clone(),
    })
}
