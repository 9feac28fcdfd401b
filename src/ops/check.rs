//! Environment requirement checks.
//!
//! Every `requires(...)` entry with a recognized marker is compared
//! against the marker environment; unrecognized markers are reported as
//! skipped.

use std::path::PathBuf;

use crate::core::{Manifest, ManifestError, Marker, MarkerEnvironment, RequirementEntry};

/// Options for `check`.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Interpreter probed for interpreter-level markers
    pub python: Option<PathBuf>,
}

/// Outcome of a successful check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    /// Requirements compared and satisfied
    pub satisfied: Vec<RequirementEntry>,

    /// Requirements with markers this tool does not evaluate
    pub skipped: Vec<RequirementEntry>,
}

impl CheckReport {
    /// Human-readable summary, one line per requirement.
    pub fn format(&self) -> String {
        let mut out = String::new();
        for req in &self.satisfied {
            out.push_str(&format!("ok       {} == '{}'\n", req.marker, req.specifier));
        }
        for req in &self.skipped {
            out.push_str(&format!("skipped  {} == '{}'\n", req.marker, req.specifier));
        }
        if self.satisfied.is_empty() && self.skipped.is_empty() {
            out.push_str("no requirements declared\n");
        }
        out
    }
}

/// Check `manifest` against `env`.
pub fn check_requirements(
    manifest: &Manifest,
    env: &MarkerEnvironment,
) -> Result<CheckReport, ManifestError> {
    manifest.assert_requirements(env)?;
    Ok(report_for(manifest))
}

/// Check `manifest` against the running environment.
pub fn check(manifest: &Manifest, opts: &CheckOptions) -> Result<CheckReport, ManifestError> {
    manifest.assert_requirements_live(opts.python.as_deref())?;
    Ok(report_for(manifest))
}

fn report_for(manifest: &Manifest) -> CheckReport {
    let (satisfied, skipped) = manifest
        .record()
        .requires()
        .iter()
        .cloned()
        .partition(|req| req.marker.parse::<Marker>().is_ok());

    CheckReport { satisfied, skipped }
}
