//! Pipfile manifest handle.
//!
//! A [`Manifest`] is bound to a file on disk. Loading evaluates the file
//! once; the digest is recomputed from the file on every call, so a
//! snapshot always reflects the bytes currently on disk.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::errors::ManifestError;
use crate::core::markers::{Marker, MarkerEnvironment};
use crate::core::record::ManifestRecord;
use crate::dsl;
use crate::util::fs::walk_up;
use crate::util::hash::sha256_file;
use crate::util::json::to_sorted_string;

/// File name of a manifest.
pub const MANIFEST_NAME: &str = "Pipfile";

/// Default number of directory levels considered by discovery.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Key under `_meta` holding the manifest digest in a snapshot.
pub const DIGEST_KEY: &str = "manifest-sha256";

/// A snapshot read back from JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub record: ManifestRecord,
    /// `_meta.manifest-sha256`, when present
    pub digest: Option<String>,
}

impl Snapshot {
    /// Parse snapshot JSON as produced by [`Manifest::snapshot`].
    pub fn parse(json: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(json)?;
        let digest = value
            .get("_meta")
            .and_then(|meta| meta.get(DIGEST_KEY))
            .and_then(Value::as_str)
            .map(str::to_string);
        let record = serde_json::from_value(value)?;
        Ok(Snapshot { record, digest })
    }
}

/// A loaded manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Path the manifest was loaded from
    path: PathBuf,

    /// Evaluated contents
    record: ManifestRecord,
}

impl Manifest {
    /// Load and evaluate the manifest at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let record = dsl::parse(path)?;

        tracing::debug!(
            "loaded {}: {} sources, {} packages, {} requirements",
            path.display(),
            record.sources().len(),
            record.package_names().count(),
            record.requires().len()
        );

        Ok(Manifest {
            path: path.to_path_buf(),
            record,
        })
    }

    /// Candidate manifest path in `start` or one of its parents.
    ///
    /// Returns `<dir>/Pipfile` for the first directory visited while fewer
    /// than `max_depth` levels have been counted. The candidate is not
    /// checked for existence, so in practice this is the canonical `start`
    /// directory whenever it can be listed and `max_depth > 1`. Use
    /// [`Manifest::find_existing`] to only get files that exist.
    pub fn find(start: &Path, max_depth: usize) -> Option<PathBuf> {
        walk_up(start)
            .enumerate()
            .take_while(|(depth, _)| depth + 1 < max_depth)
            .map(|(_, level)| level.dir.join(MANIFEST_NAME))
            .next()
    }

    /// Closest existing manifest within `max_depth` directories of `start`.
    ///
    /// `start` itself counts as the first level.
    pub fn find_existing(start: &Path, max_depth: usize) -> Option<PathBuf> {
        walk_up(start)
            .take(max_depth)
            .find(|level| level.has_file(MANIFEST_NAME))
            .map(|level| level.dir.join(MANIFEST_NAME))
    }

    /// Path the manifest was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Evaluated manifest contents.
    pub fn record(&self) -> &ManifestRecord {
        &self.record
    }

    /// SHA256 of the file bytes, hex encoded.
    pub fn digest(&self) -> Result<String, ManifestError> {
        sha256_file(&self.path).map_err(|source| self.read_error(source))
    }

    /// Deterministic JSON of the record, with the digest under
    /// `_meta.manifest-sha256`.
    pub fn snapshot(&self) -> Result<String, ManifestError> {
        let mut value = serde_json::to_value(&self.record)?;
        if let Some(Value::Object(meta)) = value.get_mut("_meta") {
            meta.insert(DIGEST_KEY.to_string(), Value::String(self.digest()?));
        }
        Ok(to_sorted_string(&value)?)
    }

    /// Check every recognized requirement against `env`.
    ///
    /// Fails on the first requirement whose marker value differs from the
    /// declared specifier. Unrecognized markers are skipped.
    pub fn assert_requirements(&self, env: &MarkerEnvironment) -> Result<(), ManifestError> {
        for requirement in self.record.requires() {
            let Ok(marker) = requirement.marker.parse::<Marker>() else {
                tracing::debug!("ignoring unrecognized marker `{}`", requirement.marker);
                continue;
            };

            let found = env
                .get(marker)
                .ok_or_else(|| ManifestError::MarkerUnavailable {
                    marker: requirement.marker.clone(),
                })?;

            if found != requirement.specifier {
                return Err(ManifestError::RequirementMismatch {
                    marker: requirement.marker.clone(),
                    expected: requirement.specifier.clone(),
                    found: found.to_string(),
                });
            }

            tracing::debug!("requirement {} == '{}' satisfied", marker, found);
        }
        Ok(())
    }

    /// Check requirements against the running environment, probing
    /// `interpreter` for interpreter-level markers.
    pub fn assert_requirements_live(&self, interpreter: Option<&Path>) -> Result<(), ManifestError> {
        self.assert_requirements(&MarkerEnvironment::detect(interpreter))
    }

    fn read_error(&self, source: std::io::Error) -> ManifestError {
        ManifestError::Read {
            path: self.path.clone(),
            source,
        }
    }
}

/// Load the manifest at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    Manifest::load(path)
}
