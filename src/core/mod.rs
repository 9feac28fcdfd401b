//! Core data structures.
//!
//! - The evaluated manifest record and its entries
//! - The manifest handle (loading, discovery, digest, snapshot)
//! - Environment markers

pub mod errors;
pub mod manifest;
pub mod markers;
pub mod record;

pub use errors::ManifestError;
pub use manifest::{Manifest, Snapshot, DEFAULT_MAX_DEPTH, MANIFEST_NAME};
pub use markers::{Marker, MarkerEnvironment};
pub use record::{Attributes, Group, ManifestRecord, PackageEntry, RequirementEntry, SourceEntry};
