//! Pipfile - declarative Python dependency manifests
//!
//! A `Pipfile` is a short program of builder calls (`source`, `package`,
//! `dev_package`, `requires`, `requires_python`). This crate evaluates it
//! into a [`ManifestRecord`], produces a digest and a deterministic JSON
//! snapshot, and checks declared environment requirements.

pub mod core;
pub mod dsl;
pub mod ops;
pub mod util;

pub use crate::core::{
    manifest::load, Manifest, ManifestError, ManifestRecord, Marker, MarkerEnvironment,
};
pub use util::context::GlobalContext;
