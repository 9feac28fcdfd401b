//! Command implementations

pub mod check;
pub mod completions;
pub mod find;
pub mod freeze;
pub mod hash;
pub mod show;

use anyhow::Result;

use crate::cli::ManifestArgs;
use pipfile::util::GlobalContext;
use pipfile::Manifest;

/// Load the manifest named on the command line, or the discovered one.
pub(crate) fn load_manifest(ctx: &GlobalContext, args: &ManifestArgs) -> Result<Manifest> {
    let path = ctx.manifest_path(args.path.as_deref())?;
    Ok(Manifest::load(path)?)
}
