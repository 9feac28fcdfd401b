//! `pipfile hash` command

use anyhow::Result;

use super::load_manifest;
use crate::cli::ManifestArgs;
use pipfile::util::GlobalContext;

pub fn execute(args: ManifestArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let manifest = load_manifest(&ctx, &args)?;

    println!("{}", manifest.digest()?);
    Ok(())
}
