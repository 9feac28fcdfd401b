//! `pipfile show` command

use anyhow::Result;

use super::load_manifest;
use crate::cli::ManifestArgs;
use pipfile::ops::format_record;
use pipfile::util::GlobalContext;

pub fn execute(args: ManifestArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let manifest = load_manifest(&ctx, &args)?;

    print!("{}", format_record(manifest.record()));
    Ok(())
}
