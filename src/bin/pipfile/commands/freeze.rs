//! `pipfile freeze` command

use anyhow::Result;

use super::load_manifest;
use crate::cli::FreezeArgs;
use pipfile::ops::{freeze, FreezeOptions};
use pipfile::util::GlobalContext;

pub fn execute(args: FreezeArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let manifest = load_manifest(&ctx, &args.manifest)?;

    let opts = FreezeOptions {
        output: args.output.map(|p| ctx.cwd().join(p)),
    };
    let result = freeze(&manifest, &opts)?;

    if result.written.is_none() {
        println!("{}", result.snapshot);
    }
    Ok(())
}
