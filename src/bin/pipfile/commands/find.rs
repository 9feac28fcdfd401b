//! `pipfile find` command

use anyhow::Result;

use crate::cli::FindArgs;
use pipfile::util::{DiscoveryError, GlobalContext};
use pipfile::Manifest;

pub fn execute(args: FindArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let max_depth = args.max_depth.unwrap_or_else(|| ctx.config().max_depth());

    let found = if args.strict {
        Some(ctx.find_manifest(Some(max_depth))?)
    } else {
        Manifest::find(ctx.cwd(), max_depth)
    };

    match found {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => Err(DiscoveryError::NotFound {
            dir: ctx.cwd().to_path_buf(),
            max_depth,
        }
        .into()),
    }
}
