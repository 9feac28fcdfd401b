//! `pipfile check` command
//!
//! Exits non-zero when a declared requirement does not hold.

use anyhow::Result;

use super::load_manifest;
use crate::cli::CheckArgs;
use pipfile::ops::{check, CheckOptions};
use pipfile::util::diagnostic::{emit, Diagnostic};
use pipfile::util::GlobalContext;

pub fn execute(args: CheckArgs, color: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let manifest = load_manifest(&ctx, &args.manifest)?;

    let opts = CheckOptions {
        python: args.python.or_else(|| ctx.python()),
    };
    tracing::debug!("probing interpreter {:?}", opts.python);

    let report = check(&manifest, &opts)?;
    for req in &report.skipped {
        let diag = Diagnostic::warning(format!("marker `{}` is not evaluated", req.marker))
            .with_location(manifest.path());
        emit(&diag, color);
    }
    print!("{}", report.format());
    Ok(())
}
