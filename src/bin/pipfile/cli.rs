//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Pipfile - evaluate, snapshot and check Python dependency manifests
#[derive(Parser)]
#[command(name = "pipfile")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Locate the Pipfile for the current directory
    Find(FindArgs),

    /// List sources, packages and requirements
    Show(ManifestArgs),

    /// Print or write the JSON snapshot
    Freeze(FreezeArgs),

    /// Print the SHA256 digest of the manifest
    Hash(ManifestArgs),

    /// Check declared requirements against the environment
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct FindArgs {
    /// Number of directory levels to consider
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Only report a Pipfile that exists
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Path to the Pipfile (default: search from the current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct FreezeArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Write the snapshot to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Interpreter to probe for markers
    #[arg(long, env = "PIPFILE_PYTHON")]
    pub python: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
