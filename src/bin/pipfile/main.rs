//! Pipfile CLI

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use miette::{GraphicalReportHandler, GraphicalTheme};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use pipfile::util::diagnostic::{emit, suggestions, Diagnostic};
use pipfile::util::DiscoveryError;
use pipfile::ManifestError;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("pipfile=debug")
    } else {
        EnvFilter::new("pipfile=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Find(args) => commands::find::execute(args),
        Commands::Show(args) => commands::show::execute(args),
        Commands::Freeze(args) => commands::freeze::execute(args),
        Commands::Hash(args) => commands::hash::execute(args),
        Commands::Check(args) => commands::check::execute(args, color),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn report(err: &anyhow::Error, color: bool) {
    if let Some(ManifestError::Syntax(syntax)) = err.downcast_ref::<ManifestError>() {
        let theme = if color {
            GraphicalTheme::unicode()
        } else {
            GraphicalTheme::unicode_nocolor()
        };
        let mut out = String::new();
        if GraphicalReportHandler::new_themed(theme)
            .render_report(&mut out, syntax)
            .is_ok()
        {
            eprint!("{}", out);
            return;
        }
    }

    if let Some(manifest_err) = err.downcast_ref::<ManifestError>() {
        emit(&manifest_err.to_diagnostic(), color);
    } else if let Some(DiscoveryError::NotFound { .. }) = err.downcast_ref::<DiscoveryError>() {
        let diag = Diagnostic::error(err.to_string())
            .with_suggestion(suggestions::NO_MANIFEST)
            .with_suggestion(suggestions::INCREASE_DEPTH);
        emit(&diag, color);
    } else {
        emit(&Diagnostic::error(format!("{:#}", err)), color);
    }
}
