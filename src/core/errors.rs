//! Manifest error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::dsl::SyntaxError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error loading, evaluating or checking a manifest.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ManifestError {
    #[error("failed to read manifest: {}", .path.display())]
    #[diagnostic(code(pipfile::manifest::read))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("requirement `{marker}` not satisfied: declared '{expected}', found '{found}'")]
    #[diagnostic(code(pipfile::requirement::mismatch))]
    RequirementMismatch {
        marker: String,
        expected: String,
        found: String,
    },

    #[error("no value for marker `{marker}` in the current environment")]
    #[diagnostic(code(pipfile::requirement::unavailable))]
    MarkerUnavailable { marker: String },

    #[error("invalid snapshot JSON: {0}")]
    #[diagnostic(code(pipfile::manifest::snapshot))]
    Snapshot(#[from] serde_json::Error),
}

impl ManifestError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ManifestError::Read { path, source } => {
                Diagnostic::error(format!("could not read manifest: {}", source))
                    .with_location(path)
                    .with_suggestion(suggestions::NO_MANIFEST)
            }

            ManifestError::Syntax(err) => {
                let mut diag = Diagnostic::error(err.kind.to_string())
                    .with_context(format!("at line {}, column {}", err.line, err.column));
                if let Some(ref help) = err.help {
                    diag = diag.with_suggestion(help.clone());
                }
                diag
            }

            ManifestError::RequirementMismatch {
                marker,
                expected,
                found,
            } => Diagnostic::error(format!("requirement `{}` is not satisfied", marker))
                .with_context(format!("the manifest requires {} == '{}'", marker, expected))
                .with_context(format!("the current environment reports '{}'", found))
                .with_suggestion(suggestions::CHANGE_INTERPRETER),

            ManifestError::MarkerUnavailable { marker } => {
                Diagnostic::error(format!("cannot determine `{}` for this environment", marker))
                    .with_suggestion(suggestions::CHANGE_INTERPRETER)
            }

            ManifestError::Snapshot(err) => {
                Diagnostic::error(format!("invalid snapshot JSON: {}", err))
            }
        }
    }
}
