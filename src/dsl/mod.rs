//! The manifest statement language.
//!
//! A manifest is a sequence of builder calls:
//!
//! ```text
//! source('https://pypi.org/simple', verify_ssl=True)
//! package('requests', '>=2.0')
//! dev_package('pytest', '==3.0.0')
//! requires_python('3.9')
//! ```
//!
//! Source text is parsed into a [`Program`] by `nom` combinators
//! ([`lexer`] for literals and whitespace, [`parser`] for the grammar) and
//! then interpreted ([`eval`]). The interpreter only knows
//! the five builders and the literals `True`, `False` and `None`; any other
//! name is rejected.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::path::Path;

pub use ast::Program;
pub use error::{ErrorKind, ParseError, Span, SyntaxError};
pub use eval::{Builder, Evaluator};

use crate::core::errors::ManifestError;
use crate::core::record::ManifestRecord;

/// Read and evaluate the manifest at `path`.
pub fn parse(path: &Path) -> Result<ManifestRecord, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("evaluating manifest {}", path.display());
    Ok(parse_str(&content, &path.display().to_string())?)
}

/// Evaluate manifest source text. `name` labels diagnostics.
pub fn parse_str(content: &str, name: &str) -> Result<ManifestRecord, SyntaxError> {
    parser::parse_program(content)
        .and_then(|program| Evaluator::new().run(&program))
        .map_err(|err| err.with_source(name, content))
}
