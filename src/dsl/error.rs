//! Errors raised while reading manifest statements.

use std::fmt;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Byte range in the manifest source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

/// What went wrong while parsing or evaluating a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("unexpected character `{}`", .0.escape_debug())]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("string prefix `{0}` is not supported")]
    StringPrefix(String),

    #[error("triple-quoted strings are not supported")]
    TripleQuoted,

    #[error("invalid escape sequence")]
    InvalidEscape,

    #[error("numeric literal `{0}` is out of range")]
    InvalidNumber(String),

    #[error("unexpected indent")]
    UnexpectedIndent,

    #[error("`{0}` cannot be used as a keyword")]
    ReservedName(String),

    #[error("dictionary keys must be strings")]
    NonStringKey,

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("name `{0}` is not defined")]
    UndeclaredName(String),

    #[error("`{0}` cannot be used as a value")]
    BuilderAsValue(String),

    #[error("positional argument follows keyword argument")]
    PositionalAfterKeyword,

    #[error("keyword argument `{0}` repeated")]
    RepeatedKeyword(String),

    #[error("{function}() got an unexpected keyword argument `{keyword}`")]
    UnexpectedKeyword {
        function: &'static str,
        keyword: String,
    },

    #[error("{function}() got multiple values for argument `{parameter}`")]
    MultipleValues {
        function: &'static str,
        parameter: &'static str,
    },

    #[error("{function}() missing required argument `{parameter}`")]
    MissingArgument {
        function: &'static str,
        parameter: &'static str,
    },

    #[error("{function}() takes at most {max} positional arguments but {given} were given")]
    TooManyArguments {
        function: &'static str,
        max: usize,
        given: usize,
    },

    #[error("{function}() argument `{parameter}` must be {expected}")]
    InvalidArgumentType {
        function: &'static str,
        parameter: &'static str,
        expected: &'static str,
    },
}

impl ErrorKind {
    /// A short hint shown under the diagnostic, when one helps.
    fn help(&self) -> Option<String> {
        match self {
            ErrorKind::UndeclaredName(_) | ErrorKind::BuilderAsValue(_) => Some(
                "manifests may only call source, package, dev_package, requires and \
                 requires_python, and use the literals True, False and None"
                    .to_string(),
            ),
            ErrorKind::StringPrefix(_) | ErrorKind::TripleQuoted => {
                Some("use a plain 'single' or \"double\" quoted string".to_string())
            }
            ErrorKind::UnexpectedIndent => {
                Some("statements must start at the beginning of a line".to_string())
            }
            ErrorKind::PositionalAfterKeyword => {
                Some("move positional arguments before keyword arguments".to_string())
            }
            _ => None,
        }
    }
}

/// An error with its location, before source text is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        ParseError { kind, span }
    }

    /// Attach the manifest source so the error can be rendered.
    pub fn with_source(self, name: impl AsRef<str>, src: &str) -> SyntaxError {
        let (line, column) = line_column(src, self.span.start);
        SyntaxError {
            help: self.kind.help(),
            kind: self.kind,
            line,
            column,
            span: self.span.into(),
            src: NamedSource::new(name, src.to_string()),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.kind, self.span.start)
    }
}

/// A malformed manifest, with the offending source location.
#[derive(Debug, Error, Diagnostic)]
#[error("{kind} (line {line}, column {column})")]
#[diagnostic(code(pipfile::manifest::syntax))]
pub struct SyntaxError {
    pub kind: ErrorKind,
    /// 1-based line of the offending token
    pub line: usize,
    /// 1-based column (in characters) of the offending token
    pub column: usize,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
    #[help]
    pub help: Option<String>,
}

fn line_column(src: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
