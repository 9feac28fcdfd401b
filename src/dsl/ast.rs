//! Syntax tree for manifest statements.

use super::error::Span;

/// A parsed manifest: statements in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Call>,
}

/// An identifier with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// A call statement such as `package('requests', '>=2.0')`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Ident,
    pub args: Vec<Argument>,
    pub span: Span,
}

impl Call {
    /// Number of positional arguments.
    pub fn positional_count(&self) -> usize {
        self.args
            .iter()
            .filter(|a| matches!(a, Argument::Positional(_)))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    Keyword { name: Ident, value: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Str(String),
    Int(i64),
    Float(f64),
    /// A list, or a tuple: both become JSON arrays.
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    /// A bare name, resolved against the evaluation scope.
    Name(String),
}
