//! Interpreter for parsed manifest statements.
//!
//! Statements run in declaration order against a fixed scope: the five
//! builders and the literals `True`, `False` and `None`. Nothing else is
//! reachable from a manifest.

use serde_json::Value;

use super::ast::{Argument, Call, Expr, ExprKind, Program};
use super::error::{ErrorKind, ParseError, Span};
use crate::core::record::{
    Attributes, Group, ManifestRecord, PackageEntry, RequirementEntry, SourceEntry,
};

/// A named parameter of a builder.
#[derive(Debug, Clone, Copy)]
struct Param {
    name: &'static str,
    required: bool,
}

const fn required(name: &'static str) -> Param {
    Param {
        name,
        required: true,
    }
}

const fn optional(name: &'static str) -> Param {
    Param {
        name,
        required: false,
    }
}

/// The statement forms a manifest may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builder {
    Source,
    Package,
    DevPackage,
    Requires,
    RequiresPython,
}

impl Builder {
    pub const ALL: [Builder; 5] = [
        Builder::Source,
        Builder::Package,
        Builder::DevPackage,
        Builder::Requires,
        Builder::RequiresPython,
    ];

    /// Resolve a callee name.
    pub fn lookup(name: &str) -> Option<Builder> {
        Builder::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builder::Source => "source",
            Builder::Package => "package",
            Builder::DevPackage => "dev_package",
            Builder::Requires => "requires",
            Builder::RequiresPython => "requires_python",
        }
    }

    fn params(&self) -> &'static [Param] {
        const SOURCE: &[Param] = &[required("url")];
        const PACKAGE: &[Param] = &[required("name"), optional("version")];
        const REQUIRES: &[Param] = &[required("marker"), required("specifier")];
        const REQUIRES_PYTHON: &[Param] = &[required("version")];

        match self {
            Builder::Source => SOURCE,
            Builder::Package | Builder::DevPackage => PACKAGE,
            Builder::Requires => REQUIRES,
            Builder::RequiresPython => REQUIRES_PYTHON,
        }
    }

    /// Whether unknown keywords are collected as entry attributes.
    fn accepts_attrs(&self) -> bool {
        matches!(
            self,
            Builder::Source | Builder::Package | Builder::DevPackage
        )
    }
}

/// Resolve a bare name used as a value.
fn resolve_name(name: &str, span: Span) -> Result<Value, ParseError> {
    match name {
        "True" => Ok(Value::Bool(true)),
        "False" => Ok(Value::Bool(false)),
        "None" => Ok(Value::Null),
        _ if Builder::lookup(name).is_some() => Err(ParseError::new(
            ErrorKind::BuilderAsValue(name.to_string()),
            span,
        )),
        _ => Err(ParseError::new(
            ErrorKind::UndeclaredName(name.to_string()),
            span,
        )),
    }
}

fn eval_expr(expr: &Expr) -> Result<Value, ParseError> {
    match &expr.kind {
        ExprKind::Str(s) => Ok(Value::String(s.clone())),
        ExprKind::Int(i) => Ok(Value::from(*i)),
        ExprKind::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| ParseError::new(ErrorKind::InvalidNumber(f.to_string()), expr.span)),
        ExprKind::List(items) => items
            .iter()
            .map(eval_expr)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        ExprKind::Dict(entries) => {
            let mut map = serde_json::Map::new();
            // Later duplicates win, as in a Python dict display.
            for (key, value) in entries {
                let Value::String(key_text) = eval_expr(key)? else {
                    return Err(ParseError::new(ErrorKind::NonStringKey, key.span));
                };
                map.insert(key_text, eval_expr(value)?);
            }
            Ok(Value::Object(map))
        }
        ExprKind::Name(name) => resolve_name(name, expr.span),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Arguments of one call, bound to a builder's parameters.
struct BoundArgs {
    builder: Builder,
    values: Vec<Option<(Value, Span)>>,
    attrs: Attributes,
}

impl BoundArgs {
    fn bind(builder: Builder, call: &Call) -> Result<Self, ParseError> {
        let params = builder.params();
        let mut values: Vec<Option<(Value, Span)>> = vec![None; params.len()];
        let mut attrs = Attributes::new();

        let given = call.positional_count();
        if given > params.len() {
            return Err(ParseError::new(
                ErrorKind::TooManyArguments {
                    function: builder.name(),
                    max: params.len(),
                    given,
                },
                call.span,
            ));
        }

        let mut position = 0;
        for arg in &call.args {
            match arg {
                Argument::Positional(expr) => {
                    values[position] = Some((eval_expr(expr)?, expr.span));
                    position += 1;
                }
                Argument::Keyword { name, value } => {
                    let slot = params.iter().position(|p| p.name == name.name);
                    match slot {
                        Some(i) if values[i].is_some() => {
                            return Err(ParseError::new(
                                ErrorKind::MultipleValues {
                                    function: builder.name(),
                                    parameter: params[i].name,
                                },
                                name.span,
                            ));
                        }
                        Some(i) => values[i] = Some((eval_expr(value)?, value.span)),
                        None if builder.accepts_attrs() => {
                            attrs.insert(name.name.clone(), eval_expr(value)?);
                        }
                        None => {
                            return Err(ParseError::new(
                                ErrorKind::UnexpectedKeyword {
                                    function: builder.name(),
                                    keyword: name.name.clone(),
                                },
                                name.span,
                            ));
                        }
                    }
                }
            }
        }

        for (param, value) in params.iter().zip(&values) {
            if param.required && value.is_none() {
                return Err(ParseError::new(
                    ErrorKind::MissingArgument {
                        function: builder.name(),
                        parameter: param.name,
                    },
                    call.span,
                ));
            }
        }

        Ok(BoundArgs {
            builder,
            values,
            attrs,
        })
    }

    /// A required string parameter.
    fn string(&mut self, index: usize) -> Result<String, ParseError> {
        let param = self.builder.params()[index].name;
        match self.values[index].take() {
            Some((Value::String(s), _)) => Ok(s),
            Some((_, span)) => Err(self.type_error(param, "a string", span)),
            None => unreachable!("required parameters are checked during binding"),
        }
    }

    /// An optional string parameter where falsy values mean "absent".
    fn falsy_or_string(&mut self, index: usize) -> Result<Option<String>, ParseError> {
        let param = self.builder.params()[index].name;
        match self.values[index].take() {
            None => Ok(None),
            Some((value, _)) if !is_truthy(&value) => Ok(None),
            Some((Value::String(s), _)) => Ok(Some(s)),
            Some((_, span)) => Err(self.type_error(param, "a string or None", span)),
        }
    }

    fn type_error(&self, parameter: &'static str, expected: &'static str, span: Span) -> ParseError {
        ParseError::new(
            ErrorKind::InvalidArgumentType {
                function: self.builder.name(),
                parameter,
                expected,
            },
            span,
        )
    }
}

/// Collects declared entities into a [`ManifestRecord`].
#[derive(Debug, Default)]
pub struct Evaluator {
    record: ManifestRecord,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every statement and return the assembled record.
    pub fn run(mut self, program: &Program) -> Result<ManifestRecord, ParseError> {
        for call in &program.statements {
            self.eval_call(call)?;
        }
        Ok(self.record)
    }

    fn eval_call(&mut self, call: &Call) -> Result<(), ParseError> {
        let builder = Builder::lookup(&call.callee.name).ok_or_else(|| {
            ParseError::new(
                ErrorKind::UndeclaredName(call.callee.name.clone()),
                call.callee.span,
            )
        })?;

        let mut args = BoundArgs::bind(builder, call)?;
        tracing::debug!(builder = builder.name(), "evaluating statement");

        match builder {
            Builder::Source => {
                let url = args.string(0)?;
                self.record
                    .push_source(SourceEntry::new(url).with_attrs(args.attrs));
            }
            Builder::Package | Builder::DevPackage => {
                let name = args.string(0)?;
                let version = args.falsy_or_string(1)?;
                let group = if builder == Builder::Package {
                    Group::Default
                } else {
                    Group::Develop
                };
                let package = PackageEntry::new(name)
                    .with_version(version)
                    .with_attrs(args.attrs);
                self.record.push_package(group, package);
            }
            Builder::Requires => {
                let marker = args.string(0)?;
                let specifier = args.string(1)?;
                self.record
                    .push_requirement(RequirementEntry::new(marker, specifier));
            }
            Builder::RequiresPython => {
                let version = args.string(0)?;
                self.record
                    .push_requirement(RequirementEntry::new("python_version", version));
            }
        }

        Ok(())
    }
}
