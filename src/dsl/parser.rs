//! Grammar of manifest statements, built from `nom` combinators.

use std::collections::HashSet;

use nom::branch::alt;
use nom::character::complete::char;
use nom::combinator::{cut, map, not};
use nom::error::context;
use nom::multi::many0;
use nom::sequence::{preceded, terminated};
use tracing::instrument;

use super::ast::{Argument, Call, Expr, ExprKind, Program};
use super::error::{ErrorKind, ParseError, Span};
use super::lexer::{
    any_ws, failure, identifier, indentation, inline_ws, number, offset, span_of,
    string_literal, unexpected, Input, Number, ParserResult,
};

/// Parse manifest source into a [`Program`].
#[instrument(level = "debug", skip(src))]
pub fn parse_program(src: &str) -> Result<Program, ParseError> {
    match program(Input::new(src)) {
        Ok((_, program)) => Ok(program),
        Err(nom::Err::Error(err) | nom::Err::Failure(err)) => Err(err),
        // Only streaming parsers report `Incomplete`.
        Err(nom::Err::Incomplete(_)) => Err(ParseError::new(
            ErrorKind::UnexpectedToken {
                expected: "a statement",
                found: "end of file".to_string(),
            },
            Span::new(src.len(), src.len()),
        )),
    }
}

fn program(mut input: Input) -> ParserResult<Program> {
    let mut statements = Vec::new();

    // Each pass starts at the beginning of a physical line.
    loop {
        let (rest, indent) = indentation(input)?;
        let (rest, _) = inline_ws(rest)?;
        if rest.fragment().is_empty() {
            return Ok((rest, Program { statements }));
        }
        if let Ok((rest, _)) = char::<_, ParseError>('\n')(rest) {
            input = rest;
            continue;
        }
        if !indent.fragment().is_empty() {
            return failure(ParseError::new(ErrorKind::UnexpectedIndent, span_of(&indent)));
        }

        let (rest, calls) = logical_line(rest)?;
        statements.extend(calls);
        input = rest;
    }
}

/// One or more `;`-separated calls, up to a newline or the end of input.
fn logical_line(mut input: Input) -> ParserResult<Vec<Call>> {
    let mut calls = Vec::new();

    loop {
        let (rest, stmt) = call(input)?;
        calls.push(stmt);

        let (rest, _) = inline_ws(rest)?;
        if let Some(end) = end_of_line(rest) {
            return Ok((end, calls));
        }
        match char::<_, ParseError>(';')(rest) {
            Ok((rest, _)) => {
                let (rest, _) = inline_ws(rest)?;
                // `;` may also end the line.
                if let Some(end) = end_of_line(rest) {
                    return Ok((end, calls));
                }
                input = rest;
            }
            Err(_) => return failure(unexpected("end of statement", &rest)),
        }
    }
}

fn end_of_line(input: Input) -> Option<Input> {
    if input.fragment().is_empty() {
        return Some(input);
    }
    char::<_, ParseError>('\n')(input).ok().map(|(rest, _)| rest)
}

#[instrument(level = "debug", skip(input))]
fn call(input: Input) -> ParserResult<Call> {
    let start = offset(&input);
    let (rest, callee) = context("a statement", identifier)(input)?;
    let (rest, _) = inline_ws(rest)?;
    let (rest, _) = context("`(`", char('('))(rest)?;
    let (rest, args) = cut(arguments)(rest)?;

    Ok((
        rest,
        Call {
            callee,
            args,
            span: Span::new(start, offset(&rest)),
        },
    ))
}

/// Arguments after `(`, through the closing `)`.
fn arguments(input: Input) -> ParserResult<Vec<Argument>> {
    let (rest, (args, _)) = sequence(')', argument)(input)?;

    let mut keywords = HashSet::new();
    for arg in &args {
        match arg {
            Argument::Positional(expr) => {
                if !keywords.is_empty() {
                    return failure(ParseError::new(ErrorKind::PositionalAfterKeyword, expr.span));
                }
            }
            Argument::Keyword { name, .. } => {
                if !keywords.insert(name.name.as_str()) {
                    return failure(ParseError::new(
                        ErrorKind::RepeatedKeyword(name.name.clone()),
                        name.span,
                    ));
                }
            }
        }
    }

    Ok((rest, args))
}

/// Comma-separated items up to `close`, with an optional trailing comma.
/// Runs after the opening bracket and also reports whether a comma was seen.
fn sequence<'a, T, F>(close: char, mut item: F) -> impl FnMut(Input<'a>) -> ParserResult<'a, (Vec<T>, bool)>
where
    F: FnMut(Input<'a>) -> ParserResult<'a, T>,
{
    let expected = match close {
        ')' => "`,` or `)`",
        ']' => "`,` or `]`",
        _ => "`,` or `}`",
    };

    move |input: Input<'a>| {
        let mut items = Vec::new();
        let mut comma = false;
        let (mut rest, _) = any_ws(input)?;

        loop {
            if let Ok((after, _)) = char::<_, ParseError>(close)(rest) {
                return Ok((after, (items, comma)));
            }

            let (after, value) = item(rest)?;
            items.push(value);
            let (after, _) = any_ws(after)?;

            if let Ok((after, _)) = char::<_, ParseError>(',')(after) {
                comma = true;
                rest = any_ws(after)?.0;
            } else if let Ok((after, _)) = char::<_, ParseError>(close)(after) {
                return Ok((after, (items, comma)));
            } else {
                return failure(unexpected(expected, &after));
            }
        }
    }
}

fn argument(input: Input) -> ParserResult<Argument> {
    alt((keyword_argument, map(expr, Argument::Positional)))(input)
}

fn keyword_argument(input: Input) -> ParserResult<Argument> {
    let (rest, name) = identifier(input)?;
    let (rest, _) = any_ws(rest)?;
    let (rest, _) = terminated(char('='), not(char('=')))(rest)?;

    if matches!(name.name.as_str(), "True" | "False" | "None") {
        return failure(ParseError::new(ErrorKind::ReservedName(name.name), name.span));
    }

    let (rest, _) = any_ws(rest)?;
    let (rest, value) = cut(expr)(rest)?;
    Ok((rest, Argument::Keyword { name, value }))
}

fn expr(input: Input) -> ParserResult<Expr> {
    context(
        "a value",
        alt((strings, numeric, name, list, parenthesized, dict)),
    )(input)
}

/// Adjacent string literals, joined into one value.
fn strings(input: Input) -> ParserResult<Expr> {
    let (rest, (mut text, mut span)) = string_literal(input)?;
    let (rest, more) = many0(preceded(any_ws, string_literal))(rest)?;
    for (part, part_span) in more {
        text.push_str(&part);
        span = span.to(part_span);
    }

    Ok((
        rest,
        Expr {
            kind: ExprKind::Str(text),
            span,
        },
    ))
}

fn numeric(input: Input) -> ParserResult<Expr> {
    map(number, |(number, span)| Expr {
        kind: match number {
            Number::Int(i) => ExprKind::Int(i),
            Number::Float(f) => ExprKind::Float(f),
        },
        span,
    })(input)
}

fn name(input: Input) -> ParserResult<Expr> {
    map(identifier, |ident| Expr {
        kind: ExprKind::Name(ident.name),
        span: ident.span,
    })(input)
}

fn list(input: Input) -> ParserResult<Expr> {
    let start = offset(&input);
    let (rest, _) = char('[')(input)?;
    let (rest, (items, _)) = cut(sequence(']', expr))(rest)?;

    Ok((
        rest,
        Expr {
            kind: ExprKind::List(items),
            span: Span::new(start, offset(&rest)),
        },
    ))
}

/// A tuple, or a single value in parentheses when there is no comma.
fn parenthesized(input: Input) -> ParserResult<Expr> {
    let start = offset(&input);
    let (rest, _) = char('(')(input)?;
    let (rest, (mut items, comma)) = cut(sequence(')', expr))(rest)?;
    let span = Span::new(start, offset(&rest));

    let kind = match items.pop() {
        Some(only) if items.is_empty() && !comma => only.kind,
        Some(last) => {
            items.push(last);
            ExprKind::List(items)
        }
        None => ExprKind::List(items),
    };
    Ok((rest, Expr { kind, span }))
}

fn dict(input: Input) -> ParserResult<Expr> {
    let start = offset(&input);
    let (rest, _) = char('{')(input)?;
    let (rest, (entries, _)) = cut(sequence('}', dict_entry))(rest)?;

    Ok((
        rest,
        Expr {
            kind: ExprKind::Dict(entries),
            span: Span::new(start, offset(&rest)),
        },
    ))
}

fn dict_entry(input: Input) -> ParserResult<(Expr, Expr)> {
    let (rest, key) = expr(input)?;
    let (rest, _) = any_ws(rest)?;
    let (rest, _) = cut(context("`:`", char(':')))(rest)?;
    let (rest, _) = any_ws(rest)?;
    let (rest, value) = cut(expr)(rest)?;
    Ok((rest, (key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statements() {
        let program = parse_program(
            "source('https://pypi.org/simple', verify_ssl=True)\n\
             package('requests', '>=2.0')\n\
             \n\
             dev_package('pytest', extras=['cov', 'xdist'],)\n",
        )
        .unwrap();

        assert_eq!(program.statements.len(), 3);
        let source = &program.statements[0];
        assert_eq!(source.callee.name, "source");
        assert_eq!(source.positional_count(), 1);
        assert_eq!(source.span, Span::new(0, 50));
        match &source.args[1] {
            Argument::Keyword { name, value } => {
                assert_eq!(name.name, "verify_ssl");
                assert_eq!(value.kind, ExprKind::Name("True".into()));
            }
            other => panic!("expected keyword argument, got {:?}", other),
        }

        match &program.statements[2].args[1] {
            Argument::Keyword { value, .. } => match &value.kind {
                ExprKind::List(items) => assert_eq!(items.len(), 2),
                other => panic!("expected list, got {:?}", other),
            },
            other => panic!("expected keyword argument, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        let program = parse_program("\n# only a comment\n   \n").unwrap();
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_newlines_inside_brackets_are_joined() {
        let program = parse_program(
            "package(\n    'requests',  # pinned below\n    extras=[\n        'security',\n    ],\n)\n",
        )
        .unwrap();
        assert_eq!(program.statements.len(), 1);
        assert_eq!(program.statements[0].args.len(), 2);
    }

    #[test]
    fn test_semicolons_and_continuations() {
        let program = parse_program("source('a'); package('b');\npackage \\\n  ('c')\r\n").unwrap();
        let names: Vec<_> = program
            .statements
            .iter()
            .map(|c| c.callee.name.as_str())
            .collect();
        assert_eq!(names, ["source", "package", "package"]);
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        let program = parse_program("package('req'\n        'uests', 'a' \"b\")").unwrap();
        let args = &program.statements[0].args;
        match (&args[0], &args[1]) {
            (Argument::Positional(first), Argument::Positional(second)) => {
                assert_eq!(first.kind, ExprKind::Str("requests".into()));
                assert_eq!(first.span, Span::new(8, 29));
                assert_eq!(second.kind, ExprKind::Str("ab".into()));
            }
            other => panic!("expected two positional arguments, got {:?}", other),
        }
    }

    #[test]
    fn test_tuple_dict_and_float_values() {
        let program =
            parse_program("package('a', extras=('x',), pin=(1), markers={'os': 'posix'}, rank=0.5)")
                .unwrap();
        let values: Vec<&ExprKind> = program.statements[0]
            .args
            .iter()
            .filter_map(|a| match a {
                Argument::Keyword { value, .. } => Some(&value.kind),
                _ => None,
            })
            .collect();

        assert!(matches!(values[0], ExprKind::List(items) if items.len() == 1));
        assert_eq!(values[1], &ExprKind::Int(1));
        assert!(matches!(values[2], ExprKind::Dict(entries) if entries.len() == 1));
        assert_eq!(values[3], &ExprKind::Float(0.5));
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse_program("package('a')\n  package('b')\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedIndent);
        assert_eq!(err.span, Span::new(13, 15));
    }

    #[test]
    fn test_literal_keyword_rejected() {
        let err = parse_program("package('a', True=1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReservedName("True".into()));
        assert_eq!(err.span, Span::new(13, 17));

        let err = parse_program("source(None='x')").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReservedName("None".into()));
    }

    #[test]
    fn test_positional_after_keyword() {
        let err = parse_program("package(name='six', '1.0')").unwrap_err();
        assert_eq!(err.kind, ErrorKind::PositionalAfterKeyword);
    }

    #[test]
    fn test_repeated_keyword() {
        let err = parse_program("source('x', name='a', name='b')").unwrap_err();
        assert_eq!(err.kind, ErrorKind::RepeatedKeyword("name".into()));
        assert_eq!(err.span, Span::new(22, 26));
    }

    #[test]
    fn test_two_statements_on_one_line() {
        let err = parse_program("package('a') package('b')").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::UnexpectedToken {
                expected: "end of statement",
                ..
            }
        ));
    }

    #[test]
    fn test_unclosed_call() {
        let err = parse_program("package('a'").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedToken {
                expected: "`,` or `)`",
                found: "end of file".into()
            }
        );
    }

    #[test]
    fn test_unterminated_string_location() {
        let err = parse_program("package('flask)\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
        assert_eq!(err.span.start, 8);
    }

    #[test]
    fn test_bare_expression_statement() {
        let err = parse_program("'just a string'").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::UnexpectedToken {
                expected: "a statement",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_value() {
        let err = parse_program("package('a',,)").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedToken {
                expected: "a value",
                found: "`,`".into()
            }
        );
        assert_eq!(err.span, Span::new(12, 13));
    }

    #[test]
    fn test_unexpected_character() {
        let err = parse_program("package('a') + 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedChar('+'));
        assert_eq!(err.span, Span::new(13, 14));
    }

    #[test]
    fn test_nested_call_rejected() {
        assert!(parse_program("package(open('x'))").is_err());
        assert!(parse_program("source('x')('y')").is_err());
        assert!(parse_program("package(a == 'x')").is_err());
    }
}
