//! Lexical building blocks of the manifest statement language.
//!
//! Every parser here runs over [`Input`], a [`LocatedSpan`] of the manifest
//! source, so values come back with the byte offsets diagnostics point at.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1, take_while_m_n};
use nom::character::complete::{char, digit1, satisfy};
use nom::combinator::{map, opt, recognize, value};
use nom::error::{ContextError, ErrorKind as NomErrorKind, ParseError as NomParseError};
use nom::multi::{fold_many0, many0_count};
use nom::sequence::{pair, preceded, tuple};
use nom::IResult;
use nom_locate::LocatedSpan;

use super::ast::Ident;
use super::error::{ErrorKind, ParseError, Span};

/// Manifest source annotated with byte offsets.
pub type Input<'a> = LocatedSpan<&'a str>;

pub type ParserResult<'a, T> = IResult<Input<'a>, T, ParseError>;

/// Stand-in for `expected` until a [`nom::error::context`] names it.
const UNNAMED: &str = "valid syntax";

impl<'a> NomParseError<Input<'a>> for ParseError {
    fn from_error_kind(input: Input<'a>, _kind: NomErrorKind) -> Self {
        unexpected(UNNAMED, &input)
    }

    fn append(_input: Input<'a>, _kind: NomErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a> ContextError<Input<'a>> for ParseError {
    fn add_context(_input: Input<'a>, ctx: &'static str, mut other: Self) -> Self {
        // The innermost context names what was expected.
        if let ErrorKind::UnexpectedToken { expected, .. } = &mut other.kind {
            if *expected == UNNAMED {
                *expected = ctx;
            }
        }
        other
    }
}

pub fn offset(input: &Input) -> usize {
    input.location_offset()
}

/// Span covered by a recognized fragment.
pub fn span_of(fragment: &Input) -> Span {
    let start = offset(fragment);
    Span::new(start, start + fragment.fragment().len())
}

pub(crate) fn failure<T>(err: ParseError) -> Result<T, nom::Err<ParseError>> {
    Err(nom::Err::Failure(err))
}

/// An error for whatever token starts at `input`.
pub(crate) fn unexpected(expected: &'static str, input: &Input) -> ParseError {
    let start = offset(input);
    match input.fragment().chars().next() {
        Some(c) if !is_token_start(c) => {
            ParseError::new(ErrorKind::UnexpectedChar(c), Span::new(start, start + c.len_utf8()))
        }
        _ => {
            let (found, len) = describe(input.fragment());
            ParseError::new(
                ErrorKind::UnexpectedToken { expected, found },
                Span::new(start, start + len),
            )
        }
    }
}

/// Name the token at the start of `rest`, with its length in bytes.
fn describe(rest: &str) -> (String, usize) {
    let Some(c) = rest.chars().next() else {
        return ("end of file".to_string(), 0);
    };
    match c {
        '\n' | ';' => ("end of statement".to_string(), 1),
        '\'' | '"' => ("string literal".to_string(), 1),
        c if c.is_ascii_digit() || c == '-' && rest[1..].starts_with(|d: char| d.is_ascii_digit()) => {
            let len = 1 + rest[1..]
                .find(|d: char| !d.is_ascii_digit() && d != '.')
                .unwrap_or(rest.len() - 1);
            (format!("number `{}`", &rest[..len]), len)
        }
        c if is_ident_start(c) => {
            let len = rest.find(|d: char| !is_ident_char(d)).unwrap_or(rest.len());
            (format!("name `{}`", &rest[..len]), len)
        }
        c => (format!("`{}`", c.escape_debug()), c.len_utf8()),
    }
}

fn is_token_start(c: char) -> bool {
    is_ident_char(c)
        || is_space(c)
        || matches!(
            c,
            '\'' | '"' | '(' | ')' | '[' | ']' | '{' | '}' | ',' | '=' | ':' | '-' | '.' | ';' | '#'
                | '\\' | '\n'
        )
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c' | '\r')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A `#` comment, up to but not including the newline.
fn comment(input: Input) -> ParserResult<()> {
    value((), pair(char('#'), take_while(|c: char| c != '\n')))(input)
}

/// A backslash joining the next physical line.
fn continuation(input: Input) -> ParserResult<()> {
    value((), alt((tag("\\\n"), tag("\\\r\n"))))(input)
}

/// Leading whitespace of a physical line.
pub fn indentation(input: Input) -> ParserResult<Input> {
    take_while(|c: char| matches!(c, ' ' | '\t' | '\x0c'))(input)
}

/// Spaces, comments and continuations within one logical line.
pub fn inline_ws(input: Input) -> ParserResult<()> {
    value(
        (),
        many0_count(alt((value((), take_while1(is_space)), continuation, comment))),
    )(input)
}

/// Whitespace inside brackets, where newlines carry no meaning.
pub fn any_ws(input: Input) -> ParserResult<()> {
    value(
        (),
        many0_count(alt((
            value((), take_while1(|c: char| is_space(c) || c == '\n')),
            continuation,
            comment,
        ))),
    )(input)
}

/// An identifier. A quote right after it makes it a string prefix, as in `r'...'`.
pub fn identifier(input: Input) -> ParserResult<Ident> {
    let (rest, name) = recognize(pair(satisfy(is_ident_start), take_while(is_ident_char)))(input)?;
    let span = span_of(&name);
    if rest.fragment().starts_with(|c: char| c == '\'' || c == '"') {
        return failure(ParseError::new(
            ErrorKind::StringPrefix(name.fragment().to_string()),
            Span::new(span.start, span.end + 1),
        ));
    }
    Ok((
        rest,
        Ident {
            name: name.fragment().to_string(),
            span,
        },
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// A decimal integer or float with an optional leading `-`.
pub fn number(input: Input) -> ParserResult<(Number, Span)> {
    let (rest, text) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;
    let span = span_of(&text);
    let literal: &str = text.fragment();

    let parsed = if literal.contains('.') {
        literal
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::Float)
    } else {
        literal.parse::<i64>().ok().map(Number::Int)
    };

    match parsed {
        Some(number) => Ok((rest, (number, span))),
        None => failure(ParseError::new(
            ErrorKind::InvalidNumber(literal.to_string()),
            span,
        )),
    }
}

#[derive(Debug, Clone)]
enum Piece<'a> {
    Text(&'a str),
    Char(char),
    /// An unknown escape; the backslash is kept.
    Verbatim(char),
    Skip,
}

/// `\x` and `\u` escapes: exactly `digits` hex digits naming a character.
fn hex_escape<'a>(digits: usize) -> impl FnMut(Input<'a>) -> ParserResult<'a, Piece<'a>> {
    move |input: Input<'a>| {
        // Back over the backslash and the `x`/`u`.
        let start = offset(&input) - 2;
        let invalid = |at: &Input| {
            nom::Err::Failure(ParseError::new(
                ErrorKind::InvalidEscape,
                Span::new(start, offset(at)),
            ))
        };
        let (rest, hex) = take_while_m_n(digits, digits, |c: char| c.is_ascii_hexdigit())(input)
            .map_err(|_: nom::Err<ParseError>| invalid(&input))?;
        let c = u32::from_str_radix(hex.fragment(), 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| invalid(&rest))?;
        Ok((rest, Piece::Char(c)))
    }
}

fn escape(input: Input) -> ParserResult<Piece> {
    alt((
        value(Piece::Skip, alt((tag("\n"), tag("\r\n")))),
        value(Piece::Char('\\'), char('\\')),
        value(Piece::Char('\''), char('\'')),
        value(Piece::Char('"'), char('"')),
        value(Piece::Char('\n'), char('n')),
        value(Piece::Char('\t'), char('t')),
        value(Piece::Char('\r'), char('r')),
        value(Piece::Char('\0'), char('0')),
        preceded(char('x'), hex_escape(2)),
        preceded(char('u'), hex_escape(4)),
        map(satisfy(|_| true), Piece::Verbatim),
    ))(input)
}

fn string_piece<'a>(input: Input<'a>, quote: char) -> ParserResult<'a, Piece<'a>> {
    alt((
        map(
            take_while1(move |c: char| c != quote && c != '\\' && c != '\n'),
            |text: Input<'a>| Piece::Text(*text.fragment()),
        ),
        preceded(char('\\'), escape),
    ))(input)
}

/// A single- or double-quoted string literal, with escapes resolved.
pub fn string_literal<'a>(input: Input<'a>) -> ParserResult<'a, (String, Span)> {
    let start = offset(&input);
    let (rest, quote) = alt((char('\''), char('"')))(input)?;

    let doubled = if quote == '\'' { "''" } else { "\"\"" };
    if rest.fragment().starts_with(doubled) {
        return failure(ParseError::new(
            ErrorKind::TripleQuoted,
            Span::new(start, start + 3),
        ));
    }

    let (rest, text) = fold_many0(
        |i: Input<'a>| string_piece(i, quote),
        String::new,
        |mut acc: String, piece: Piece<'a>| {
            match piece {
                Piece::Text(text) => acc.push_str(text),
                Piece::Char(c) => acc.push(c),
                Piece::Verbatim(c) => {
                    acc.push('\\');
                    acc.push(c);
                }
                Piece::Skip => {}
            }
            acc
        },
    )(rest)?;

    match char::<_, ParseError>(quote)(rest) {
        Ok((rest, _)) => Ok((rest, (text, Span::new(start, offset(&rest))))),
        Err(_) => failure(ParseError::new(
            ErrorKind::UnterminatedString,
            Span::new(start, offset(&rest)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(src: &str) -> Result<String, ParseError> {
        match string_literal(Input::new(src)) {
            Ok((rest, (text, _))) => {
                assert_eq!(*rest.fragment(), "");
                Ok(text)
            }
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(e),
            Err(nom::Err::Incomplete(_)) => unreachable!(),
        }
    }

    #[test]
    fn test_identifier() {
        let (rest, ident) = identifier(Input::new("dev_package(")).unwrap();
        assert_eq!(ident.name, "dev_package");
        assert_eq!(ident.span, Span::new(0, 11));
        assert_eq!(*rest.fragment(), "(");
    }

    #[test]
    fn test_string_prefix_rejected() {
        let err = match identifier(Input::new("r'raw'")) {
            Err(nom::Err::Failure(e)) => e,
            other => panic!("expected failure, got {:?}", other),
        };
        assert_eq!(err.kind, ErrorKind::StringPrefix("r".into()));
        assert_eq!(err.span, Span::new(0, 2));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            string(r#""a\"b\n\x41é\q""#).unwrap(),
            "a\"b\nA\u{e9}\\q"
        );
        assert_eq!(string(r"'é\t'").unwrap(), "\u{e9}\t");
    }

    #[test]
    fn test_string_line_continuation() {
        assert_eq!(string("'a\\\nb'").unwrap(), "ab");
        assert_eq!(string("'a\\\r\nb'").unwrap(), "ab");
    }

    #[test]
    fn test_invalid_hex_escape() {
        let err = string(r"'\xZZ'").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidEscape);
        assert_eq!(err.span.start, 1);
    }

    #[test]
    fn test_unterminated_string() {
        let err = string("'flask\n'").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
        assert_eq!(err.span, Span::new(0, 6));

        let err = string("'trailing\\").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
    }

    #[test]
    fn test_triple_quoted_rejected() {
        assert_eq!(string("'''doc'''").unwrap_err().kind, ErrorKind::TripleQuoted);
        assert_eq!(string("\"\"\"doc\"\"\"").unwrap_err().kind, ErrorKind::TripleQuoted);
        assert_eq!(string("''").unwrap(), "");
    }

    #[test]
    fn test_numbers() {
        let (_, (n, span)) = number(Input::new("-42)")).unwrap();
        assert_eq!(n, Number::Int(-42));
        assert_eq!(span, Span::new(0, 3));

        let (_, (n, _)) = number(Input::new("2.5")).unwrap();
        assert_eq!(n, Number::Float(2.5));

        match number(Input::new("99999999999999999999")) {
            Err(nom::Err::Failure(e)) => {
                assert_eq!(e.kind, ErrorKind::InvalidNumber("99999999999999999999".into()))
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_whitespace_and_comments() {
        let (rest, _) = inline_ws(Input::new("  # note\n  next")).unwrap();
        assert_eq!(*rest.fragment(), "\n  next");

        let (rest, _) = inline_ws(Input::new(" \\\r\n  next")).unwrap();
        assert_eq!(*rest.fragment(), "next");

        let (rest, _) = any_ws(Input::new("  # note\n\t\n  next")).unwrap();
        assert_eq!(*rest.fragment(), "next");
    }

    #[test]
    fn test_unexpected_describes_next_token() {
        let err = unexpected("a value", &Input::new("+ 1"));
        assert_eq!(err.kind, ErrorKind::UnexpectedChar('+'));

        let err = unexpected("a value", &Input::new("version)"));
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedToken {
                expected: "a value",
                found: "name `version`".into()
            }
        );
        assert_eq!(err.span, Span::new(0, 7));

        let err = unexpected("`)`", &Input::new(""));
        assert!(matches!(err.kind, ErrorKind::UnexpectedToken { ref found, .. } if found == "end of file"));
    }
}
