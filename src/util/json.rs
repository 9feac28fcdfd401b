//! Deterministic JSON output for snapshots.
//!
//! Output has sorted keys, four-space indentation, `,` between items and
//! `: ` between key and value, and escapes everything outside printable
//! ASCII as `\uXXXX`. The same value always renders to the same bytes.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::Value;

/// Pretty formatter that keeps output ASCII-only.
pub struct SnapshotFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl Default for SnapshotFormatter<'_> {
    fn default() -> Self {
        SnapshotFormatter {
            inner: PrettyFormatter::with_indent(b"    "),
        }
    }
}

impl Formatter for SnapshotFormatter<'_> {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

/// Render `value` with sorted keys and stable formatting.
pub fn to_sorted_string<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let value = sort_keys(serde_json::to_value(value)?);

    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SnapshotFormatter::default());
    value.serialize(&mut ser)?;

    // The formatter only ever writes ASCII.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Rebuild every object with its keys in byte order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sorted_keys_and_indent() {
        let value = json!({"b": [1, 2], "a": {"d": true, "c": null}, "e": []});
        let text = to_sorted_string(&value).unwrap();

        assert_eq!(
            text,
            "{\n    \"a\": {\n        \"c\": null,\n        \"d\": true\n    },\n    \"b\": [\n        1,\n        2\n    ],\n    \"e\": []\n}"
        );
    }

    #[test]
    fn test_no_trailing_whitespace() {
        let value = json!({"x": [{"y": "z"}], "w": {}});
        let text = to_sorted_string(&value).unwrap();

        assert!(text.lines().all(|line| !line.ends_with(' ')));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let text = to_sorted_string(&json!({"name": "caf\u{e9} \u{1f40d}\u{7f}"})).unwrap();
        assert!(text.contains(r#""caf\u00e9 \ud83d\udc0d\u007f""#));
        assert!(text.is_ascii());
    }

    #[test]
    fn test_control_characters_use_short_escapes() {
        let text = to_sorted_string(&json!(["a\nb\t\"c\\"])).unwrap();
        assert!(text.contains(r#""a\nb\t\"c\\""#));
    }
}
