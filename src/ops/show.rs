//! Human-readable manifest listing.

use std::fmt::Write as _;

use serde_json::Value;

use crate::core::{Attributes, Group, ManifestRecord};

/// Render `record` as an indented listing.
///
/// ```text
/// sources:
///   https://pypi.org/simple (verify_ssl=True)
/// default:
///   requests >=2.0
/// develop:
///   pytest ==3.0.0
/// requires:
///   python_version == '3.9'
/// ```
pub fn format_record(record: &ManifestRecord) -> String {
    if record.is_empty() {
        return "(empty manifest)\n".to_string();
    }

    let mut out = String::new();

    if !record.sources().is_empty() {
        out.push_str("sources:\n");
        for source in record.sources() {
            let _ = writeln!(out, "  {}{}", source.url, format_attrs(&source.attrs));
        }
    }

    for group in Group::ALL {
        let packages = record.packages(group);
        if packages.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}:", group);
        for pkg in packages {
            let version = pkg
                .version
                .as_deref()
                .map(|v| format!(" {}", v))
                .unwrap_or_default();
            let _ = writeln!(out, "  {}{}{}", pkg.name, version, format_attrs(&pkg.attrs));
        }
    }

    if !record.requires().is_empty() {
        out.push_str("requires:\n");
        for req in record.requires() {
            let _ = writeln!(out, "  {} == '{}'", req.marker, req.specifier);
        }
    }

    out
}

fn format_attrs(attrs: &Attributes) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = attrs
        .iter()
        .map(|(key, value)| format!("{}={}", key, format_value(value)))
        .collect();
    format!(" ({})", parts.join(", "))
}

// Manifest literal spelling, so the listing reads like the source.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => format!("'{}'", s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("'{}': {}", key, format_value(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Number(n) => n.to_string(),
    }
}
