//! The normalized manifest record.
//!
//! A [`ManifestRecord`] holds everything a manifest declares: package
//! sources, requirement assertions and the two package groups. Entries keep
//! their keys in declaration order; the snapshot layer sorts on output.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Ordered key/value attributes attached to a source or package.
///
/// Iteration follows insertion order. Inserting an existing key replaces
/// its value in place, keeping the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

impl Attributes {
    /// Create an empty attribute list.
    pub fn new() -> Self {
        Attributes {
            entries: Vec::new(),
        }
    }

    /// Insert or replace an attribute, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Look up an attribute by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Attribute keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

/// A package index declared with `source(url, ...)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct SourceEntry {
    pub url: String,
    pub attrs: Attributes,
}

impl SourceEntry {
    pub fn new(url: impl Into<String>) -> Self {
        SourceEntry {
            url: url.into(),
            attrs: Attributes::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }
}

impl Serialize for SourceEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.attrs.len()))?;
        map.serialize_entry("url", &self.url)?;
        for (key, value) in self.attrs.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl TryFrom<Map<String, Value>> for SourceEntry {
    type Error = String;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let url = take_string(&mut map, "url")?.ok_or("source entry is missing `url`")?;
        Ok(SourceEntry {
            url,
            attrs: map.into_iter().collect(),
        })
    }
}

/// A dependency declared with `package(...)` or `dev_package(...)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PackageEntry {
    pub name: String,
    /// Version specifier; absent when declared empty or not at all
    pub version: Option<String>,
    pub attrs: Attributes,
}

impl PackageEntry {
    pub fn new(name: impl Into<String>) -> Self {
        PackageEntry {
            name: name.into(),
            version: None,
            attrs: Attributes::new(),
        }
    }

    /// Set the version, eliding empty strings.
    pub fn with_version(mut self, version: Option<impl Into<String>>) -> Self {
        self.version = version.map(Into::into).filter(|v: &String| !v.is_empty());
        self
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }
}

impl Serialize for PackageEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 1 + usize::from(self.version.is_some()) + self.attrs.len();
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("name", &self.name)?;
        if let Some(ref version) = self.version {
            map.serialize_entry("version", version)?;
        }
        for (key, value) in self.attrs.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl TryFrom<Map<String, Value>> for PackageEntry {
    type Error = String;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let name = take_string(&mut map, "name")?.ok_or("package entry is missing `name`")?;
        let version = take_string(&mut map, "version")?;
        Ok(PackageEntry::new(name)
            .with_version(version)
            .with_attrs(map.into_iter().collect()))
    }
}

/// An environment assertion declared with `requires(...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub marker: String,
    pub specifier: String,
}

impl RequirementEntry {
    pub fn new(marker: impl Into<String>, specifier: impl Into<String>) -> Self {
        RequirementEntry {
            marker: marker.into(),
            specifier: specifier.into(),
        }
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(format!("`{}` must be a string, found {}", key, other)),
    }
}

/// One of the two package buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// Production dependencies
    Default,
    /// Development-only dependencies
    Develop,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Default, Group::Develop];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Default => "default",
            Group::Develop => "develop",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Meta {
    #[serde(default)]
    sources: Vec<SourceEntry>,
    #[serde(default)]
    requires: Vec<RequirementEntry>,
}

/// Everything a manifest declares.
///
/// Serializes as `{"_meta": {"sources", "requires"}, "default", "develop"}`.
/// Both groups are always present, even when empty. Entries can only be
/// appended; nothing already recorded is modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    #[serde(rename = "_meta")]
    meta: Meta,
    #[serde(default)]
    default: Vec<PackageEntry>,
    #[serde(default)]
    develop: Vec<PackageEntry>,
}

impl ManifestRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> &[SourceEntry] {
        &self.meta.sources
    }

    pub fn requires(&self) -> &[RequirementEntry] {
        &self.meta.requires
    }

    /// Packages in a group, in declaration order.
    pub fn packages(&self, group: Group) -> &[PackageEntry] {
        match group {
            Group::Default => &self.default,
            Group::Develop => &self.develop,
        }
    }

    /// Find a package by name in a group.
    pub fn package(&self, group: Group, name: &str) -> Option<&PackageEntry> {
        self.packages(group).iter().find(|p| p.name == name)
    }

    /// Names of every declared package, default group first.
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.default
            .iter()
            .chain(self.develop.iter())
            .map(|p| p.name.as_str())
    }

    /// Read a record back from snapshot JSON.
    ///
    /// Keys the record does not model, such as the digest, are ignored.
    pub fn from_snapshot(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn is_empty(&self) -> bool {
        self.meta.sources.is_empty()
            && self.meta.requires.is_empty()
            && self.default.is_empty()
            && self.develop.is_empty()
    }

    pub fn push_source(&mut self, source: SourceEntry) {
        self.meta.sources.push(source);
    }

    pub fn push_requirement(&mut self, requirement: RequirementEntry) {
        self.meta.requires.push(requirement);
    }

    pub fn push_package(&mut self, group: Group, package: PackageEntry) {
        match group {
            Group::Default => self.default.push(package),
            Group::Develop => self.develop.push(package),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attributes_keep_insertion_order() {
        let mut attrs = Attributes::new();
        attrs.insert("verify_ssl", true);
        attrs.insert("name", "pypi");
        attrs.insert("alpha", 1);

        let keys: Vec<_> = attrs.keys().collect();
        assert_eq!(keys, vec!["verify_ssl", "name", "alpha"]);
    }

    #[test]
    fn test_attributes_replace_in_place() {
        let mut attrs: Attributes = [("a", 1), ("b", 2)].into_iter().collect();
        let old = attrs.insert("a", 3);

        assert_eq!(old, Some(json!(1)));
        assert_eq!(attrs.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(attrs.get("a"), Some(&json!(3)));
    }

    #[test]
    fn test_package_entry_serializes_in_declaration_order() {
        let mut attrs = Attributes::new();
        attrs.insert("extras", json!(["security"]));
        attrs.insert("editable", true);
        let pkg = PackageEntry::new("requests")
            .with_version(Some(">=2.0"))
            .with_attrs(attrs);

        let text = serde_json::to_string(&pkg).unwrap();
        assert_eq!(
            text,
            r#"{"name":"requests","version":">=2.0","extras":["security"],"editable":true}"#
        );
    }

    #[test]
    fn test_empty_version_is_elided() {
        let pkg = PackageEntry::new("flask").with_version(Some(""));
        assert_eq!(pkg.version, None);
        assert_eq!(serde_json::to_string(&pkg).unwrap(), r#"{"name":"flask"}"#);
    }

    #[test]
    fn test_record_shape() {
        let mut record = ManifestRecord::new();
        record.push_source(SourceEntry::new("https://pypi.org/simple"));
        record.push_package(Group::Develop, PackageEntry::new("mock"));
        record.push_requirement(RequirementEntry::new("python_version", "2.7"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "_meta": {
                    "sources": [{"url": "https://pypi.org/simple"}],
                    "requires": [{"marker": "python_version", "specifier": "2.7"}],
                },
                "default": [],
                "develop": [{"name": "mock"}],
            })
        );
    }

    #[test]
    fn test_record_deserializes_entries() {
        let record: ManifestRecord = serde_json::from_value(json!({
            "_meta": {
                "sources": [{"url": "https://pypi.org/simple", "verify_ssl": true}],
                "requires": [],
                "manifest-sha256": "ignored",
            },
            "default": [{"name": "six", "version": "1.12.0"}],
            "develop": [],
        }))
        .unwrap();

        assert_eq!(record.sources()[0].attrs.get("verify_ssl"), Some(&json!(true)));
        let six = record.package(Group::Default, "six").unwrap();
        assert_eq!(six.version.as_deref(), Some("1.12.0"));
        assert!(record.packages(Group::Develop).is_empty());
    }

    #[test]
    fn test_from_snapshot_rejects_non_string_version() {
        let json = r#"{"_meta": {}, "default": [{"name": "six", "version": 1}]}"#;
        assert!(ManifestRecord::from_snapshot(json).is_err());
    }

    #[test]
    fn test_package_entry_requires_name() {
        let result: Result<PackageEntry, _> = serde_json::from_value(json!({"version": "1.0"}));
        assert!(result.is_err());
    }
}
