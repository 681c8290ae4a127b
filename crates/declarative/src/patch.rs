//! Key/value configuration patches
//!
//! A [`ConfigPatch`] is a surgical override layered on top of a base mapping:
//! a `Some(value)` entry writes the key, a `None` entry removes it, and keys
//! the patch does not mention are left untouched.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A mapping of configuration keys to string values
pub type ConfigMap = BTreeMap<String, String>;

/// Patch over a [`ConfigMap`] where `None` means "remove this key"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigPatch(BTreeMap<String, Option<String>>);

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `key = value`
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), Some(value.into()));
        self
    }

    /// Remove `key` if present
    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Apply the patch to `base`, producing a new mapping
    pub fn apply(&self, base: &ConfigMap) -> ConfigMap {
        let mut merged = base.clone();
        for (key, value) in &self.0 {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged
    }
}

impl FromIterator<(String, Option<String>)> for ConfigPatch {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Scalar accepted where a string value is expected
///
/// Declarations often write `limits.cpu: 2` or `security.nesting: true`;
/// the external tool only ever stores strings, so scalars are stringified.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Flag(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Flag(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Unsigned(u) => write!(f, "{u}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, Option<Scalar>> = BTreeMap::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(k, v)| (k, v.map(|s| s.to_string())))
            .collect())
    }
}

/// Deserialize a string map, stringifying scalar values
///
/// Use with `#[serde(deserialize_with = "declarative::patch::string_map")]`.
/// A null map decodes as empty.
pub fn string_map<'de, D>(deserializer: D) -> Result<ConfigMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Scalar>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect())
}

/// Parse a `key=value` pair as written on a command line
pub fn parse_assignment(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{input}'")),
    }
}
