/// Scope qualifiers
///
/// Qualifiers are the `?key=value&key=value` tail of a VRN. Generic matching
/// never interprets them; a policy validates them through its own hook.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::types::{ScopeError, ScopeResult};

/// Flat, order-irrelevant key/value constraints attached to a scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Qualifiers {
    entries: BTreeMap<String, String>,
}

impl Qualifiers {
    /// Creates an empty qualifier set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `key=value&key=value` string
    ///
    /// An empty string yields an empty set. Every pair must contain `=`.
    pub fn parse(s: &str) -> ScopeResult<Self> {
        let mut entries = BTreeMap::new();

        for pair in s.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                ScopeError::InvalidQualifiers(format!("missing '=' in '{}'", pair))
            })?;

            if key.is_empty() {
                return Err(ScopeError::InvalidQualifiers(format!(
                    "empty key in '{}'",
                    pair
                )));
            }

            entries.insert(key.to_string(), value.to_string());
        }

        Ok(Self { entries })
    }

    /// Adds a qualifier
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Returns the value of a qualifier
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates qualifiers in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<BTreeMap<String, String>> for Qualifiers {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<K, V> FromIterator<(K, V)> for Qualifiers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl FromStr for Qualifiers {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (key, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
