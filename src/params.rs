//! OAuth2 request parameters.
//!
//! Every operation in this crate assembles its outgoing parameters the same
//! way: defaults are inserted first, then caller-supplied values, so a caller
//! value for the same key always replaces the default. There is exactly one
//! merge path; no operation is allowed to drop caller parameters.

use crate::error::Result;

/// An ordered string-to-string parameter map.
///
/// Insertion order is preserved so the encoded query string is deterministic.
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a parameter, replacing the value in place if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Apply `overrides` on top of `self`. Override values win.
    pub fn merge(&mut self, overrides: &Params) {
        for (key, value) in &overrides.0 {
            self.insert(key.clone(), value.clone());
        }
    }

    /// Look up a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove a parameter, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    /// Encode as an `application/x-www-form-urlencoded` query string.
    pub fn to_query(&self) -> Result<String> {
        Ok(serde_urlencoded::to_string(&self.0)?)
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}
