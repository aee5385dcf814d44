use serde::{Deserialize, Serialize};

use crate::{KeyValue, Params};

/// Ordered environment passed to a container execution.
///
/// Entries are kept in insertion order and sent to the runtime as-is;
/// when a key appears more than once the later entry wins, both for [`Env::get`] and for the runtime itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(Vec<KeyValue>);

impl Env {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Append an assignment; it shadows any earlier entry with the same key.
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(KeyValue::new(key, value));
    }

    /// Look up the effective value for `key` (last entry wins).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(KeyValue::value)
    }

    /// Append every run parameter after the existing entries.
    pub fn extend_params(&mut self, params: &Params) {
        self.0
            .extend(params.iter().map(|(k, v)| KeyValue::new(k, v)));
    }

    /// Render all entries as `KEY=VALUE` strings, preserving order.
    pub fn to_assignments(&self) -> Vec<String> {
        self.0.iter().map(KeyValue::assignment).collect()
    }
}

impl FromIterator<KeyValue> for Env {
    fn from_iter<I: IntoIterator<Item = KeyValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
