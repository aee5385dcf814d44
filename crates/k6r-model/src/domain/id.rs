use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of hex characters kept from a random v4 UUID.
///
/// 12 hex chars carry 48 random bits; the registry still rejects duplicates on insert.
const RUN_ID_LEN: usize = 12;

/// Opaque short identifier of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        let mut s = Uuid::new_v4().simple().to_string();
        s.truncate(RUN_ID_LEN);
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
