//! Realm (tenant) identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Isolation boundary within which group names, role tags and user IDs are
/// unique.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RealmId(String);

impl RealmId {
    /// Creates a new realm ID from the given string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RealmId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RealmId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
