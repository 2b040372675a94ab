//! Streams and request parameters.
//!
//! Both are context for a subscribers-group decision. The validator passes
//! them through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::RealmId;
use crate::{Error, Result};

/// The stream a subscribers group would be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Stream identifier.
    pub id: u64,

    /// Realm the stream belongs to.
    pub realm_id: RealmId,

    /// Stream name.
    pub name: String,

    /// Whether the stream is private.
    pub invite_only: bool,
}

impl Stream {
    /// Creates a public stream.
    #[must_use]
    pub fn new(id: u64, realm_id: RealmId, name: impl Into<String>) -> Self {
        Self {
            id,
            realm_id,
            name: name.into(),
            invite_only: false,
        }
    }

    /// Sets whether the stream is private.
    #[must_use]
    pub const fn with_invite_only(mut self, invite_only: bool) -> Self {
        self.invite_only = invite_only;
        self
    }
}

/// Auxiliary request parameters accompanying a group assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, Value>);

impl RequestParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Returns a parameter by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Parses a `KEY=VALUE` pair.
    ///
    /// The value is read as JSON when it parses as JSON and kept as a plain
    /// string otherwise.
    pub fn parse_pair(pair: &str) -> Result<(String, Value)> {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| Error::InvalidInput(format!("expected KEY=VALUE, got '{pair}'")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidInput(format!(
                "parameter name cannot be empty in '{pair}'"
            )));
        }
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok((key.to_string(), value))
    }
}

impl FromIterator<(String, Value)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair_json_value() {
        let (key, value) = RequestParams::parse_pair("is_web_public=true").expect("valid pair");
        assert_eq!(key, "is_web_public");
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn test_parse_pair_plain_string() {
        let (key, value) = RequestParams::parse_pair("description=new stream").expect("valid pair");
        assert_eq!(key, "description");
        assert_eq!(value, Value::String("new stream".to_string()));
    }

    #[test]
    fn test_parse_pair_rejects_missing_separator() {
        assert!(RequestParams::parse_pair("description").is_err());
        assert!(RequestParams::parse_pair("=value").is_err());
    }

    #[test]
    fn test_params_collect() {
        let params: RequestParams = [("a".to_string(), Value::from(1))].into_iter().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("a"), Some(&Value::from(1)));
        assert!(RequestParams::new().is_empty());
    }
}
