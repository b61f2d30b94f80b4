//! Override documents and their merge rules.
//!
//! Overrides are flat JSON objects layered onto a task submission. Each
//! stage computes a mandatory set from its own parameters, then a
//! caller-supplied document is merged on top. Caller keys win on conflict,
//! except the signing credential keys, which are never taken from a caller
//! document.

use std::path::Path;

use log::warn;
use serde_json::{Map, Value};

use crate::error::Error;

/// Override keys that only the signing stage itself may set. A caller
/// document carrying one of these has it dropped from the merge.
pub const PROTECTED_KEYS: &[&str] = &[
    "signing_keystore_password",
    "signing_keystore_alias",
    "signing_keystore_key_password",
    "signing_p12_password",
];

/// A flat JSON override object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides(Map<String, Value>);

impl Overrides {
    /// Creates an empty override set.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Loads an override document from a JSON file. An absent path yields
    /// the empty set, same as an empty document.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be read, or a validation
    /// error when it holds anything but a JSON object.
    pub fn from_file(path: Option<&Path>) -> Result<Self, Error> {
        let Some(path) = path else {
            return Ok(Self::new());
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading overrides file {}", path.display()), e))?;
        let value: Value = serde_json::from_str(&contents).map_err(|e| {
            Error::Validation(format!("overrides file {} is not valid JSON: {e}", path.display()))
        })?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::Validation(format!(
                "overrides file {} must hold a JSON object, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    /// Sets one override.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Reads one override.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// True when no override is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges a caller document over this mandatory set. Caller keys win on
    /// conflict, except `protected` keys, which are dropped from the caller
    /// document with a warning.
    #[must_use]
    pub fn merged_with(&self, caller: &Self, protected: &[&str]) -> Self {
        let mut merged = self.0.clone();
        for (key, value) in &caller.0 {
            if protected.contains(&key.as_str()) {
                warn!("Ignoring protected override key [{key}] from caller document");
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }
        Self(merged)
    }

    /// The compact JSON encoding sent on the wire.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
