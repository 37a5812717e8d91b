//! Provisioning variables: the contents of the variable store.
//!
//! The store is a flat JSON object (`terraform.tfvars.json`) read by the
//! provisioning tool on its next run. Remediations only ever add or overwrite
//! keys; nothing here removes one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered set of variable assignments.
///
/// Key order follows the source document; keys added by [`Variables::merge`]
/// are appended, overwritten keys keep their position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(Map<String, Value>);

impl Variables {
    /// Creates an empty set of variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a variable document, which must be a JSON object.
    pub fn from_json_str(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    /// Renders the variables as indented JSON for diagnostics and for the store file.
    pub fn to_pretty_json(&self) -> String {
        // A Map<String, Value> always serialises.
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }

    /// Returns the value assigned to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Assigns `value` to `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Number of assigned variables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no variables are assigned.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates assignments in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Merges `updates` into `self`.
    ///
    /// Every key in `updates` is written (overwriting any existing value);
    /// keys absent from `updates` are left untouched.
    pub fn merge(&mut self, updates: &Variables) {
        for (name, value) in updates.iter() {
            self.0.insert(name.clone(), value.clone());
        }
    }
}

impl FromIterator<(String, Value)> for Variables {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
