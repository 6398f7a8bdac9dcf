//! Entity records as seen by plugins.
//!
//! A [`Record`] is a loosely-typed field map plus an optional identity and
//! the failure markers attached when a dispatch aborts. The host shim reads
//! those markers to block the outer insert/update/delete.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::RecordId;

/// Record state before an update, keyed by record identity.
///
/// Records newly matched by an update may have no entry.
pub type PriorState = HashMap<RecordId, Record>;

/// A failure marker attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    /// Human-readable failure message.
    pub message: String,
    /// Constructor reference of the plugin that failed, if any.
    pub origin: Option<String>,
}

/// One entity in a lifecycle batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identity; absent for records that have not been persisted yet.
    pub id: Option<RecordId>,
    /// Field values.
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Failure markers.
    #[serde(default)]
    errors: Vec<RecordError>,
}

impl Record {
    /// Creates an empty record without identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record with the given identity.
    pub fn with_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Sets a field, builder style.
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Gets a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Gets a string field value.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    /// Gets an i64 field value.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(|v| v.as_i64())
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        self.fields.insert(name.to_string(), value)
    }

    /// Whether the field is present and not null.
    pub fn has_value(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|v| !v.is_null())
    }

    /// Attaches a failure marker.
    pub fn add_error(&mut self, message: impl Into<String>, origin: Option<&str>) {
        self.errors.push(RecordError {
            message: message.into(),
            origin: origin.map(str::to_string),
        });
    }

    /// Failure markers attached so far.
    pub fn errors(&self) -> &[RecordError] {
        &self.errors
    }

    /// Whether any failure marker is attached.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Names of fields whose value differs from `prior`, sorted.
    pub fn changed_fields(&self, prior: &Record) -> Vec<String> {
        let mut changed: Vec<String> = self
            .fields
            .iter()
            .filter(|&(name, value)| prior.fields.get(name) != Some(value))
            .map(|(name, _)| name.clone())
            .chain(
                prior
                    .fields
                    .keys()
                    .filter(|name| !self.fields.contains_key(name.as_str()))
                    .cloned(),
            )
            .collect();
        changed.sort();
        changed
    }
}
