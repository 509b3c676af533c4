//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Dwm.
//! The Dwm project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Dwm Record Module
//!
//! A [`DwmRecord`] is the unit of data that flows through a Dwm pipeline: a
//! flat mapping of field name to an optional string value.
//!
//! ## Blank Values
//!
//! Both a missing value (`None`) and the empty string are treated as blank.
//! Lookup, regex and includes stages never touch blank fields, and derive
//! rules without `overwrite` only write into blank targets.
//!
//! ## Usage Example
//!
//! ```rust
//! use dwm::record::DwmRecord;
//! use serde_json::json;
//!
//! let record = DwmRecord::from_json(&json!({"country": "USA", "zip": 94105}))?;
//! assert_eq!(record.get("zip"), Some("94105"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{DwmError, Result};

/// Flat field map processed by every Dwm stage.
///
/// Fields are kept in name order so that serialized output and history
/// iteration are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DwmRecord {
    fields: BTreeMap<String, Option<String>>,
}

impl DwmRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from a JSON object of scalars.
    ///
    /// Strings are kept as-is, numbers and booleans are stringified and
    /// `null` becomes a blank value. Nested arrays or objects are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| DwmError::schema("record must be a JSON object"))?;

        let mut record = DwmRecord::new();
        for (key, value) in obj {
            let scalar = match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                Value::Bool(b) => Some(b.to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(DwmError::schema(format!(
                        "field '{key}' must hold a scalar value"
                    )))
                }
            };
            record.fields.insert(key.clone(), scalar);
        }
        Ok(record)
    }

    /// Converts the record back into a JSON object.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| {
                let value = v.as_ref().map_or(Value::Null, |s| Value::String(s.clone()));
                (k.clone(), value)
            })
            .collect();
        Value::Object(map)
    }

    /// Builder-style insert, mostly useful in tests and hooks.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns true when the field is absent, null or empty.
    pub fn is_blank(&self, field: &str) -> bool {
        self.get(field).map_or(true, str::is_empty)
    }

    /// Returns the field value only when it is non-blank.
    pub fn non_blank(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), Some(value.into()));
    }

    pub fn set_null(&mut self, field: impl Into<String>) {
        self.fields.insert(field.into(), None);
    }

    pub fn remove(&mut self, field: &str) -> Option<Option<String>> {
        self.fields.remove(field)
    }

    /// Snapshot of the current field names.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for DwmRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = DwmRecord::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

/// Convenience alias for working on batches of records.
pub type DwmRecordBatch = Vec<DwmRecord>;
