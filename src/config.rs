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

//! # Dwm Field Configuration
//!
//! The fields table is the declarative contract of a pipeline: for each field
//! it lists the lookup types that touch the field and the derive rules that
//! compute it.
//!
//! ```yaml
//! name: contacts
//! fields:
//!   country:
//!     lookup: [genericLookup, normLookup]
//!     derive:
//!       - type: deriveValue
//!         fieldSet: [state, city]
//!         options: [blankIfNoMatch]
//! ```
//!
//! Vocabulary values are rejected while deserializing, and [`validate_fields`]
//! runs again when a pipeline is built so that tables assembled in code get
//! the same checks.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{DwmError, Result};
use crate::vocab::{DwmDeriveOption, DwmDeriveType, DwmLookupType, DwmUdfPosition};

/// One derive rule attached to a target field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DwmDeriveRule {
    #[serde(rename = "type")]
    pub derive_type: DwmDeriveType,
    /// Source fields read by the rule, in order.
    #[serde(rename = "fieldSet", default)]
    pub field_set: Vec<String>,
    #[serde(default)]
    pub options: Vec<DwmDeriveOption>,
}

impl DwmDeriveRule {
    pub fn new<I, S>(derive_type: DwmDeriveType, field_set: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            derive_type,
            field_set: field_set.into_iter().map(Into::into).collect(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: DwmDeriveOption) -> Self {
        if !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }

    pub fn overwrite(&self) -> bool {
        self.options.contains(&DwmDeriveOption::Overwrite)
    }

    pub fn blank_if_no_match(&self) -> bool {
        self.options.contains(&DwmDeriveOption::BlankIfNoMatch)
    }

    /// First source field; single-source rule types read only this one.
    pub fn source(&self) -> Option<&str> {
        self.field_set.first().map(String::as_str)
    }
}

/// Per-field configuration entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DwmFieldConfig {
    #[serde(default)]
    pub lookup: Vec<DwmLookupType>,
    #[serde(default)]
    pub derive: Vec<DwmDeriveRule>,
}

impl DwmFieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup(mut self, lookup: DwmLookupType) -> Self {
        if !self.lookup.contains(&lookup) {
            self.lookup.push(lookup);
        }
        self
    }

    pub fn with_derive(mut self, rule: DwmDeriveRule) -> Self {
        self.derive.push(rule);
        self
    }

    pub fn has_lookup(&self, lookup: DwmLookupType) -> bool {
        self.lookup.contains(&lookup)
    }
}

/// Field name to configuration, iterated in name order.
pub type DwmFieldsTable = BTreeMap<String, DwmFieldConfig>;

/// A named fields table as stored in a configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DwmConfig {
    pub name: String,
    #[serde(default)]
    pub fields: DwmFieldsTable,
}

impl DwmConfig {
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: DwmConfig = serde_json::from_str(source)
            .map_err(|err| DwmError::config(format!("invalid configuration: {err}")))?;
        validate_fields(&config.fields)?;
        Ok(config)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: DwmConfig = serde_yaml::from_str(source)
            .map_err(|err| DwmError::config(format!("invalid configuration: {err}")))?;
        validate_fields(&config.fields)?;
        Ok(config)
    }

    /// Loads a configuration file, choosing the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "json" => Self::from_json_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            other => Err(DwmError::validation(format!(
                "unsupported configuration format '{other}'"
            ))),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Checks a fields table before a pipeline may run.
///
/// Vocabulary membership is guaranteed by the enum types; this adds the
/// structural checks on derive rules. Fails on the first violation.
pub fn validate_fields(fields: &DwmFieldsTable) -> Result<()> {
    for (name, config) in fields {
        if name.is_empty() {
            return Err(DwmError::config("field name must not be empty"));
        }

        for rule in &config.derive {
            if rule.field_set.iter().any(String::is_empty) {
                return Err(DwmError::config(format!(
                    "derive rule {} on field '{name}' has an empty source field name",
                    rule.derive_type
                )));
            }

            let arity_ok = match rule.derive_type {
                DwmDeriveType::DeriveValue => !rule.field_set.is_empty(),
                DwmDeriveType::CopyValue
                | DwmDeriveType::DeriveRegex
                | DwmDeriveType::DeriveIncludes => rule.field_set.len() == 1,
            };
            if !arity_ok {
                let expected = match rule.derive_type {
                    DwmDeriveType::DeriveValue => "at least one source field",
                    _ => "exactly one source field",
                };
                return Err(DwmError::config(format!(
                    "derive rule {} on field '{name}' requires {expected}, got {}",
                    rule.derive_type,
                    rule.field_set.len()
                )));
            }
        }
    }
    Ok(())
}

/// Parses UDF position names, failing on the first unknown one.
pub fn validate_udf_positions<'a, I>(names: I) -> Result<Vec<DwmUdfPosition>>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().map(str::parse).collect()
}
