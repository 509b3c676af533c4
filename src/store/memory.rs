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

//! In-memory implementation of [`DwmLookupStore`].
//!
//! Generic tables (`genericLookup`, `genericRegex`) apply to every field,
//! all other tables are keyed by field name. Exact-match keys are cleaned
//! with [`clean_lookup_value`] on insert and on query, so `" usa "` and
//! `"USA"` hit the same entry.

use std::collections::HashMap;

use crate::errors::{DwmError, Result};
use crate::store::{clean_lookup_value, DwmIncludesRule, DwmLookupStore, DwmRegexRule};
use crate::vocab::{DwmLookupKind, DwmLookupType};

type DeriveKey = (String, Vec<String>, Vec<String>);

#[derive(Clone, Debug, Default)]
pub struct DwmMemoryStore {
    lookups: HashMap<(DwmLookupType, String, String), String>,
    regex: HashMap<(DwmLookupType, String), Vec<DwmRegexRule>>,
    includes: HashMap<String, Vec<DwmIncludesRule>>,
    derive_values: HashMap<DeriveKey, String>,
    derive_regex: HashMap<(String, String), Vec<DwmRegexRule>>,
    derive_includes: HashMap<(String, String), Vec<DwmIncludesRule>>,
}

fn scope(field: &str, lookup_type: DwmLookupType) -> String {
    if lookup_type.is_field_scoped() {
        field.to_string()
    } else {
        String::new()
    }
}

fn expect_kind(lookup_type: DwmLookupType, kind: DwmLookupKind) -> Result<()> {
    if lookup_type.kind() != kind {
        return Err(DwmError::validation(format!(
            "lookup type {lookup_type} does not hold {kind:?} rules"
        )));
    }
    Ok(())
}

impl DwmMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exact-match entry. `field` is ignored for `genericLookup`.
    pub fn add_lookup(
        &mut self,
        lookup_type: DwmLookupType,
        field: &str,
        find: &str,
        replace: impl Into<String>,
    ) -> Result<&mut Self> {
        expect_kind(lookup_type, DwmLookupKind::Exact)?;
        self.lookups.insert(
            (lookup_type, scope(field, lookup_type), clean_lookup_value(find)),
            replace.into(),
        );
        Ok(self)
    }

    /// Appends a regex rule; rules are tried in insertion order.
    pub fn add_regex(
        &mut self,
        lookup_type: DwmLookupType,
        field: &str,
        pattern: &str,
        replace: impl Into<String>,
    ) -> Result<&mut Self> {
        expect_kind(lookup_type, DwmLookupKind::Regex)?;
        let rule = DwmRegexRule::new(pattern, replace)?;
        self.regex
            .entry((lookup_type, scope(field, lookup_type)))
            .or_default()
            .push(rule);
        Ok(self)
    }

    pub fn add_includes(&mut self, field: &str, rule: DwmIncludesRule) -> &mut Self {
        self.includes.entry(field.to_string()).or_default().push(rule);
        self
    }

    /// Adds a derive-table entry for `target` keyed by source field values.
    pub fn add_derive_value(
        &mut self,
        target: &str,
        sources: &[(&str, &str)],
        replace: impl Into<String>,
    ) -> &mut Self {
        let names = sources.iter().map(|(f, _)| f.to_string()).collect();
        let values = sources.iter().map(|(_, v)| clean_lookup_value(v)).collect();
        self.derive_values
            .insert((target.to_string(), names, values), replace.into());
        self
    }

    pub fn add_derive_regex(
        &mut self,
        target: &str,
        source: &str,
        pattern: &str,
        replace: impl Into<String>,
    ) -> Result<&mut Self> {
        let rule = DwmRegexRule::new(pattern, replace)?;
        self.derive_regex
            .entry((target.to_string(), source.to_string()))
            .or_default()
            .push(rule);
        Ok(self)
    }

    pub fn add_derive_includes(
        &mut self,
        target: &str,
        source: &str,
        rule: DwmIncludesRule,
    ) -> &mut Self {
        self.derive_includes
            .entry((target.to_string(), source.to_string()))
            .or_default()
            .push(rule);
        self
    }
}

impl DwmLookupStore for DwmMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn lookup(
        &self,
        field: &str,
        lookup_type: DwmLookupType,
        value: &str,
    ) -> Result<Option<String>> {
        let key = (
            lookup_type,
            scope(field, lookup_type),
            clean_lookup_value(value),
        );
        Ok(self.lookups.get(&key).cloned())
    }

    fn regex_rules(&self, field: &str, lookup_type: DwmLookupType) -> Result<Vec<DwmRegexRule>> {
        Ok(self
            .regex
            .get(&(lookup_type, scope(field, lookup_type)))
            .cloned()
            .unwrap_or_default())
    }

    fn includes_rules(&self, field: &str) -> Result<Vec<DwmIncludesRule>> {
        Ok(self.includes.get(field).cloned().unwrap_or_default())
    }

    fn derive_value(&self, target: &str, sources: &[(String, String)]) -> Result<Option<String>> {
        let names = sources.iter().map(|(f, _)| f.clone()).collect();
        let values = sources.iter().map(|(_, v)| clean_lookup_value(v)).collect();
        Ok(self
            .derive_values
            .get(&(target.to_string(), names, values))
            .cloned())
    }

    fn derive_regex_rules(&self, target: &str, source: &str) -> Result<Vec<DwmRegexRule>> {
        Ok(self
            .derive_regex
            .get(&(target.to_string(), source.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn derive_includes_rules(&self, target: &str, source: &str) -> Result<Vec<DwmIncludesRule>> {
        Ok(self
            .derive_includes
            .get(&(target.to_string(), source.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
