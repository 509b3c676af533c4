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

//! # Lookup Store Contract
//!
//! The pipeline never queries a database directly. Every table it consults is
//! reached through [`DwmLookupStore`], and store failures are returned as
//! [`DwmError::LookupStore`](crate::errors::DwmError::LookupStore) values
//! that abort the current run unchanged.
//!
//! ## Rule Types
//!
//! - [`DwmRegexRule`]: pattern plus replacement, used by regex stages and
//!   `deriveRegex` rules
//! - [`DwmIncludesRule`]: substring terms plus replacement, used by the
//!   `normIncludes` stage and `deriveIncludes` rules
//!
//! [`DwmMemoryStore`] keeps all tables in memory.

pub mod memory;

pub use memory::DwmMemoryStore;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::vocab::DwmLookupType;

/// Normalizes a value for key comparison: trims, collapses inner whitespace
/// and lowercases.
pub fn clean_lookup_value(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Ordered (pattern, replacement) rule.
#[derive(Clone, Debug)]
pub struct DwmRegexRule {
    pattern: Regex,
    replace: String,
}

impl DwmRegexRule {
    /// Compiles a case-insensitive rule.
    pub fn new(pattern: &str, replace: impl Into<String>) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self::from_regex(pattern, replace))
    }

    /// Wraps an already compiled pattern, keeping its flags.
    pub fn from_regex(pattern: Regex, replace: impl Into<String>) -> Self {
        Self {
            pattern,
            replace: replace.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replace
    }

    /// In-place rewrite: every match of the pattern is replaced, with `$n`
    /// references expanded. `None` when the pattern does not match.
    pub fn rewrite(&self, value: &str) -> Option<String> {
        if !self.pattern.is_match(value) {
            return None;
        }
        Some(
            self.pattern
                .replace_all(value, self.replace.as_str())
                .into_owned(),
        )
    }

    /// Derivation: the replacement itself, expanded against the first match.
    pub fn derive(&self, value: &str) -> Option<String> {
        let caps = self.pattern.captures(value)?;
        let mut out = String::new();
        caps.expand(&self.replace, &mut out);
        Some(out)
    }
}

impl PartialEq for DwmRegexRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_str() == other.pattern.as_str() && self.replace == other.replace
    }
}

/// Contains-based rule. All `includes` terms must appear in the value, no
/// `excludes` term may appear, and the optional `begins`/`ends` anchors must
/// hold. Comparison runs on cleaned values. A rule without `includes` terms
/// matches nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwmIncludesRule {
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub begins: Option<String>,
    #[serde(default)]
    pub ends: Option<String>,
    pub replace: String,
}

impl DwmIncludesRule {
    /// Builds a rule from a comma separated list of required terms.
    pub fn new(includes: &str, replace: impl Into<String>) -> Self {
        Self {
            includes: split_terms(includes),
            replace: replace.into(),
            ..Self::default()
        }
    }

    pub fn with_excludes(mut self, excludes: &str) -> Self {
        self.excludes = split_terms(excludes);
        self
    }

    pub fn with_begins(mut self, begins: &str) -> Self {
        self.begins = Some(clean_lookup_value(begins)).filter(|b| !b.is_empty());
        self
    }

    pub fn with_ends(mut self, ends: &str) -> Self {
        self.ends = Some(clean_lookup_value(ends)).filter(|e| !e.is_empty());
        self
    }

    pub fn matches(&self, value: &str) -> bool {
        if self.includes.is_empty() {
            return false;
        }
        let value = clean_lookup_value(value);
        if value.is_empty() {
            return false;
        }
        self.includes.iter().all(|t| value.contains(&clean_lookup_value(t)))
            && !self.excludes.iter().any(|t| value.contains(&clean_lookup_value(t)))
            && self
                .begins
                .as_deref()
                .map_or(true, |b| value.starts_with(&clean_lookup_value(b)))
            && self
                .ends
                .as_deref()
                .map_or(true, |e| value.ends_with(&clean_lookup_value(e)))
    }

    /// Compact description stored in history entries.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("includes={}", self.includes.join(","))];
        if !self.excludes.is_empty() {
            parts.push(format!("excludes={}", self.excludes.join(",")));
        }
        if let Some(b) = &self.begins {
            parts.push(format!("begins={b}"));
        }
        if let Some(e) = &self.ends {
            parts.push(format!("ends={e}"));
        }
        parts.join(";")
    }
}

fn split_terms(terms: &str) -> Vec<String> {
    terms
        .split(',')
        .map(clean_lookup_value)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Read access to every table the pipeline consults.
///
/// Implementations must be safe for concurrent reads; the pipeline shares a
/// single store between all records of a batch. Any error returned by a
/// method aborts the current run and reaches the caller unchanged, so
/// implementations should report failures with [`DwmError::lookup_store`].
///
/// [`DwmError::lookup_store`]: crate::errors::DwmError::lookup_store
pub trait DwmLookupStore: Send + Sync {
    /// Store name used in log lines. Defaults to `"store"`.
    fn name(&self) -> &str {
        "store"
    }

    /// Exact-match lookup.
    ///
    /// # Arguments
    ///
    /// - `field`: Field being normalized; generic lookup types may ignore it
    /// - `lookup_type`: One of `genericLookup`, `fieldSpecificLookup`,
    ///   `normLookup`
    /// - `value`: Current, non-blank field value
    ///
    /// # Returns
    ///
    /// - Ok(Some(value)): The replacement value
    /// - Ok(None): No entry for `value`
    /// - Err(DwmError): The store could not answer
    fn lookup(
        &self,
        field: &str,
        lookup_type: DwmLookupType,
        value: &str,
    ) -> Result<Option<String>>;

    /// Regex rules for a field.
    ///
    /// # Arguments
    ///
    /// - `field`: Field being normalized; generic lookup types may ignore it
    /// - `lookup_type`: One of `genericRegex`, `fieldSpecificRegex`,
    ///   `normRegex`
    ///
    /// # Returns
    ///
    /// Rules in the order they must be tried; the first match wins.
    fn regex_rules(&self, field: &str, lookup_type: DwmLookupType) -> Result<Vec<DwmRegexRule>>;

    /// Includes rules for a field, in the order they must be tried.
    fn includes_rules(&self, field: &str) -> Result<Vec<DwmIncludesRule>>;

    /// Derive-table lookup for `deriveValue` rules.
    ///
    /// # Arguments
    ///
    /// - `target`: Field the rule writes
    /// - `sources`: `(source field, current value)` pairs in rule order;
    ///   blank sources are passed as `""`
    ///
    /// # Returns
    ///
    /// The derived value, or `None` when the table has no entry. The default
    /// implementation has no derive table.
    fn derive_value(&self, _target: &str, _sources: &[(String, String)]) -> Result<Option<String>> {
        Ok(None)
    }

    /// Regex rules for `deriveRegex` from `source` into `target`. Empty by
    /// default.
    fn derive_regex_rules(&self, _target: &str, _source: &str) -> Result<Vec<DwmRegexRule>> {
        Ok(Vec::new())
    }

    /// Includes rules for `deriveIncludes` from `source` into `target`. Empty
    /// by default.
    fn derive_includes_rules(&self, _target: &str, _source: &str) -> Result<Vec<DwmIncludesRule>> {
        Ok(Vec::new())
    }
}
