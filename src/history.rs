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

//! # Dwm History Module
//!
//! [`DwmHistory`] is the audit trail that travels with a record. Each stage
//! appends one entry per field it examined; nothing is ever replaced or
//! removed, so a history threaded through several pipeline runs keeps the
//! outcome of every earlier run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vocab::{DwmDeriveType, DwmLookupType};

/// Stage that produced a history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DwmHistoryStage {
    Lookup(DwmLookupType),
    Derive(DwmDeriveType),
}

impl DwmHistoryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DwmHistoryStage::Lookup(t) => t.as_str(),
            DwmHistoryStage::Derive(t) => t.as_str(),
        }
    }
}

impl fmt::Display for DwmHistoryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DwmLookupType> for DwmHistoryStage {
    fn from(value: DwmLookupType) -> Self {
        DwmHistoryStage::Lookup(value)
    }
}

impl From<DwmDeriveType> for DwmHistoryStage {
    fn from(value: DwmDeriveType) -> Self {
        DwmHistoryStage::Derive(value)
    }
}

/// One recorded transformation attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DwmHistoryEntry {
    /// An exact-match lookup found a replacement.
    LookupApplied {
        stage: DwmLookupType,
        from: String,
        to: String,
    },
    RegexApplied {
        stage: DwmLookupType,
        from: String,
        to: String,
        pattern: String,
    },
    IncludesApplied {
        stage: DwmLookupType,
        from: String,
        to: String,
        rule: String,
    },
    /// A derive rule wrote `to` into the target field.
    DeriveApplied {
        stage: DwmDeriveType,
        from: Option<String>,
        to: String,
        using: Vec<String>,
    },
    /// The target already held a value and the rule lacks `overwrite`.
    DeriveSkipped {
        stage: DwmDeriveType,
        current: String,
    },
    /// The stage looked at the field and found nothing to apply.
    NoMatch {
        stage: DwmHistoryStage,
        value: Option<String>,
    },
}

impl DwmHistoryEntry {
    pub fn stage(&self) -> DwmHistoryStage {
        match self {
            DwmHistoryEntry::LookupApplied { stage, .. }
            | DwmHistoryEntry::RegexApplied { stage, .. }
            | DwmHistoryEntry::IncludesApplied { stage, .. } => DwmHistoryStage::Lookup(*stage),
            DwmHistoryEntry::DeriveApplied { stage, .. }
            | DwmHistoryEntry::DeriveSkipped { stage, .. } => DwmHistoryStage::Derive(*stage),
            DwmHistoryEntry::NoMatch { stage, .. } => *stage,
        }
    }

    /// True for entries that changed, or confirmed, the field value.
    pub fn is_match(&self) -> bool {
        matches!(
            self,
            DwmHistoryEntry::LookupApplied { .. }
                | DwmHistoryEntry::RegexApplied { .. }
                | DwmHistoryEntry::IncludesApplied { .. }
                | DwmHistoryEntry::DeriveApplied { .. }
        )
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, DwmHistoryEntry::NoMatch { .. })
    }
}

/// Append-only per-field audit log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DwmHistory {
    fields: BTreeMap<String, Vec<DwmHistoryEntry>>,
}

impl DwmHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, field: impl Into<String>, entry: DwmHistoryEntry) {
        self.fields.entry(field.into()).or_default().push(entry);
    }

    /// Appends every entry of `other` after the entries already held here.
    /// Fields of `other` without entries are not carried over.
    pub fn merge(&mut self, other: DwmHistory) {
        for (field, entries) in other.fields {
            if entries.is_empty() {
                continue;
            }
            self.fields.entry(field).or_default().extend(entries);
        }
    }

    pub fn entries(&self, field: &str) -> &[DwmHistoryEntry] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn last(&self, field: &str) -> Option<&DwmHistoryEntry> {
        self.entries(field).last()
    }

    /// Entries of `field` produced by one stage, oldest first.
    pub fn entries_for_stage(
        &self,
        field: &str,
        stage: impl Into<DwmHistoryStage>,
    ) -> impl Iterator<Item = &DwmHistoryEntry> {
        let stage = stage.into();
        self.entries(field).iter().filter(move |e| e.stage() == stage)
    }

    /// True when at least one entry was recorded for `field`.
    pub fn contains_field(&self, field: &str) -> bool {
        !self.entries(field).is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[DwmHistoryEntry])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total number of entries across all fields.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
