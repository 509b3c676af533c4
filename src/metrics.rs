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

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::history::{DwmHistory, DwmHistoryEntry};

/// Counts derived from one or more histories.
#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct DwmHistoryMetrics {
    pub total_entries: usize,
    pub fields_touched: usize,
    pub matches_by_stage: BTreeMap<String, usize>,
    pub no_matches_by_stage: BTreeMap<String, usize>,
    pub derive_skipped: usize,
}

impl DwmHistoryMetrics {
    pub fn compute(history: &DwmHistory) -> Self {
        let mut metrics = DwmHistoryMetrics::default();
        metrics.add(history);
        metrics
    }

    /// Sums the metrics of several histories, e.g. the output of a batch run.
    pub fn compute_all<'a>(histories: impl IntoIterator<Item = &'a DwmHistory>) -> Self {
        let mut metrics = DwmHistoryMetrics::default();
        for history in histories {
            metrics.add(history);
        }
        metrics
    }

    fn add(&mut self, history: &DwmHistory) {
        for (_, entries) in history.fields() {
            if entries.is_empty() {
                continue;
            }
            self.fields_touched += 1;

            for entry in entries {
                self.total_entries += 1;
                let stage = entry.stage().as_str().to_string();
                match entry {
                    DwmHistoryEntry::NoMatch { .. } => {
                        *self.no_matches_by_stage.entry(stage).or_insert(0) += 1;
                    }
                    DwmHistoryEntry::DeriveSkipped { .. } => self.derive_skipped += 1,
                    _ => *self.matches_by_stage.entry(stage).or_insert(0) += 1,
                }
            }
        }
    }

    pub fn as_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
