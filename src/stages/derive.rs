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

//! Derive stage.
//!
//! Targets are visited in field-name order and each target's rules run in
//! the order they are declared. For every rule:
//!
//! | target      | `overwrite` | outcome  | result                                 |
//! |-------------|-------------|----------|----------------------------------------|
//! | non-blank   | absent      | any      | skipped, value kept                    |
//! | any         | any         | match    | rule output written                    |
//! | any         | any         | no match | kept, or `""` with `blankIfNoMatch`    |
//!
//! Rules read the record as left by earlier rules in the same pass.

use log::trace;

use crate::config::DwmDeriveRule;
use crate::errors::Result;
use crate::history::{DwmHistory, DwmHistoryEntry};
use crate::record::DwmRecord;
use crate::stage::{DwmStage, DwmStageContext};
use crate::store::DwmLookupStore;
use crate::vocab::DwmDeriveType;

#[derive(Debug, Clone, Copy, Default)]
pub struct DwmDeriveStage;

impl DwmDeriveStage {
    pub fn new() -> Self {
        Self
    }

    fn apply_rule(
        &self,
        store: &dyn DwmLookupStore,
        target: &str,
        rule: &DwmDeriveRule,
        record: &mut DwmRecord,
        history: &mut DwmHistory,
    ) -> Result<()> {
        if let Some(current) = record.non_blank(target) {
            if !rule.overwrite() {
                history.record(
                    target,
                    DwmHistoryEntry::DeriveSkipped {
                        stage: rule.derive_type,
                        current: current.to_string(),
                    },
                );
                return Ok(());
            }
        }

        let previous = record.get(target).map(str::to_string);
        match derive_outcome(store, target, rule, record)? {
            Some(value) => {
                trace!("{}: '{}' <- {:?}", rule.derive_type, target, value);
                history.record(
                    target,
                    DwmHistoryEntry::DeriveApplied {
                        stage: rule.derive_type,
                        from: previous,
                        to: value.clone(),
                        using: rule.field_set.clone(),
                    },
                );
                record.set(target, value);
            }
            None => {
                trace!("{}: '{}' no match", rule.derive_type, target);
                history.record(
                    target,
                    DwmHistoryEntry::NoMatch {
                        stage: rule.derive_type.into(),
                        value: previous,
                    },
                );
                if rule.blank_if_no_match() {
                    record.set(target, "");
                }
            }
        }
        Ok(())
    }
}

/// Value a rule would write, or `None` when it finds no match.
fn derive_outcome(
    store: &dyn DwmLookupStore,
    target: &str,
    rule: &DwmDeriveRule,
    record: &DwmRecord,
) -> Result<Option<String>> {
    match rule.derive_type {
        DwmDeriveType::CopyValue => Ok(rule
            .source()
            .and_then(|source| record.non_blank(source))
            .map(str::to_string)),
        DwmDeriveType::DeriveValue => {
            let sources: Vec<(String, String)> = rule
                .field_set
                .iter()
                .map(|f| (f.clone(), record.get(f).unwrap_or_default().to_string()))
                .collect();
            if sources.iter().all(|(_, v)| v.is_empty()) {
                return Ok(None);
            }
            store.derive_value(target, &sources)
        }
        DwmDeriveType::DeriveRegex => {
            let Some((source, value)) = single_source(rule, record) else {
                return Ok(None);
            };
            let rules = store.derive_regex_rules(target, source)?;
            Ok(rules.iter().find_map(|r| r.derive(value)))
        }
        DwmDeriveType::DeriveIncludes => {
            let Some((source, value)) = single_source(rule, record) else {
                return Ok(None);
            };
            let rules = store.derive_includes_rules(target, source)?;
            Ok(rules
                .into_iter()
                .find(|r| r.matches(value))
                .map(|r| r.replace))
        }
    }
}

fn single_source<'a>(rule: &'a DwmDeriveRule, record: &'a DwmRecord) -> Option<(&'a str, &'a str)> {
    let source = rule.source()?;
    record.non_blank(source).map(|value| (source, value))
}

impl DwmStage for DwmDeriveStage {
    fn name(&self) -> &'static str {
        "derive"
    }

    fn apply(
        &self,
        ctx: &DwmStageContext<'_>,
        mut record: DwmRecord,
        mut history: DwmHistory,
    ) -> Result<(DwmRecord, DwmHistory)> {
        for (target, config) in ctx.fields {
            for rule in &config.derive {
                self.apply_rule(ctx.store, target, rule, &mut record, &mut history)?;
            }
        }
        Ok((record, history))
    }
}
