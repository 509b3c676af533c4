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

use log::trace;

use crate::errors::Result;
use crate::history::{DwmHistory, DwmHistoryEntry};
use crate::record::DwmRecord;
use crate::stage::{DwmStage, DwmStageContext};
use crate::stages::configured_fields;
use crate::vocab::DwmLookupType;

/// `normIncludes` stage: the whole value is replaced by the first includes
/// rule whose terms it contains.
#[derive(Debug, Clone, Copy, Default)]
pub struct DwmIncludesStage;

impl DwmIncludesStage {
    pub fn new() -> Self {
        Self
    }
}

impl DwmStage for DwmIncludesStage {
    fn name(&self) -> &'static str {
        DwmLookupType::NormIncludes.as_str()
    }

    fn apply(
        &self,
        ctx: &DwmStageContext<'_>,
        mut record: DwmRecord,
        mut history: DwmHistory,
    ) -> Result<(DwmRecord, DwmHistory)> {
        for (field, value) in configured_fields(ctx.fields, &record, DwmLookupType::NormIncludes) {
            let rules = ctx.store.includes_rules(&field)?;

            match rules.into_iter().find(|rule| rule.matches(&value)) {
                Some(rule) => {
                    trace!("normIncludes: '{}' matched {}", field, rule.describe());
                    history.record(
                        field.as_str(),
                        DwmHistoryEntry::IncludesApplied {
                            stage: DwmLookupType::NormIncludes,
                            from: value,
                            to: rule.replace.clone(),
                            rule: rule.describe(),
                        },
                    );
                    record.set(field, rule.replace);
                }
                None => history.record(
                    field,
                    DwmHistoryEntry::NoMatch {
                        stage: DwmLookupType::NormIncludes.into(),
                        value: Some(value),
                    },
                ),
            }
        }
        Ok((record, history))
    }
}
