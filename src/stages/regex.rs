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

use crate::errors::{DwmError, Result};
use crate::history::{DwmHistory, DwmHistoryEntry};
use crate::record::DwmRecord;
use crate::stage::{DwmStage, DwmStageContext};
use crate::stages::configured_fields;
use crate::vocab::{DwmLookupKind, DwmLookupType};

/// Pattern rewriting with the store's rules for one regex lookup type.
/// The first matching rule wins.
#[derive(Debug, Clone, Copy)]
pub struct DwmRegexStage {
    lookup_type: DwmLookupType,
}

impl DwmRegexStage {
    pub fn new(lookup_type: DwmLookupType) -> Result<Self> {
        if lookup_type.kind() != DwmLookupKind::Regex {
            return Err(DwmError::validation(format!(
                "{lookup_type} is not a regex lookup type"
            )));
        }
        Ok(Self { lookup_type })
    }
}

impl DwmStage for DwmRegexStage {
    fn name(&self) -> &'static str {
        self.lookup_type.as_str()
    }

    fn apply(
        &self,
        ctx: &DwmStageContext<'_>,
        mut record: DwmRecord,
        mut history: DwmHistory,
    ) -> Result<(DwmRecord, DwmHistory)> {
        for (field, value) in configured_fields(ctx.fields, &record, self.lookup_type) {
            let rules = ctx.store.regex_rules(&field, self.lookup_type)?;
            let hit = rules
                .iter()
                .find_map(|rule| rule.rewrite(&value).map(|out| (rule.pattern().to_string(), out)));

            match hit {
                Some((pattern, rewritten)) => {
                    trace!("{}: '{}' matched /{}/", self.lookup_type, field, pattern);
                    history.record(
                        field.as_str(),
                        DwmHistoryEntry::RegexApplied {
                            stage: self.lookup_type,
                            from: value,
                            to: rewritten.clone(),
                            pattern,
                        },
                    );
                    record.set(field, rewritten);
                }
                None => history.record(
                    field,
                    DwmHistoryEntry::NoMatch {
                        stage: self.lookup_type.into(),
                        value: Some(value),
                    },
                ),
            }
        }
        Ok((record, history))
    }
}
