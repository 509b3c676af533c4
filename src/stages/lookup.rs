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

/// Exact-match lookup against the store table of one lookup type.
#[derive(Debug, Clone, Copy)]
pub struct DwmLookupStage {
    lookup_type: DwmLookupType,
}

impl DwmLookupStage {
    pub fn new(lookup_type: DwmLookupType) -> Result<Self> {
        if lookup_type.kind() != DwmLookupKind::Exact {
            return Err(DwmError::validation(format!(
                "{lookup_type} is not an exact-match lookup type"
            )));
        }
        Ok(Self { lookup_type })
    }

    pub fn lookup_type(&self) -> DwmLookupType {
        self.lookup_type
    }
}

impl DwmStage for DwmLookupStage {
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
            match ctx.store.lookup(&field, self.lookup_type, &value)? {
                Some(found) => {
                    trace!("{}: '{}' {:?} -> {:?}", self.lookup_type, field, value, found);
                    history.record(
                        field.as_str(),
                        DwmHistoryEntry::LookupApplied {
                            stage: self.lookup_type,
                            from: value,
                            to: found.clone(),
                        },
                    );
                    record.set(field, found);
                }
                None => {
                    trace!("{}: '{}' {:?} no match", self.lookup_type, field, value);
                    history.record(
                        field,
                        DwmHistoryEntry::NoMatch {
                            stage: self.lookup_type.into(),
                            value: Some(value),
                        },
                    );
                }
            }
        }
        Ok((record, history))
    }
}
