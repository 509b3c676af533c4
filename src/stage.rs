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

//! # Dwm Stage Module
//!
//! A stage is one pass over a record for a single lookup type, or the derive
//! pass. Stages take ownership of the record and its history and hand both
//! back, so no two stages ever hold the same record at once.
//!
//! ## Implementing a Stage
//!
//! ```rust
//! use dwm::stage::{DwmStage, DwmStageContext};
//! use dwm::{DwmHistory, DwmRecord, Result};
//!
//! struct Trim;
//!
//! impl DwmStage for Trim {
//!     fn name(&self) -> &'static str {
//!         "trim"
//!     }
//!
//!     fn apply(
//!         &self,
//!         _ctx: &DwmStageContext<'_>,
//!         mut record: DwmRecord,
//!         history: DwmHistory,
//!     ) -> Result<(DwmRecord, DwmHistory)> {
//!         for field in record.field_names() {
//!             if let Some(v) = record.get(&field).map(|v| v.trim().to_string()) {
//!                 record.set(field, v);
//!             }
//!         }
//!         Ok((record, history))
//!     }
//! }
//! ```

use log::{debug, error};

use crate::config::DwmFieldsTable;
use crate::errors::Result;
use crate::history::DwmHistory;
use crate::record::DwmRecord;
use crate::store::DwmLookupStore;

/// Read-only inputs shared by every stage of one run.
#[derive(Clone, Copy)]
pub struct DwmStageContext<'a> {
    pub fields: &'a DwmFieldsTable,
    pub store: &'a dyn DwmLookupStore,
}

impl<'a> DwmStageContext<'a> {
    pub fn new(fields: &'a DwmFieldsTable, store: &'a dyn DwmLookupStore) -> Self {
        Self { fields, store }
    }
}

/// Contract every pipeline stage fulfils.
///
/// A stage receives the record and its history by value and returns both.
/// It reads configuration and tables only through the [`DwmStageContext`].
pub trait DwmStage: Send + Sync {
    /// Stable stage name.
    ///
    /// This name is used for:
    /// - Log lines emitted by [`execute_stage`]
    /// - Progress callbacks of the pipeline
    /// - `DwmPipeline::stage_names`
    fn name(&self) -> &'static str;

    /// Processes one record.
    ///
    /// # Arguments
    ///
    /// - `ctx`: Fields table and lookup store of the running pipeline
    /// - `record`: The record as left by the previous step
    /// - `history`: The history accumulated so far
    ///
    /// # Returns
    ///
    /// Returns a Result containing:
    /// - Ok(`(DwmRecord, DwmHistory)`): The updated record and history
    /// - Err(DwmError): A store failure, returned unchanged
    ///
    /// # Notes
    ///
    /// - Fields the stage is not configured for must be left untouched
    /// - Entries may only be appended to `history`, never removed
    fn apply(
        &self,
        ctx: &DwmStageContext<'_>,
        record: DwmRecord,
        history: DwmHistory,
    ) -> Result<(DwmRecord, DwmHistory)>;
}

/// Runs a stage with logging. Errors are returned exactly as the stage (or
/// the store behind it) produced them.
pub fn execute_stage(
    stage: &dyn DwmStage,
    ctx: &DwmStageContext<'_>,
    record: DwmRecord,
    history: DwmHistory,
) -> Result<(DwmRecord, DwmHistory)> {
    let before = history.len();
    debug!("stage '{}' starting on {} fields", stage.name(), record.len());

    let (record, history) = stage.apply(ctx, record, history).map_err(|err| {
        error!("stage '{}' failed: {}", stage.name(), err);
        err
    })?;

    debug!(
        "stage '{}' finished, {} history entries added",
        stage.name(),
        history.len().saturating_sub(before)
    );
    Ok((record, history))
}
