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

//! # Dwm Pipeline
//!
//! [`DwmPipeline`] owns a validated fields table, a store handle and the UDF
//! table, and runs every record through the same fixed sequence:
//!
//! ```text
//! beforeGenericValLookup → genericLookup → beforeGenericValRegex → genericRegex
//! → beforeFieldSpecificLookup → fieldSpecificLookup → beforeFieldSpecificRegex
//! → fieldSpecificRegex → beforeNormLookup → normLookup → beforeNormRegex
//! → normRegex → beforeNormIncludes → normIncludes → beforeDerive → derive
//! → afterAll
//! ```
//!
//! Every stage runs for every record; a stage no field is configured for
//! scans the record and touches nothing.

use std::fmt;
use std::sync::Arc;

use log::{error, info};

use crate::config::{validate_fields, DwmConfig, DwmFieldConfig, DwmFieldsTable};
use crate::errors::{DwmError, Result};
use crate::history::DwmHistory;
use crate::record::{DwmRecord, DwmRecordBatch};
use crate::stage::{execute_stage, DwmStage, DwmStageContext};
use crate::stages::{DwmDeriveStage, DwmIncludesStage, DwmLookupStage, DwmRegexStage};
use crate::store::DwmLookupStore;
use crate::udf::{run_hook, DwmUdfTable};
use crate::vocab::{DwmLookupType, DwmUdfPosition};

enum DwmStep {
    Hook(DwmUdfPosition),
    Stage(Box<dyn DwmStage>),
}

impl DwmStep {
    fn name(&self) -> &'static str {
        match self {
            DwmStep::Hook(position) => position.as_str(),
            DwmStep::Stage(stage) => stage.name(),
        }
    }
}

fn canonical_steps() -> Result<Vec<DwmStep>> {
    use DwmLookupType as L;
    use DwmUdfPosition as P;

    Ok(vec![
        DwmStep::Hook(P::BeforeGenericValLookup),
        DwmStep::Stage(Box::new(DwmLookupStage::new(L::GenericLookup)?)),
        DwmStep::Hook(P::BeforeGenericValRegex),
        DwmStep::Stage(Box::new(DwmRegexStage::new(L::GenericRegex)?)),
        DwmStep::Hook(P::BeforeFieldSpecificLookup),
        DwmStep::Stage(Box::new(DwmLookupStage::new(L::FieldSpecificLookup)?)),
        DwmStep::Hook(P::BeforeFieldSpecificRegex),
        DwmStep::Stage(Box::new(DwmRegexStage::new(L::FieldSpecificRegex)?)),
        DwmStep::Hook(P::BeforeNormLookup),
        DwmStep::Stage(Box::new(DwmLookupStage::new(L::NormLookup)?)),
        DwmStep::Hook(P::BeforeNormRegex),
        DwmStep::Stage(Box::new(DwmRegexStage::new(L::NormRegex)?)),
        DwmStep::Hook(P::BeforeNormIncludes),
        DwmStep::Stage(Box::new(DwmIncludesStage::new())),
        DwmStep::Hook(P::BeforeDerive),
        DwmStep::Stage(Box::new(DwmDeriveStage::new())),
        DwmStep::Hook(P::AfterAll),
    ])
}

/// Configured, immutable pipeline instance. Safe to share across threads.
pub struct DwmPipeline {
    name: String,
    store: Arc<dyn DwmLookupStore>,
    fields: DwmFieldsTable,
    udfs: DwmUdfTable,
    steps: Vec<DwmStep>,
}

impl DwmPipeline {
    /// Validates the configuration and builds the pipeline.
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn DwmLookupStore>,
        fields: DwmFieldsTable,
        udfs: DwmUdfTable,
    ) -> Result<Self> {
        let name = name.into();
        validate_fields(&fields)?;
        let steps = canonical_steps()?;

        info!(
            "dwm pipeline '{}' ready: {} fields, {} udfs, store '{}'",
            name,
            fields.len(),
            udfs.len(),
            store.name()
        );

        Ok(Self {
            name,
            store,
            fields,
            udfs,
            steps,
        })
    }

    pub fn from_config(
        config: DwmConfig,
        store: Arc<dyn DwmLookupStore>,
        udfs: DwmUdfTable,
    ) -> Result<Self> {
        Self::new(config.name, store, config.fields, udfs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &DwmFieldsTable {
        &self.fields
    }

    pub fn udfs(&self) -> &DwmUdfTable {
        &self.udfs
    }

    /// Names of every step in execution order, hooks included.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(DwmStep::name).collect()
    }

    /// Runs one record through every step. A fresh history is started when
    /// `history` is `None`.
    pub fn run(
        &self,
        record: DwmRecord,
        history: Option<DwmHistory>,
    ) -> Result<(DwmRecord, DwmHistory)> {
        self.run_with_progress(record, history, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `progress(step, entries_added)` after
    /// each step.
    pub fn run_with_progress(
        &self,
        record: DwmRecord,
        history: Option<DwmHistory>,
        mut progress: impl FnMut(&str, usize),
    ) -> Result<(DwmRecord, DwmHistory)> {
        let ctx = DwmStageContext::new(&self.fields, self.store.as_ref());
        let mut record = record;
        let mut history = history.unwrap_or_default();

        for step in &self.steps {
            let before = history.len();
            (record, history) = match step {
                DwmStep::Hook(position) => run_hook(&self.udfs, *position, record, history)
                    .map_err(|err| {
                        error!("pipeline '{}': udf at {} failed: {}", self.name, position, err);
                        err
                    })?,
                DwmStep::Stage(stage) => execute_stage(stage.as_ref(), &ctx, record, history)?,
            };
            progress(step.name(), history.len().saturating_sub(before));
        }

        Ok((record, history))
    }

    /// Runs independent records, each with a fresh history. Results keep the
    /// input order; one failing record does not affect the others.
    pub fn run_batch(&self, records: DwmRecordBatch) -> Vec<Result<(DwmRecord, DwmHistory)>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            records
                .into_par_iter()
                .map(|record| self.run(record, None))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            records
                .into_iter()
                .map(|record| self.run(record, None))
                .collect()
        }
    }
}

impl fmt::Debug for DwmPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DwmPipeline")
            .field("name", &self.name)
            .field("store", &self.store.name())
            .field("fields", &self.fields)
            .field("udfs", &self.udfs)
            .finish()
    }
}

/// Step-by-step construction of a [`DwmPipeline`]. The first configuration
/// error is kept and returned by [`build`](Self::build).
pub struct DwmPipelineBuilder {
    name: String,
    store: Option<Arc<dyn DwmLookupStore>>,
    fields: DwmFieldsTable,
    udfs: DwmUdfTable,
    error: Option<DwmError>,
}

impl DwmPipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: None,
            fields: DwmFieldsTable::new(),
            udfs: DwmUdfTable::new(),
            error: None,
        }
    }

    pub fn store(mut self, store: impl DwmLookupStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<dyn DwmLookupStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the whole fields table.
    pub fn fields(mut self, fields: DwmFieldsTable) -> Self {
        self.fields = fields;
        self
    }

    pub fn field(mut self, name: impl Into<String>, config: DwmFieldConfig) -> Self {
        self.fields.insert(name.into(), config);
        self
    }

    pub fn udf<F>(mut self, position: DwmUdfPosition, udf: F) -> Self
    where
        F: Fn(DwmRecord, DwmHistory) -> Result<(DwmRecord, DwmHistory)> + Send + Sync + 'static,
    {
        self.udfs.register(position, udf);
        self
    }

    /// Registers a hook by position name, e.g. `"beforeDerive"`.
    pub fn udf_named<F>(mut self, position: &str, udf: F) -> Self
    where
        F: Fn(DwmRecord, DwmHistory) -> Result<(DwmRecord, DwmHistory)> + Send + Sync + 'static,
    {
        if let Err(err) = self.udfs.register_named(position, udf) {
            self.error.get_or_insert(err);
        }
        self
    }

    pub fn build(self) -> Result<DwmPipeline> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let store = self
            .store
            .ok_or_else(|| DwmError::config(format!("pipeline '{}' has no lookup store", self.name)))?;
        DwmPipeline::new(self.name, store, self.fields, self.udfs)
    }
}
