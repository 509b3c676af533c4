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

//! # Dwm Core Library
//!
//! Dwm normalizes and enriches flat records field by field. A declarative
//! fields table says which lookup, regex and includes tables touch each field
//! and which derive rules compute it; a lookup store supplies the tables; user
//! hooks can adjust the record at nine fixed points. Every attempted change is
//! written to a per-field history.
//!
//! ## Module Overview
//!
//! - **errors**: `DwmError` and the `Result` alias
//! - **record**: `DwmRecord`, the flat field map
//! - **history**: `DwmHistory`, the append-only audit trail
//! - **vocab**: Closed vocabularies (lookup types, derive types and options,
//!   UDF positions)
//! - **config**: Fields table, derive rules, file loading and validation
//! - **store**: Lookup store contract, rule types and the in-memory store
//! - **stage**: Stage trait and execution helper
//! - **stages**: Lookup, regex, includes and derive stages
//! - **udf**: UDF hook registry
//! - **pipeline**: `DwmPipeline` and its builder
//! - **metrics**: History summaries
//!
//! ## Feature Flags
//!
//! - `parallel`: `DwmPipeline::run_batch` fans records out with Rayon
//! - `full`: Enables all features
//!
//! ## Quick Start
//!
//! ```rust
//! use dwm::{DwmFieldConfig, DwmLookupType, DwmMemoryStore, DwmPipelineBuilder, DwmRecord};
//!
//! let mut store = DwmMemoryStore::new();
//! store.add_lookup(DwmLookupType::NormLookup, "country", "USA", "United States")?;
//!
//! let pipeline = DwmPipelineBuilder::new("contacts")
//!     .store(store)
//!     .field("country", DwmFieldConfig::new().with_lookup(DwmLookupType::NormLookup))
//!     .build()?;
//!
//! let (record, history) = pipeline.run(DwmRecord::new().with("country", "USA"), None)?;
//! assert_eq!(record.get("country"), Some("United States"));
//! ```
//!
//! ## Error Handling
//!
//! Configuration problems surface as `DwmError::Config` when the pipeline is
//! built. Store and hook errors abort the run of the record that raised them
//! and are returned unchanged.

pub mod errors;
pub mod vocab;
pub mod record;
pub mod history;
pub mod config;
pub mod store;
pub mod stage;
pub mod stages;
pub mod udf;
pub mod pipeline;
pub mod metrics;

pub use errors::{DwmError, Result};
pub use record::{DwmRecord, DwmRecordBatch};
pub use history::{DwmHistory, DwmHistoryEntry, DwmHistoryStage};
pub use vocab::{DwmDeriveOption, DwmDeriveType, DwmLookupKind, DwmLookupType, DwmUdfPosition};
pub use config::{validate_fields, validate_udf_positions, DwmConfig, DwmDeriveRule, DwmFieldConfig, DwmFieldsTable};
pub use store::{clean_lookup_value, DwmIncludesRule, DwmLookupStore, DwmMemoryStore, DwmRegexRule};
pub use stage::{execute_stage, DwmStage, DwmStageContext};
pub use stages::{DwmDeriveStage, DwmIncludesStage, DwmLookupStage, DwmRegexStage};
pub use udf::{run_hook, DwmUdf, DwmUdfTable};
pub use pipeline::{DwmPipeline, DwmPipelineBuilder};
pub use metrics::DwmHistoryMetrics;
