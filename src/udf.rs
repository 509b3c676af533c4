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

//! # UDF Hooks
//!
//! User-defined functions run at the nine fixed [`DwmUdfPosition`]s around
//! the stage pipeline. Any `Fn(DwmRecord, DwmHistory) -> Result<(DwmRecord,
//! DwmHistory)>` closure that is `Send + Sync` is a [`DwmUdf`].
//!
//! ```rust
//! use dwm::udf::DwmUdfTable;
//! use dwm::vocab::DwmUdfPosition;
//!
//! let mut udfs = DwmUdfTable::new();
//! udfs.register(DwmUdfPosition::BeforeDerive, |mut record, history| {
//!     record.set("flag", "seen");
//!     Ok((record, history))
//! });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::errors::Result;
use crate::history::DwmHistory;
use crate::record::DwmRecord;
use crate::vocab::DwmUdfPosition;

/// Hook invoked with the pipeline's working state.
pub trait DwmUdf: Send + Sync {
    fn call(&self, record: DwmRecord, history: DwmHistory) -> Result<(DwmRecord, DwmHistory)>;
}

impl<F> DwmUdf for F
where
    F: Fn(DwmRecord, DwmHistory) -> Result<(DwmRecord, DwmHistory)> + Send + Sync,
{
    fn call(&self, record: DwmRecord, history: DwmHistory) -> Result<(DwmRecord, DwmHistory)> {
        self(record, history)
    }
}

/// Registry mapping positions to hooks. At most one hook per position.
#[derive(Clone, Default)]
pub struct DwmUdfTable {
    inner: HashMap<DwmUdfPosition, Arc<dyn DwmUdf>>,
}

impl DwmUdfTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure at `position`, replacing any previous hook there.
    pub fn register<F>(&mut self, position: DwmUdfPosition, udf: F) -> &mut Self
    where
        F: Fn(DwmRecord, DwmHistory) -> Result<(DwmRecord, DwmHistory)> + Send + Sync + 'static,
    {
        self.register_udf(position, Arc::new(udf))
    }

    /// Registers by position name; unknown names are a config error.
    pub fn register_named<F>(&mut self, position: &str, udf: F) -> Result<&mut Self>
    where
        F: Fn(DwmRecord, DwmHistory) -> Result<(DwmRecord, DwmHistory)> + Send + Sync + 'static,
    {
        let position: DwmUdfPosition = position.parse()?;
        Ok(self.register(position, udf))
    }

    /// Registers a shared hook object.
    pub fn register_udf(&mut self, position: DwmUdfPosition, udf: Arc<dyn DwmUdf>) -> &mut Self {
        self.inner.insert(position, udf);
        self
    }

    pub fn get(&self, position: DwmUdfPosition) -> Option<&Arc<dyn DwmUdf>> {
        self.inner.get(&position)
    }

    pub fn contains(&self, position: DwmUdfPosition) -> bool {
        self.inner.contains_key(&position)
    }

    /// Registered positions in pipeline order.
    pub fn positions(&self) -> Vec<DwmUdfPosition> {
        DwmUdfPosition::ALL
            .iter()
            .copied()
            .filter(|p| self.inner.contains_key(p))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for DwmUdfTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DwmUdfTable")
            .field("positions", &self.positions())
            .finish()
    }
}

/// Runs the hook registered at `position`, if any. Hook errors are returned
/// unchanged.
pub fn run_hook(
    udfs: &DwmUdfTable,
    position: DwmUdfPosition,
    record: DwmRecord,
    history: DwmHistory,
) -> Result<(DwmRecord, DwmHistory)> {
    match udfs.get(position) {
        Some(udf) => {
            debug!("running udf at {}", position);
            udf.call(record, history)
        }
        None => Ok((record, history)),
    }
}
