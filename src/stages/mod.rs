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

//! # Stages Module
//!
//! Built-in stages of the Dwm pipeline.
//!
//! - **lookup**: Exact-match lookups (`genericLookup`, `fieldSpecificLookup`,
//!   `normLookup`)
//! - **regex**: Pattern rewriting (`genericRegex`, `fieldSpecificRegex`,
//!   `normRegex`)
//! - **includes**: Substring rules (`normIncludes`)
//! - **derive**: Derive rules (`deriveValue`, `copyValue`, `deriveRegex`,
//!   `deriveIncludes`)

pub mod derive;
pub mod includes;
pub mod lookup;
pub mod regex;

pub use self::derive::DwmDeriveStage;
pub use self::includes::DwmIncludesStage;
pub use self::lookup::DwmLookupStage;
pub use self::regex::DwmRegexStage;

use crate::config::DwmFieldsTable;
use crate::record::DwmRecord;
use crate::vocab::DwmLookupType;

/// Fields a lookup-type stage must visit, with their values as they were
/// when the pass started. Blank fields and fields not configured for
/// `lookup_type` are left out.
pub(crate) fn configured_fields(
    fields: &DwmFieldsTable,
    record: &DwmRecord,
    lookup_type: DwmLookupType,
) -> Vec<(String, String)> {
    record
        .iter()
        .filter_map(|(name, value)| {
            let value = value.filter(|v| !v.is_empty())?;
            let config = fields.get(name)?;
            config
                .has_lookup(lookup_type)
                .then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}
