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

//! # Closed Vocabularies
//!
//! Every tag that may appear in a Dwm configuration is an enumeration. The
//! string forms are the camelCase names used in configuration files, and
//! parsing an unknown string fails with [`DwmError::Config`] naming the value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DwmError, Result};

macro_rules! closed_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every member of the vocabulary, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = DwmError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(DwmError::config(format!(
                        concat!("invalid ", $what, " '{}'"),
                        other
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = DwmError;

            fn try_from(value: String) -> Result<Self> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_vocabulary! {
    /// Selects which store table a field is matched against, and at which tier.
    DwmLookupType, "lookup type" {
        GenericLookup => "genericLookup",
        GenericRegex => "genericRegex",
        FieldSpecificLookup => "fieldSpecificLookup",
        FieldSpecificRegex => "fieldSpecificRegex",
        NormLookup => "normLookup",
        NormRegex => "normRegex",
        NormIncludes => "normIncludes",
    }
}

closed_vocabulary! {
    DwmDeriveType, "derive type" {
        /// Look the value up in a derive table keyed by source field values.
        DeriveValue => "deriveValue",
        /// Copy the source field verbatim.
        CopyValue => "copyValue",
        DeriveRegex => "deriveRegex",
        DeriveIncludes => "deriveIncludes",
    }
}

closed_vocabulary! {
    DwmDeriveOption, "derive option" {
        /// Apply the rule even when the target already holds a value.
        Overwrite => "overwrite",
        /// Blank the target when the rule finds no match.
        BlankIfNoMatch => "blankIfNoMatch",
    }
}

closed_vocabulary! {
    /// Fixed extension points around the stage pipeline.
    DwmUdfPosition, "UDF position" {
        BeforeGenericValLookup => "beforeGenericValLookup",
        BeforeGenericValRegex => "beforeGenericValRegex",
        BeforeFieldSpecificLookup => "beforeFieldSpecificLookup",
        BeforeFieldSpecificRegex => "beforeFieldSpecificRegex",
        BeforeNormLookup => "beforeNormLookup",
        BeforeNormRegex => "beforeNormRegex",
        BeforeNormIncludes => "beforeNormIncludes",
        BeforeDerive => "beforeDerive",
        AfterAll => "afterAll",
    }
}

/// How a lookup type matches values against the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DwmLookupKind {
    Exact,
    Regex,
    Includes,
}

impl DwmLookupType {
    pub fn kind(&self) -> DwmLookupKind {
        match self {
            DwmLookupType::GenericLookup
            | DwmLookupType::FieldSpecificLookup
            | DwmLookupType::NormLookup => DwmLookupKind::Exact,
            DwmLookupType::GenericRegex
            | DwmLookupType::FieldSpecificRegex
            | DwmLookupType::NormRegex => DwmLookupKind::Regex,
            DwmLookupType::NormIncludes => DwmLookupKind::Includes,
        }
    }

    /// Generic tables apply to every field; the others are keyed by field name.
    pub fn is_field_scoped(&self) -> bool {
        !matches!(
            self,
            DwmLookupType::GenericLookup | DwmLookupType::GenericRegex
        )
    }
}
