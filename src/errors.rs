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

//! # Dwm Error Module
//!
//! This module defines the error types used throughout the Dwm engine.
//!
//! ## Error Categories
//!
//! - **Config**: Invalid lookup type, derive type, derive option, derive
//!   source list or UDF position. Raised only while building a pipeline.
//! - **LookupStore**: Failures reported by a lookup store implementation.
//!   The pipeline never retries or suppresses them.
//! - **Udf**: Failures reported by user hooks. Hooks may also return any
//!   other variant; the pipeline forwards whatever it receives.
//! - **Schema**: Records that cannot be represented as scalar fields
//! - **Validation**: Invalid arguments to helpers (e.g. regex patterns)
//! - **Io** / **Serde**: Loading configuration files
//!
//! ## Usage
//!
//! ```rust
//! use dwm::errors::{Result, DwmError};
//!
//! fn require_email(record: dwm::DwmRecord, history: dwm::DwmHistory)
//!     -> Result<(dwm::DwmRecord, dwm::DwmHistory)> {
//!     if record.is_blank("email") {
//!         return Err(DwmError::udf("email is required"));
//!     }
//!     Ok((record, history))
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Dwm.
pub type Result<T> = std::result::Result<T, DwmError>;

/// Canonical error enumeration for Dwm.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DwmError {
    /// Invalid pipeline configuration.
    #[error("config error: {message}")]
    Config { message: String },

    /// Failure raised by the lookup store collaborator.
    #[error("lookup store error: {message}")]
    LookupStore { message: String },

    /// Failure raised by a user-defined hook.
    #[error("udf error: {message}")]
    Udf { message: String },

    /// Errors caused by records that are not flat scalar maps.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Validation errors triggered by invalid parameters or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapper for serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),
}

impl From<io::Error> for DwmError {
    fn from(err: io::Error) -> Self {
        DwmError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DwmError {
    fn from(err: serde_json::Error) -> Self {
        DwmError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for DwmError {
    fn from(err: serde_yaml::Error) -> Self {
        DwmError::Serde(err.to_string())
    }
}

impl From<regex::Error> for DwmError {
    fn from(err: regex::Error) -> Self {
        DwmError::validation(format!("invalid regex: {err}"))
    }
}

impl DwmError {
    /// Helper to construct configuration errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        DwmError::Config {
            message: message.into(),
        }
    }

    /// Helper for store implementations.
    pub fn lookup_store<T: Into<String>>(message: T) -> Self {
        DwmError::LookupStore {
            message: message.into(),
        }
    }

    /// Helper for hook implementations.
    pub fn udf<T: Into<String>>(message: T) -> Self {
        DwmError::Udf {
            message: message.into(),
        }
    }

    pub fn schema<T: Into<String>>(message: T) -> Self {
        DwmError::Schema {
            message: message.into(),
        }
    }

    pub fn validation<T: Into<String>>(message: T) -> Self {
        DwmError::Validation {
            message: message.into(),
        }
    }

    /// Returns true for errors raised while building a pipeline.
    pub fn is_config(&self) -> bool {
        matches!(self, DwmError::Config { .. })
    }
}
