// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for condition evaluation and pruning

use crate::path::PathParseError;
use thiserror::Error;

/// Errors raised while evaluating conditional logic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormLogicError {
    /// A dependency-recording reader was called without any field names.
    ///
    /// Dependency tracking cannot work without knowing what was read, so this
    /// is a programming mistake in the condition, not a runtime condition.
    #[error("Please pass getValues a field name or array of field names")]
    MissingFieldNames,

    /// A field path or condition key could not be parsed
    #[error("Invalid field path \"{path}\": {source}")]
    InvalidPath {
        /// The offending input
        path: String,
        /// Why it was rejected
        #[source]
        source: PathParseError,
    },

    /// No condition governs a path and the configuration forbids failing open
    #[error("Missing conditional logic for \"{path}\"")]
    UnmatchedField {
        /// The concrete path that had no governing condition
        path: String,
    },

    /// A value could not be written because its parent does not exist
    #[error("Cannot write \"{path}\": parent is missing or not a container")]
    Unwritable {
        /// The path that was written to
        path: String,
    },

    /// A condition predicate reported a failure of its own
    #[error("Condition \"{key}\" failed: {message}")]
    Condition {
        /// Key of the failing condition
        key: String,
        /// Message supplied by the predicate
        message: String,
    },

    /// A configuration value could not be understood
    #[error("Invalid configuration: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// The host validator rejected the pruned record
    #[error("Validation failed: {message}")]
    Validation {
        /// Message supplied by the validator
        message: String,
    },
}

impl FormLogicError {
    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, source: PathParseError) -> Self {
        Self::InvalidPath {
            path: path.into(),
            source,
        }
    }

    /// Create a condition failure, for use inside predicates
    pub fn condition(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Condition {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether this error signals misuse of the API rather than bad data
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::MissingFieldNames | Self::InvalidPath { .. })
    }
}

/// Result type for conditional logic operations
pub type Result<T> = std::result::Result<T, FormLogicError>;
