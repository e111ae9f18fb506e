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

//! Evaluation configuration

use crate::error::FormLogicError;
use serde::{Deserialize, Serialize};

/// What to do with a queried path that no condition governs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Treat the field as visible (fail open)
    #[default]
    Visible,
    /// Fail the evaluation with [`FormLogicError::UnmatchedField`]
    Error,
}

impl std::fmt::Display for UnmatchedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnmatchedPolicy::Visible => write!(f, "visible"),
            UnmatchedPolicy::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for UnmatchedPolicy {
    type Err = FormLogicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "visible" => Ok(UnmatchedPolicy::Visible),
            "error" => Ok(UnmatchedPolicy::Error),
            _ => Err(FormLogicError::Config {
                message: format!("Invalid unmatched policy: {s}"),
            }),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormLogicConfig {
    /// Policy for paths without a governing condition
    pub unmatched_policy: UnmatchedPolicy,
    /// Emit a diagnostic for every unmatched path
    pub report_unmatched: bool,
}

impl Default for FormLogicConfig {
    fn default() -> Self {
        Self {
            unmatched_policy: UnmatchedPolicy::Visible,
            report_unmatched: true,
        }
    }
}

impl FormLogicConfig {
    /// Configuration that fails on unmatched paths instead of showing them
    pub fn strict() -> Self {
        Self {
            unmatched_policy: UnmatchedPolicy::Error,
            ..Self::default()
        }
    }

    /// Set the unmatched path policy
    pub fn with_unmatched_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched_policy = policy;
        self
    }

    /// Enable or disable diagnostics for unmatched paths
    pub fn with_report_unmatched(mut self, report: bool) -> Self {
        self.report_unmatched = report;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fail_open() {
        let config = FormLogicConfig::default();
        assert_eq!(config.unmatched_policy, UnmatchedPolicy::Visible);
        assert!(config.report_unmatched);
        assert_eq!(FormLogicConfig::strict().unmatched_policy, UnmatchedPolicy::Error);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FormLogicConfig =
            serde_json::from_str(r#"{"unmatched_policy": "error"}"#).unwrap();
        assert_eq!(config.unmatched_policy, UnmatchedPolicy::Error);
        assert!(config.report_unmatched);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Visible".parse::<UnmatchedPolicy>(), Ok(UnmatchedPolicy::Visible));
        assert_eq!(UnmatchedPolicy::Error.to_string(), "error");
        assert!("hide".parse::<UnmatchedPolicy>().is_err());
    }
}
