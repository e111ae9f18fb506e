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

//! Non-fatal diagnostics emitted during evaluation
//!
//! Gaps in a condition table never break a form: the affected field stays
//! visible and a diagnostic is emitted instead. Where diagnostics go depends
//! on the sink:
//! - [`LogSink`]: forwards to the `log` facade at warning level
//! - [`CollectingSink`]: keeps them in memory, for tests and host UIs
//! - [`NullSink`]: drops them

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What a diagnostic is about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// No condition governs the queried path
    MissingCondition,
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Path the diagnostic refers to
    pub path: String,
}

impl Diagnostic {
    /// A queried path has no governing condition
    pub fn missing_condition(path: impl fmt::Display) -> Self {
        let path = path.to_string();
        Self {
            code: DiagnosticCode::MissingCondition,
            message: format!("Missing conditional logic for \"{path}\""),
            path,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives diagnostics produced during evaluation
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic
    fn emit(&self, diagnostic: Diagnostic);

    /// Diagnostics kept so far (empty for sinks that don't keep any)
    fn collected(&self) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Forget kept diagnostics
    fn clear(&self) {}
}

/// Sink that writes diagnostics through the `log` facade
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic.message);
    }
}

/// Sink that keeps diagnostics in memory and also logs them
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        LogSink.emit(diagnostic.clone());
        self.diagnostics.lock().push(diagnostic);
    }

    fn collected(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    fn clear(&self) {
        self.diagnostics.lock().clear();
    }
}

/// Sink that drops everything
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _diagnostic: Diagnostic) {}
}

/// Convenience type for Arc<dyn DiagnosticSink>
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Create a logging sink wrapped in Arc
pub fn log_sink() -> SharedSink {
    Arc::new(LogSink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.emit(Diagnostic::missing_condition("not_a_real_field"));
        sink.emit(Diagnostic::missing_condition("guests.wine"));

        let collected = sink.collected();
        assert_eq!(collected.len(), 2);
        assert_eq!(
            collected[0].message,
            "Missing conditional logic for \"not_a_real_field\""
        );
        assert_eq!(collected[0].code, DiagnosticCode::MissingCondition);
        assert_eq!(collected[1].path, "guests.wine");

        sink.clear();
        assert!(sink.collected().is_empty());
    }

    #[test]
    fn test_non_collecting_sinks() {
        let null = NullSink;
        null.emit(Diagnostic::missing_condition("a"));
        assert!(null.collected().is_empty());

        let log = log_sink();
        log.emit(Diagnostic::missing_condition("a"));
        assert!(log.collected().is_empty());
    }
}
