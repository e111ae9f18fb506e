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

//! Condition engine - the main entry point for visibility evaluation

use crate::conditions::Conditions;
use crate::config::FormLogicConfig;
use crate::diagnostics::{SharedSink, log_sink};
use crate::error::Result;
use crate::evaluator::{
    DependencyEvaluation, EvaluationContext, evaluate_visibility, evaluate_with_dependencies,
};
use crate::path::FieldPath;
use crate::prune::prune_hidden_fields;
use crate::reader::FieldReader;
use crate::resolver::resolve;
use serde_json::Value;

/// Owns a condition table together with its configuration and diagnostic sink
pub struct ConditionEngine {
    conditions: Conditions,
    config: FormLogicConfig,
    sink: SharedSink,
}

impl ConditionEngine {
    /// Create an engine with the default configuration, logging diagnostics
    pub fn new(conditions: Conditions) -> Self {
        Self {
            conditions,
            config: FormLogicConfig::default(),
            sink: log_sink(),
        }
    }

    pub fn with_config(mut self, config: FormLogicConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn config(&self) -> &FormLogicConfig {
        &self.config
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    fn context(&self) -> EvaluationContext<'_> {
        EvaluationContext::new(&self.config, &*self.sink)
    }

    /// Key of the condition governing `path`, if any
    pub fn resolve(&self, path: &str) -> Result<Option<&FieldPath>> {
        let path = FieldPath::try_from(path)?;
        Ok(resolve(&path, &self.conditions))
    }

    /// Visibility of each path, in order
    pub fn visibility<R>(&self, paths: &[&str], reader: &mut R) -> Result<Vec<bool>>
    where
        R: FieldReader + ?Sized,
    {
        let paths = parse_all(paths)?;
        evaluate_visibility(&paths, &self.conditions, reader, self.context())
    }

    /// Visibility of each path plus the concrete paths the conditions read
    pub fn visibility_with_dependencies<R>(
        &self,
        paths: &[&str],
        reader: &mut R,
    ) -> Result<DependencyEvaluation>
    where
        R: FieldReader + ?Sized,
    {
        let paths = parse_all(paths)?;
        evaluate_with_dependencies(&paths, &self.conditions, reader, self.context())
    }

    /// Copy of `record` with every currently hidden field removed
    pub fn prune(&self, record: &Value) -> Result<Value> {
        prune_hidden_fields(record, &self.conditions, self.context())
    }
}

fn parse_all(paths: &[&str]) -> Result<Vec<FieldPath>> {
    paths.iter().map(|path| FieldPath::try_from(*path)).collect()
}

impl std::fmt::Debug for ConditionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionEngine")
            .field("conditions", &self.conditions)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
