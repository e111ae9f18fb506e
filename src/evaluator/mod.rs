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

//! Visibility evaluation
//!
//! Two entry points share the same resolution logic:
//! - [`evaluate_visibility`] reads through the caller's reader directly and
//!   returns one boolean per requested path.
//! - [`evaluate_with_dependencies`] additionally records every concrete path
//!   read by the conditions, so the host can re-evaluate only when one of
//!   them changes.

use crate::conditions::Conditions;
use crate::config::{FormLogicConfig, UnmatchedPolicy};
use crate::diagnostics::{Diagnostic, DiagnosticSink, LogSink};
use crate::error::{FormLogicError, Result};
use crate::path::FieldPath;
use crate::reader::{DependencyRecorder, DependencySet, FieldReader, WildcardScope};
use crate::resolver::resolve_condition;
use indexmap::IndexMap;

/// Visibility per queried path, in query order
pub type VisibilityMap = IndexMap<FieldPath, bool>;

static DEFAULT_CONFIG: FormLogicConfig = FormLogicConfig {
    unmatched_policy: UnmatchedPolicy::Visible,
    report_unmatched: true,
};

static DEFAULT_SINK: LogSink = LogSink;

/// Settings and diagnostic sink for one evaluation call
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub config: &'a FormLogicConfig,
    pub sink: &'a dyn DiagnosticSink,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(config: &'a FormLogicConfig, sink: &'a dyn DiagnosticSink) -> Self {
        Self { config, sink }
    }
}

impl Default for EvaluationContext<'static> {
    /// Fail-open configuration, diagnostics to the `log` facade
    fn default() -> Self {
        Self {
            config: &DEFAULT_CONFIG,
            sink: &DEFAULT_SINK,
        }
    }
}

/// Result of [`evaluate_with_dependencies`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyEvaluation {
    pub visibility: VisibilityMap,
    pub dependencies: DependencySet,
}

impl DependencyEvaluation {
    /// Visibility of a queried path, `None` if it was not queried
    pub fn is_visible(&self, path: &FieldPath) -> Option<bool> {
        self.visibility.get(path).copied()
    }
}

/// Evaluate a single concrete path
pub fn evaluate_path<R>(
    path: &FieldPath,
    conditions: &Conditions,
    reader: &mut R,
    ctx: EvaluationContext<'_>,
) -> Result<bool>
where
    R: FieldReader + ?Sized,
{
    let Some((key, condition)) = resolve_condition(path, conditions) else {
        return unmatched(path, ctx);
    };

    let visible = if key.has_wildcard() {
        // Swap out wildcards in the paths the condition asks for with the
        // indices of the path being evaluated
        let mut scope = WildcardScope::new(reader, path);
        condition(&mut scope)?
    } else {
        let mut direct = reader;
        condition(&mut direct)?
    };

    log::debug!("\"{path}\" visible={visible} (condition \"{key}\")");
    Ok(visible)
}

fn unmatched(path: &FieldPath, ctx: EvaluationContext<'_>) -> Result<bool> {
    match ctx.config.unmatched_policy {
        UnmatchedPolicy::Error => Err(FormLogicError::UnmatchedField {
            path: path.to_string(),
        }),
        UnmatchedPolicy::Visible => {
            if ctx.config.report_unmatched {
                ctx.sink.emit(Diagnostic::missing_condition(path));
            }
            Ok(true)
        }
    }
}

/// Evaluate every path with the caller's reader, one result per path in order
pub fn evaluate_visibility<R>(
    paths: &[FieldPath],
    conditions: &Conditions,
    reader: &mut R,
    ctx: EvaluationContext<'_>,
) -> Result<Vec<bool>>
where
    R: FieldReader + ?Sized,
{
    paths
        .iter()
        .map(|path| evaluate_path(path, conditions, &mut *reader, ctx))
        .collect()
}

/// Evaluate every path while recording which concrete paths the conditions read
pub fn evaluate_with_dependencies<R>(
    paths: &[FieldPath],
    conditions: &Conditions,
    reader: &mut R,
    ctx: EvaluationContext<'_>,
) -> Result<DependencyEvaluation>
where
    R: FieldReader + ?Sized,
{
    let mut dependencies = DependencySet::new();
    let mut visibility = VisibilityMap::with_capacity(paths.len());
    {
        let mut recorder = DependencyRecorder::new(reader, &mut dependencies);
        for path in paths {
            let visible = evaluate_path(path, conditions, &mut recorder, ctx)?;
            visibility.insert(path.clone(), visible);
        }
    }

    Ok(DependencyEvaluation {
        visibility,
        dependencies,
    })
}
