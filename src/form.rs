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

//! Form host integration
//!
//! The record itself belongs to a host form-state manager. This module
//! describes what the engine needs from such a host ([`FormHost`]), provides
//! a small in-memory host ([`FormState`]), and wires both together in
//! [`ConditionalForm`]:
//! - [`ConditionalForm::use_condition`] evaluates visibility and subscribes
//!   the host to exactly the values the conditions read
//! - [`ConditionalForm::submit`] prunes hidden fields before validation, so
//!   invalid values in hidden fields never cause validation errors

use crate::engine::ConditionEngine;
use crate::error::{FormLogicError, Result};
use crate::evaluator::VisibilityMap;
use crate::path::{FieldPath, PathSegment};
use crate::reader::{DependencySet, FieldReader, RecordReader, get_by_path_mut};
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::borrow::Cow;

/// Change subscription offered by the host
pub trait FieldWatcher {
    /// Also re-evaluate whenever one of these paths changes
    fn watch(&mut self, dependencies: &DependencySet);
}

/// What the engine requires from a form-state manager
pub trait FormHost: FieldReader + FieldWatcher {
    /// The full current record
    fn snapshot(&self) -> Cow<'_, Value>;
}

/// Validation step receiving the pruned record
pub trait Validator {
    type Output;

    fn validate(&self, values: Value) -> Result<Self::Output>;
}

impl<F, T> Validator for F
where
    F: Fn(Value) -> Result<T>,
{
    type Output = T;

    fn validate(&self, values: Value) -> Result<T> {
        self(values)
    }
}

/// In-memory form state: the record plus the set of watched paths
#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: Value,
    watched: FxHashSet<FieldPath>,
}

impl FormState {
    pub fn new(values: Value) -> Self {
        Self {
            values,
            watched: FxHashSet::default(),
        }
    }

    /// The current record
    pub fn values(&self) -> &Value {
        &self.values
    }

    /// Current value at `path`, `null` when absent
    pub fn get(&self, path: &str) -> Result<Value> {
        RecordReader::new(&self.values).read(path)
    }

    /// Write `value` at `path`.
    ///
    /// Object keys are created as needed in an existing parent; array
    /// elements can be replaced or appended at `len`. Returns whether the
    /// change touches a watched path, i.e. visibility must be recomputed.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<bool> {
        let path = FieldPath::try_from(path)?;
        let unwritable = || FormLogicError::Unwritable {
            path: path.to_string(),
        };

        let parent = path.parent().ok_or_else(unwritable)?;
        let last = path.last_segment().ok_or_else(unwritable)?;
        let container = get_by_path_mut(&mut self.values, &parent).ok_or_else(unwritable)?;

        match (container, last) {
            (Value::Object(map), PathSegment::Property(_) | PathSegment::Index(_)) => {
                map.insert(last.to_string(), value);
            }
            (Value::Array(items), PathSegment::Index(index)) if *index < items.len() => {
                items[*index] = value;
            }
            (Value::Array(items), PathSegment::Index(index)) if *index == items.len() => {
                items.push(value);
            }
            _ => return Err(unwritable()),
        }

        let recompute = self.needs_recompute(&path);
        log::trace!("set \"{path}\" (recompute={recompute})");
        Ok(recompute)
    }

    /// Paths currently watched
    pub fn watched(&self) -> impl Iterator<Item = &FieldPath> {
        self.watched.iter()
    }

    /// Whether a change at `changed` affects a watched path.
    /// Replacing a container affects every watched path below it.
    pub fn needs_recompute(&self, changed: &FieldPath) -> bool {
        self.watched.iter().any(|watched| watched.overlaps(changed))
    }

    /// Drop all subscriptions
    pub fn unwatch_all(&mut self) {
        self.watched.clear();
    }
}

impl FieldReader for FormState {
    fn read_paths(&mut self, paths: &[FieldPath]) -> Result<Vec<Value>> {
        RecordReader::new(&self.values).read_paths(paths)
    }
}

impl FieldWatcher for FormState {
    fn watch(&mut self, dependencies: &DependencySet) {
        self.watched.extend(dependencies.iter().cloned());
    }
}

impl FormHost for FormState {
    fn snapshot(&self) -> Cow<'_, Value> {
        Cow::Borrowed(&self.values)
    }
}

/// A form host paired with its condition engine
#[derive(Debug)]
pub struct ConditionalForm<H> {
    host: H,
    engine: ConditionEngine,
}

impl<H: FormHost> ConditionalForm<H> {
    pub fn new(host: H, engine: ConditionEngine) -> Self {
        Self { host, engine }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&self) -> &ConditionEngine {
        &self.engine
    }

    /// Visibility of `paths`, subscribing the host to every value the
    /// conditions read
    pub fn use_condition(&mut self, paths: &[&str]) -> Result<VisibilityMap> {
        let evaluation = self
            .engine
            .visibility_with_dependencies(paths, &mut self.host)?;
        self.host.watch(&evaluation.dependencies);
        Ok(evaluation.visibility)
    }

    /// All current values except those hidden by conditional logic
    pub fn prune_hidden_fields(&self) -> Result<Value> {
        let snapshot = self.host.snapshot();
        self.engine.prune(&snapshot)
    }

    /// Prune hidden fields, then hand the result to `validator`
    pub fn submit<V: Validator>(&self, validator: &V) -> Result<V::Output> {
        let pruned = self.prune_hidden_fields()?;
        validator.validate(pruned)
    }
}
