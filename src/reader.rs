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

//! Scoped value readers
//!
//! Conditions never see the record directly. They receive a [`FieldReader`]
//! and ask it for the values they need, one path or several at a time. The
//! evaluator layers readers on top of the host's accessor:
//!
//! ```text
//! predicate -> WildcardScope -> DependencyRecorder -> host reader
//! ```
//!
//! so that wildcards are resolved against the triggering path before the
//! concrete path is recorded as a dependency and finally read.

use crate::error::{FormLogicError, Result};
use crate::path::{FieldPath, PathSegment, substitute_wildcards};
use rustc_hash::FxHashSet;
use serde_json::Value;

/// Synchronous access to the current values of a record
pub trait FieldReader {
    /// Read the current value at each path, in order. Missing values are `null`.
    fn read_paths(&mut self, paths: &[FieldPath]) -> Result<Vec<Value>>;

    /// Read a single parsed path
    fn read_path(&mut self, path: &FieldPath) -> Result<Value> {
        let mut values = self.read_paths(std::slice::from_ref(path))?;
        Ok(values.pop().unwrap_or(Value::Null))
    }

    /// Read a single path given as text, e.g. `"guests.#.age"`
    fn read(&mut self, path: &str) -> Result<Value> {
        let path = FieldPath::try_from(path)?;
        self.read_path(&path)
    }

    /// Read several paths given as text, returning values in the same order
    fn read_all(&mut self, paths: &[&str]) -> Result<Vec<Value>> {
        let parsed = paths
            .iter()
            .map(|path| FieldPath::try_from(*path))
            .collect::<Result<Vec<_>>>()?;
        self.read_paths(&parsed)
    }
}

impl<R: FieldReader + ?Sized> FieldReader for &mut R {
    fn read_paths(&mut self, paths: &[FieldPath]) -> Result<Vec<Value>> {
        (**self).read_paths(paths)
    }
}

/// Look up the value at `path` inside `value`.
///
/// Index segments address array elements, or object keys spelled as digits.
/// Wildcards never resolve.
pub fn get_by_path<'v>(value: &'v Value, path: &FieldPath) -> Option<&'v Value> {
    path.segments()
        .iter()
        .try_fold(value, |current, segment| match (current, segment) {
            (Value::Object(map), PathSegment::Property(name)) => map.get(name),
            (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        })
}

/// Mutable counterpart of [`get_by_path`]
pub fn get_by_path_mut<'v>(value: &'v mut Value, path: &FieldPath) -> Option<&'v mut Value> {
    path.segments()
        .iter()
        .try_fold(value, |current, segment| match (current, segment) {
            (Value::Object(map), PathSegment::Property(name)) => map.get_mut(name),
            (Value::Object(map), PathSegment::Index(index)) => map.get_mut(&index.to_string()),
            (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
            _ => None,
        })
}

/// Reader over a plain record snapshot
#[derive(Debug, Clone, Copy)]
pub struct RecordReader<'a> {
    record: &'a Value,
}

impl<'a> RecordReader<'a> {
    pub fn new(record: &'a Value) -> Self {
        Self { record }
    }

    /// The snapshot this reader resolves against
    pub fn record(&self) -> &'a Value {
        self.record
    }
}

impl FieldReader for RecordReader<'_> {
    fn read_paths(&mut self, paths: &[FieldPath]) -> Result<Vec<Value>> {
        Ok(paths
            .iter()
            .map(|path| get_by_path(self.record, path).cloned().unwrap_or(Value::Null))
            .collect())
    }
}

/// Reader backed by a host closure returning the value for one path
pub struct FnReader<F> {
    read: F,
}

/// Wrap a host accessor as a [`FieldReader`]
pub fn from_fn<F>(read: F) -> FnReader<F>
where
    F: FnMut(&FieldPath) -> Value,
{
    FnReader { read }
}

impl<F> FieldReader for FnReader<F>
where
    F: FnMut(&FieldPath) -> Value,
{
    fn read_paths(&mut self, paths: &[FieldPath]) -> Result<Vec<Value>> {
        Ok(paths.iter().map(|path| (self.read)(path)).collect())
    }
}

/// Concrete paths read while evaluating conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    paths: FxHashSet<FieldPath>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path; returns false if it was already present
    pub fn insert(&mut self, path: FieldPath) -> bool {
        self.paths.insert(path)
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }

    /// Paths in a stable order, for hosts that need determinism
    pub fn into_sorted_vec(self) -> Vec<FieldPath> {
        let mut paths: Vec<_> = self.paths.into_iter().collect();
        paths.sort();
        paths
    }
}

impl Extend<FieldPath> for DependencySet {
    fn extend<T: IntoIterator<Item = FieldPath>>(&mut self, iter: T) {
        self.paths.extend(iter);
    }
}

impl FromIterator<FieldPath> for DependencySet {
    fn from_iter<T: IntoIterator<Item = FieldPath>>(iter: T) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DependencySet {
    type Item = FieldPath;
    type IntoIter = std::collections::hash_set::IntoIter<FieldPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// Reader that records every requested path before forwarding it
pub struct DependencyRecorder<'a, R: ?Sized> {
    inner: &'a mut R,
    dependencies: &'a mut DependencySet,
}

impl<'a, R: FieldReader + ?Sized> DependencyRecorder<'a, R> {
    pub fn new(inner: &'a mut R, dependencies: &'a mut DependencySet) -> Self {
        Self {
            inner,
            dependencies,
        }
    }
}

impl<R: FieldReader + ?Sized> FieldReader for DependencyRecorder<'_, R> {
    fn read_paths(&mut self, paths: &[FieldPath]) -> Result<Vec<Value>> {
        if paths.is_empty() {
            return Err(FormLogicError::MissingFieldNames);
        }
        self.dependencies.extend(paths.iter().cloned());
        self.inner.read_paths(paths)
    }
}

/// Reader that resolves wildcards against the path being evaluated
pub struct WildcardScope<'a, R: ?Sized> {
    inner: &'a mut R,
    anchor: &'a FieldPath,
}

impl<'a, R: FieldReader + ?Sized> WildcardScope<'a, R> {
    pub fn new(inner: &'a mut R, anchor: &'a FieldPath) -> Self {
        Self { inner, anchor }
    }
}

impl<R: FieldReader + ?Sized> FieldReader for WildcardScope<'_, R> {
    fn read_paths(&mut self, paths: &[FieldPath]) -> Result<Vec<Value>> {
        let concrete: Vec<FieldPath> = paths
            .iter()
            .map(|path| substitute_wildcards(path, self.anchor))
            .collect();
        self.inner.read_paths(&concrete)
    }
}
