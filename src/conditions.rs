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

//! The condition table
//!
//! Maps field paths (optionally containing `#` wildcards) to predicates that
//! decide whether the field is visible. Declaration order is kept: when more
//! than one wildcard key matches a path, the first declared wins.

use crate::error::Result;
use crate::path::FieldPath;
use crate::reader::FieldReader;
use indexmap::IndexMap;
use std::fmt;

/// A visibility predicate. Receives a scoped reader, returns `true` to show the field.
pub type Condition = Box<dyn Fn(&mut dyn FieldReader) -> Result<bool> + Send + Sync>;

/// Ordered map of condition keys to predicates
#[derive(Default)]
pub struct Conditions {
    entries: IndexMap<FieldPath, Condition>,
    /// Wildcarded keys in declaration order
    wildcard_keys: Vec<FieldPath>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    ///
    /// ```rust
    /// use form_conditions::Conditions;
    ///
    /// let conditions = Conditions::new()
    ///     .when("otherCaterer", |gv| Ok(gv.read("caterer")? == "Other"))?
    ///     .when("guests.#.wine", |gv| Ok(gv.read("guests.#.age")? == "21+"))?;
    /// assert_eq!(conditions.len(), 2);
    /// # Ok::<(), form_conditions::FormLogicError>(())
    /// ```
    pub fn when<F>(mut self, key: &str, predicate: F) -> Result<Self>
    where
        F: Fn(&mut dyn FieldReader) -> Result<bool> + Send + Sync + 'static,
    {
        self.insert(key, predicate)?;
        Ok(self)
    }

    /// Insert a condition under a textual key, replacing any previous one.
    /// A replaced key keeps its original declaration position.
    pub fn insert<F>(&mut self, key: &str, predicate: F) -> Result<Option<Condition>>
    where
        F: Fn(&mut dyn FieldReader) -> Result<bool> + Send + Sync + 'static,
    {
        let key = FieldPath::try_from(key)?;
        Ok(self.insert_path(key, Box::new(predicate)))
    }

    /// Insert a condition under an already parsed key
    pub fn insert_path(&mut self, key: FieldPath, condition: Condition) -> Option<Condition> {
        if key.has_wildcard() && !self.entries.contains_key(&key) {
            self.wildcard_keys.push(key.clone());
        }
        self.entries.insert(key, condition)
    }

    /// Remove a condition, keeping the order of the others
    pub fn remove(&mut self, key: &FieldPath) -> Option<Condition> {
        let removed = self.entries.shift_remove(key);
        if removed.is_some() {
            self.wildcard_keys.retain(|k| k != key);
        }
        removed
    }

    pub fn get(&self, key: &FieldPath) -> Option<&Condition> {
        self.entries.get(key)
    }

    /// The stored key equal to `key` together with its condition
    pub fn get_entry(&self, key: &FieldPath) -> Option<(&FieldPath, &Condition)> {
        self.entries.get_key_value(key)
    }

    pub fn contains_key(&self, key: &FieldPath) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &FieldPath> {
        self.entries.keys()
    }

    /// Keys containing at least one wildcard, in declaration order
    pub fn wildcard_keys(&self) -> &[FieldPath] {
        &self.wildcard_keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditions")
            .field("keys", &self.entries.keys().map(ToString::to_string).collect::<Vec<_>>())
            .finish()
    }
}
