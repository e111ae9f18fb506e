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

//! Finding the condition that governs a concrete path

use crate::conditions::{Condition, Conditions};
use crate::path::{FieldPath, shape_matches};

/// Find the condition governing `path`, together with its key.
///
/// An exact key wins. Otherwise, for paths containing an index, the first
/// declared wildcard key with the same shape is used. For instance:
///   path = "house.1.cats.2"
///   keys = ["house.0.cats.#", "house.#.cats.#"]
/// resolves to "house.#.cats.#", since the first key only targets the cats
/// of the first house.
pub fn resolve_condition<'c>(
    path: &FieldPath,
    conditions: &'c Conditions,
) -> Option<(&'c FieldPath, &'c Condition)> {
    if let Some(entry) = conditions.get_entry(path) {
        return Some(entry);
    }

    if !path.looks_indexed() || conditions.wildcard_keys().is_empty() {
        return None;
    }

    let found = conditions
        .wildcard_keys()
        .iter()
        .filter(|key| shape_matches(path, key))
        .find_map(|key| conditions.get_entry(key));
    if let Some((key, _)) = found {
        log::trace!("\"{path}\" governed by wildcard condition \"{key}\"");
    }
    found
}

/// Key of the condition governing `path`, see [`resolve_condition`]
pub fn resolve<'c>(path: &FieldPath, conditions: &'c Conditions) -> Option<&'c FieldPath> {
    resolve_condition(path, conditions).map(|(key, _)| key)
}
