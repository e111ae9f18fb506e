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

//! Removing hidden fields from a record
//!
//! Invalid values in hidden fields must not cause validation errors, and hidden
//! fields must not be submitted. [`prune_hidden_fields`] runs every condition
//! against the record and returns a copy with all hidden fields removed. The
//! input record is never modified.

use crate::conditions::Conditions;
use crate::error::Result;
use crate::evaluator::{EvaluationContext, evaluate_visibility};
use crate::path::{FieldPath, PathSegment};
use crate::reader::{RecordReader, get_by_path, get_by_path_mut};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Every concrete path a condition key currently stands for in `record`.
///
/// Wildcards are expanded left to right using the actual length of the array
/// found at each wildcard position. A wildcard over a missing or non-array
/// value is a dead end and yields nothing.
pub fn expand_wildcards(key: &FieldPath, record: &Value) -> Vec<FieldPath> {
    let mut candidates = vec![key.clone()];

    for position in key.wildcard_positions() {
        if candidates.is_empty() {
            break;
        }

        let mut next = Vec::new();
        for candidate in &candidates {
            if let Some(Value::Array(items)) = get_by_path(record, &candidate.prefix(position)) {
                next.extend(
                    (0..items.len())
                        .map(|index| candidate.with_segment(position, PathSegment::Index(index))),
                );
            }
        }
        candidates = next;
    }

    candidates
}

/// Expand every key of the table against `record`, in declaration order
pub fn expand_condition_paths(conditions: &Conditions, record: &Value) -> Vec<FieldPath> {
    conditions
        .keys()
        .flat_map(|key| expand_wildcards(key, record))
        .collect()
}

/// Copy of `value` without the leaf at `path`.
///
/// Only the containers on the way to the leaf are rebuilt. When the path
/// does not resolve, the input is returned borrowed. Removing an array
/// element replaces it with `null`, so sibling indices stay valid.
pub fn delete_by_path<'v>(value: &'v Value, path: &FieldPath) -> Cow<'v, Value> {
    match remove_along(value, path.segments()) {
        Some(updated) => Cow::Owned(updated),
        None => Cow::Borrowed(value),
    }
}

fn remove_along(value: &Value, segments: &[PathSegment]) -> Option<Value> {
    let (head, rest) = segments.split_first()?;

    match (value, head) {
        (Value::Object(map), PathSegment::Property(_) | PathSegment::Index(_)) => {
            let key = head.to_string();
            let child = map.get(&key)?;
            if rest.is_empty() {
                Some(Value::Object(rebuild_object(map, &key, None)))
            } else {
                let updated = remove_along(child, rest)?;
                Some(Value::Object(rebuild_object(map, &key, Some(updated))))
            }
        }
        (Value::Array(items), PathSegment::Index(index)) => {
            let child = items.get(*index)?;
            let updated = if rest.is_empty() {
                Value::Null
            } else {
                remove_along(child, rest)?
            };
            Some(Value::Array(rebuild_array(items, *index, updated)))
        }
        _ => None,
    }
}

/// Copy of `map` with `key` replaced, or dropped when `replacement` is `None`
fn rebuild_object(map: &Map<String, Value>, key: &str, replacement: Option<Value>) -> Map<String, Value> {
    let mut replacement = replacement;
    map.iter()
        .filter_map(|(k, v)| {
            if k == key {
                replacement.take().map(|updated| (k.clone(), updated))
            } else {
                Some((k.clone(), v.clone()))
            }
        })
        .collect()
}

fn rebuild_array(items: &[Value], index: usize, replacement: Value) -> Vec<Value> {
    let mut replacement = Some(replacement);
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match replacement.take_if(|_| i == index) {
            Some(updated) => updated,
            None => item.clone(),
        })
        .collect()
}

/// Remove the leaf at `path` from `value` in place, with the same rules as
/// [`delete_by_path`]. Returns whether anything was removed.
fn remove_in_place(value: &mut Value, path: &FieldPath) -> bool {
    let (Some(parent), Some(last)) = (path.parent(), path.last_segment()) else {
        return false;
    };

    match (get_by_path_mut(value, &parent), last) {
        (Some(Value::Object(map)), PathSegment::Property(_) | PathSegment::Index(_)) => {
            map.remove(&last.to_string()).is_some()
        }
        (Some(Value::Array(items)), PathSegment::Index(index)) => match items.get_mut(*index) {
            Some(slot) => {
                *slot = Value::Null;
                true
            }
            None => false,
        },
        _ => false,
    }
}

/// Evaluate every condition against `record` and return a copy without the hidden fields.
///
/// The record is cloned at most once, on the first hidden field that is
/// present, and all removals are applied to that copy. Paths that no longer
/// resolve, for example because an ancestor was already removed, are skipped.
pub fn prune_hidden_fields(
    record: &Value,
    conditions: &Conditions,
    ctx: EvaluationContext<'_>,
) -> Result<Value> {
    let paths = expand_condition_paths(conditions, record);
    let mut reader = RecordReader::new(record);
    let results = evaluate_visibility(&paths, conditions, &mut reader, ctx)?;

    let mut pruned: Cow<'_, Value> = Cow::Borrowed(record);
    for (path, visible) in paths.iter().zip(results) {
        if visible {
            continue;
        }
        if get_by_path(&pruned, path).is_some() && remove_in_place(pruned.to_mut(), path) {
            log::debug!("pruned hidden field \"{path}\"");
        } else {
            log::trace!("hidden field \"{path}\" already absent");
        }
    }

    Ok(pruned.into_owned())
}
