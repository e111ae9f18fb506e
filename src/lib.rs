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

//! Conditional field visibility for nested form records
//!
//! Conditions are declared per field path. A path may use `#` in place of an
//! array index so one condition covers every item of a repeated section:
//!
//! ```rust
//! use form_conditions::{ConditionEngine, Conditions, RecordReader};
//! use serde_json::json;
//!
//! let conditions = Conditions::new()
//!     .when("otherCaterer", |gv| Ok(gv.read("caterer")? == "Other"))?
//!     .when("guests.#.wine", |gv| Ok(gv.read("guests.#.age")? == "21+"))?;
//! let engine = ConditionEngine::new(conditions);
//!
//! let record = json!({
//!     "caterer": "Elephants Catering",
//!     "otherCaterer": "",
//!     "guests": [{"name": "Bob", "age": "21+", "wine": "Red"}]
//! });
//!
//! let evaluation = engine
//!     .visibility_with_dependencies(&["otherCaterer", "guests.0.wine"], &mut RecordReader::new(&record))?;
//! assert_eq!(evaluation.visibility.values().copied().collect::<Vec<_>>(), vec![false, true]);
//! assert_eq!(evaluation.dependencies.len(), 2);
//!
//! let pruned = engine.prune(&record)?;
//! assert!(pruned.get("otherCaterer").is_none());
//! # Ok::<(), form_conditions::FormLogicError>(())
//! ```

pub mod conditions;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod form;
pub mod path;
pub mod prune;
pub mod reader;
pub mod resolver;

pub use conditions::{Condition, Conditions};
pub use config::{FormLogicConfig, UnmatchedPolicy};
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticCode, DiagnosticSink, LogSink, NullSink, SharedSink,
};
pub use engine::ConditionEngine;
pub use error::{FormLogicError, Result};
pub use evaluator::{
    DependencyEvaluation, EvaluationContext, VisibilityMap, evaluate_path, evaluate_visibility,
    evaluate_with_dependencies,
};
pub use form::{ConditionalForm, FieldWatcher, FormHost, FormState, Validator};
pub use path::{FieldPath, PathParseError, PathSegment, shape_matches, substitute_wildcards};
pub use prune::{delete_by_path, expand_condition_paths, expand_wildcards, prune_hidden_fields};
pub use reader::{
    DependencyRecorder, DependencySet, FieldReader, FnReader, RecordReader, WildcardScope,
    from_fn, get_by_path,
};
pub use resolver::{resolve, resolve_condition};
