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

//! Field name paths with wildcard array indices
//!
//! A field path is a dot-separated list of segments such as `guests.0.wine`.
//! Condition keys may use `#` in place of an array index (`guests.#.wine`),
//! meaning "the index of the repeated item currently being evaluated".

use crate::error::FormLogicError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between path segments
pub const SEPARATOR: char = '.';

/// Segment text standing in for "the current array index"
pub const WILDCARD: &str = "#";

/// A segment in a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Property name (e.g., "guests", "wine")
    Property(String),
    /// Array index (e.g., 0, 1)
    Index(usize),
    /// Wildcard index, written `#`
    Wildcard,
}

impl PathSegment {
    /// Classify one segment of text.
    ///
    /// All-digit text is an index; digit strings too large for `usize`
    /// stay property names so that lookup is still possible on objects.
    pub fn parse(text: &str) -> Self {
        if text == WILDCARD {
            return PathSegment::Wildcard;
        }
        if is_index_text(text) {
            if let Ok(index) = text.parse::<usize>() {
                return PathSegment::Index(index);
            }
        }
        PathSegment::Property(text.to_string())
    }

    /// Check if this segment is a literal array index
    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }

    /// Check if this segment is the wildcard marker
    pub fn is_wildcard(&self) -> bool {
        matches!(self, PathSegment::Wildcard)
    }

    /// Get the property name if this is a property segment
    pub fn as_property(&self) -> Option<&str> {
        match self {
            PathSegment::Property(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => f.write_str(name),
            PathSegment::Index(idx) => write!(f, "{idx}"),
            PathSegment::Wildcard => f.write_str(WILDCARD),
        }
    }
}

/// True iff the text matches `^\d+$`
pub fn is_index_text(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Error type for path parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    /// The path text was empty
    #[error("Path is empty")]
    Empty,
    /// Two separators with nothing between them, or a leading/trailing separator
    #[error("Empty segment at position {0}")]
    EmptySegment(usize),
}

/// A parsed field path.
///
/// Most form paths are short, so segments are kept inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: SmallVec<[PathSegment; 6]>,
}

impl FieldPath {
    /// Parse a path from its dotted representation.
    /// Examples: "contactName", "guests.0.wine", "guests.#.bottles.#.grape"
    pub fn parse(path_str: &str) -> Result<Self, PathParseError> {
        if path_str.is_empty() {
            return Err(PathParseError::Empty);
        }

        let mut segments = SmallVec::new();
        for (position, part) in path_str.split(SEPARATOR).enumerate() {
            if part.is_empty() {
                return Err(PathParseError::EmptySegment(position));
            }
            segments.push(PathSegment::parse(part));
        }
        Ok(Self { segments })
    }

    /// The root path (no segments), addressing the whole record
    pub fn root() -> Self {
        Self::default()
    }

    /// Get all segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the last segment
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// True iff any segment is the wildcard marker
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(PathSegment::is_wildcard)
    }

    /// True iff at least one segment is a literal index.
    ///
    /// A wildcarded key can only match a path that has an index at the
    /// wildcard's position, so paths without indices skip wildcard matching.
    pub fn looks_indexed(&self) -> bool {
        self.segments.iter().any(PathSegment::is_index)
    }

    /// Positions of wildcard segments, left to right
    pub fn wildcard_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, seg)| seg.is_wildcard())
            .map(|(position, _)| position)
    }

    /// The first `len` segments of this path
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments.iter().take(len).cloned().collect(),
        }
    }

    /// Copy of this path with the segment at `position` replaced
    pub fn with_segment(&self, position: usize, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        if let Some(slot) = segments.get_mut(position) {
            *slot = segment;
        }
        Self { segments }
    }

    /// True iff `prefix` is this path or one of its ancestors
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// True iff one path is an ancestor of (or equal to) the other
    pub fn overlaps(&self, other: &FieldPath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }

    /// Get the parent path (removing the last segment)
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.prefix(self.segments.len() - 1))
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = FormLogicError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::parse(text).map_err(|source| FormLogicError::invalid_path(text, source))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Compare a concrete path against a condition key.
///
/// Segment counts must be equal, and each key segment must either equal the
/// path segment or be a wildcard aligned with an index in the path. There is
/// no partial matching within a segment.
pub fn shape_matches(concrete: &FieldPath, key: &FieldPath) -> bool {
    concrete.len() == key.len()
        && concrete
            .segments()
            .iter()
            .zip(key.segments())
            .all(|(path_part, key_part)| {
                path_part == key_part || (key_part.is_wildcard() && path_part.is_index())
            })
}

/// Where the walk in [`substitute_wildcards`] currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    /// Both paths agree on every segment so far
    Matching,
    /// The paths disagreed once; nothing further is substituted
    Diverged,
}

/// Replace wildcards in `requested` with the indices found at the same
/// positions in `reference`, but only within the prefix the two paths share.
///
/// Once the paths disagree at some position the walk is diverged for good,
/// and the remaining segments of `requested` pass through untouched, even
/// when they are wildcards.
pub fn substitute_wildcards(requested: &FieldPath, reference: &FieldPath) -> FieldPath {
    if !requested.has_wildcard() {
        return requested.clone();
    }

    let mut state = Alignment::Matching;
    let segments = requested
        .segments()
        .iter()
        .enumerate()
        .map(|(position, requested_part)| {
            if state == Alignment::Diverged {
                return requested_part.clone();
            }
            match reference.segments().get(position) {
                // No corresponding reference part
                None => requested_part.clone(),
                Some(reference_part) if reference_part == requested_part => {
                    requested_part.clone()
                }
                Some(PathSegment::Index(index)) if requested_part.is_wildcard() => {
                    PathSegment::Index(*index)
                }
                Some(_) => {
                    state = Alignment::Diverged;
                    requested_part.clone()
                }
            }
        })
        .collect::<SmallVec<_>>();

    FieldPath { segments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn p(text: &str) -> FieldPath {
        FieldPath::parse(text).unwrap()
    }

    #[test]
    fn test_path_parsing_and_display() {
        let path = p("guests.0.wine");
        assert_eq!(path.len(), 3);
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Property("guests".to_string()),
                PathSegment::Index(0),
                PathSegment::Property("wine".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "guests.0.wine");

        let key = p("house.#.cats.#");
        assert_eq!(key.to_string(), "house.#.cats.#");
        assert_eq!(key.wildcard_positions().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_error_cases() {
        assert_eq!(FieldPath::parse(""), Err(PathParseError::Empty));
        assert_eq!(FieldPath::parse("a..b"), Err(PathParseError::EmptySegment(1)));
        assert_eq!(FieldPath::parse(".a"), Err(PathParseError::EmptySegment(0)));
        assert_eq!(FieldPath::parse("a."), Err(PathParseError::EmptySegment(1)));
    }

    #[test]
    fn test_segment_classification() {
        assert!(PathSegment::parse("12").is_index());
        assert!(PathSegment::parse("#").is_wildcard());
        assert!(!PathSegment::parse("1a").is_index());
        assert!(!PathSegment::parse("-1").is_index());
        // Too large for usize, kept as a property name
        let huge = PathSegment::parse("99999999999999999999999999");
        assert_eq!(huge.as_property(), Some("99999999999999999999999999"));
    }

    #[test]
    fn test_wildcard_and_index_detection() {
        assert!(p("guests.#.wine").has_wildcard());
        assert!(!p("guests.0.wine").has_wildcard());
        assert!(p("guests.0.wine").looks_indexed());
        assert!(!p("otherCaterer").looks_indexed());
        assert!(!p("guests.#.wine").looks_indexed());
    }

    #[test]
    fn test_prefix_and_parent() {
        let path = p("house.1.cats.2");
        assert_eq!(path.prefix(2), p("house.1"));
        assert!(path.prefix(0).is_empty());
        assert_eq!(path.parent(), Some(p("house.1.cats")));
        assert_eq!(FieldPath::root().parent(), None);
        assert!(path.starts_with(&p("house.1")));
        assert!(!path.starts_with(&p("house.2")));
        assert!(p("house").overlaps(&path));
        assert!(path.overlaps(&p("house")));
        assert!(!p("garden").overlaps(&path));
        assert_eq!(
            p("house.#.cats").with_segment(1, PathSegment::Index(4)),
            p("house.4.cats")
        );
    }

    #[rstest]
    #[case("guest.0.name", "guest.#.name", true)]
    #[case("house.1.cats.2", "house.#.cats.#", true)]
    #[case("house.1.cats.2", "house.0.cats.#", false)]
    #[case("house.0.cats.2", "house.0.cats.#", true)]
    #[case("guest.0.name", "guest.#", false)]
    #[case("guest.name.first", "guest.#.first", false)]
    #[case("guest.0.name", "guest.#.age", false)]
    fn test_shape_matches(#[case] path: &str, #[case] key: &str, #[case] expected: bool) {
        assert_eq!(shape_matches(&p(path), &p(key)), expected);
    }

    #[rstest]
    #[case("guests.#.age", "guests.3.wine", "guests.3.age")]
    #[case("guests.#.hasGloves", "guests.1.bottles.0.x", "guests.1.hasGloves")]
    #[case("guests.0.hasGloves", "guests.1.bottles.0.x", "guests.0.hasGloves")]
    #[case("guests.#.bottles.#.sips", "guests.2.bottles.5.x", "guests.2.bottles.5.sips")]
    // Diverges at "hosts", so the wildcard after it is left alone
    #[case("hosts.#.name", "guests.1.wine", "hosts.#.name")]
    // Diverges at the fixed index 0, later wildcard is untouched
    #[case("guests.0.bottles.#", "guests.1.bottles.4", "guests.0.bottles.#")]
    // Reference shorter than the requested path
    #[case("guests.#.bottles.#", "guests.1", "guests.1.bottles.#")]
    fn test_substitute_wildcards(
        #[case] requested: &str,
        #[case] reference: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(substitute_wildcards(&p(requested), &p(reference)), p(expected));
    }

    #[test]
    fn test_substitute_without_wildcards_is_identity() {
        let requested = p("contactName");
        assert_eq!(substitute_wildcards(&requested, &p("guests.0.wine")), requested);
    }

    #[test]
    fn test_serde_as_string() {
        let path = p("guests.#.wine");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"guests.#.wine\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<FieldPath>("\"a..b\"").is_err());
    }
}
