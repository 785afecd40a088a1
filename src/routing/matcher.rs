//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns such as `/widgets/:id/relationships/parts`
//! - Match a concrete request path against a pattern
//! - Capture named path parameters
//!
//! # Design Decisions
//! - Matching is structural: same segment count, equal literals
//! - Parameters match exactly one non-empty segment
//! - Literals compare against the raw segment; captured parameters are
//!   percent-decoded, and a segment that does not decode to UTF-8 is no match
//! - Path matching is case-sensitive
//! - No regex, no wildcards

use std::collections::HashMap;
use std::fmt;

/// Named parameters captured from a matched path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: HashMap<String, String>,
}

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The `:id` parameter, or an empty string when the route has none.
    pub fn id(&self) -> &str {
        self.get("id").unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_owned(), value.to_owned());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern. Segments starting with `:` are parameters.
    pub fn parse(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let segments = split(&raw)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(segment.to_owned()),
            })
            .collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the captured parameters if `path` matches this pattern.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::default();
        let mut parts = split(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    let value = urlencoding::decode(part).ok()?;
                    params.insert(name, &value);
                }
                _ => return None,
            }
        }

        // Leftover segments mean the path is longer than the pattern.
        match parts.next() {
            Some(_) => None,
            None => Some(params),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    // "/" has no segments at all, not one empty one.
    let empty = trimmed.is_empty();
    trimmed.split('/').filter(move |_| !empty)
}
