//! Path Resolution
//!
//! A `Path` locates a node inside a value tree by a sequence of object keys and
//! array indexes, written as `friends[0].id`. Resolution never fails loudly:
//! a missing key, an index out of range, a node of the wrong kind or an
//! explicit `null` all resolve to `None`.

use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;
use crate::value::Value;

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Non-empty sequence of path segments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Path consisting of a single object key
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(key.into())],
        }
    }

    /// Path consisting of a single array index
    pub fn index(index: usize) -> Self {
        Self {
            segments: vec![PathSegment::Index(index)],
        }
    }

    /// Build a path from explicit segments. Keys may contain any character.
    pub fn from_segments(segments: Vec<PathSegment>) -> Result<Self, SchemaError> {
        if segments.is_empty() {
            return Err(SchemaError::InvalidPath {
                path: String::new(),
                reason: "path must contain at least one segment".to_string(),
            });
        }
        Ok(Self { segments })
    }

    /// Parse the textual form: keys separated by `.`, indexes as `[n]`
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidPath {
            path: text.to_string(),
            reason: reason.to_string(),
        };

        if text.is_empty() {
            return Err(invalid("path must not be empty"));
        }

        let mut segments = Vec::new();
        for (position, part) in text.split('.').enumerate() {
            let (key, mut rest) = match part.find('[') {
                Some(open) => part.split_at(open),
                None => (part, ""),
            };

            if key.contains(']') {
                return Err(invalid("unbalanced ']'"));
            }
            if key.is_empty() && (position > 0 || rest.is_empty()) {
                return Err(invalid("empty key segment"));
            }
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.to_string()));
            }

            while !rest.is_empty() {
                let Some(body) = rest.strip_prefix('[') else {
                    return Err(invalid("expected '[' after index"));
                };
                let Some(close) = body.find(']') else {
                    return Err(invalid("unterminated index"));
                };
                let index = body[..close]
                    .parse::<usize>()
                    .map_err(|_| invalid("index must be a non-negative integer"))?;
                segments.push(PathSegment::Index(index));
                rest = &body[close + 1..];
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_single(&self) -> bool {
        self.segments.len() == 1
    }

    /// Concatenate `other` after `self`
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = Vec::with_capacity(self.len() + other.len());
        segments.extend_from_slice(&self.segments);
        segments.extend_from_slice(&other.segments);
        Path { segments }
    }

    /// Resolve this path against `node`
    pub fn resolve<'a>(&self, node: &'a Value) -> Option<&'a Value> {
        resolve(node, self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = SchemaError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Path::parse(text)
    }
}

impl TryFrom<&str> for Path {
    type Error = SchemaError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Path::parse(text)
    }
}

/// Resolve `path` against `node`, returning the child or `None` when absent
pub fn resolve<'a>(node: &'a Value, path: &Path) -> Option<&'a Value> {
    if let [segment] = path.segments() {
        return step(node, segment);
    }
    path.segments()
        .iter()
        .try_fold(node, |current, segment| step(current, segment))
}

fn step<'a>(node: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    let next = match (node, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }?;
    (!next.is_null()).then_some(next)
}
