//! Field paths and the shared path writer
//!
//! A path addresses one value inside a record: `.` separates object keys and
//! `[n]` selects an array position, e.g. `items[0].tags[2]`. Every write into a
//! reconstructed record goes through [`write_at_path`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::error::PathError;

// ============================================================================
// Field Path
// ============================================================================

/// Segment of a field path
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object key: .fieldName
    Property(String),
    /// Array position: [0], [1], etc.
    Index(usize),
}

/// Structured path, e.g. "user.address.city" or "items[0].name"
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Create a root path (empty)
    pub fn root() -> Self {
        Self { segments: vec![] }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Push a property segment
    pub fn push_property(&self, name: &str) -> Self {
        let mut new = self.clone();
        new.segments.push(PathSegment::Property(name.to_string()));
        new
    }

    /// Push an array index segment
    pub fn push_index(&self, idx: usize) -> Self {
        let mut new = self.clone();
        new.segments.push(PathSegment::Index(idx));
        new
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Index of the final segment, if it is an array position
    pub fn last_index(&self) -> Option<usize> {
        match self.segments.last() {
            Some(PathSegment::Index(idx)) => Some(*idx),
            _ => None,
        }
    }

    /// Get the parent path (without the last segment)
    pub fn parent(&self) -> Self {
        let mut new = self.clone();
        new.segments.pop();
        new
    }

    /// The first `depth` segments
    pub fn prefix(&self, depth: usize) -> Self {
        Self {
            segments: self.segments[..depth.min(self.segments.len())].to_vec(),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Replace the array position at `depth`. Returns whether anything changed.
    pub(crate) fn set_index_at(&mut self, depth: usize, index: usize) -> bool {
        match self.segments.get_mut(depth) {
            Some(PathSegment::Index(current)) if *current != index => {
                *current = index;
                true
            }
            _ => false,
        }
    }

    /// Parse a path string. The empty string is the root path.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let chars: Vec<char> = s.chars().collect();
        let mut segments = Vec::new();
        let mut pos = 0;

        if chars.is_empty() {
            return Ok(Self::root());
        }

        loop {
            // Property name runs until a separator
            let start = pos;
            while pos < chars.len() && !matches!(chars[pos], '.' | '[' | ']') {
                pos += 1;
            }
            if pos == start {
                return Err(match chars.get(pos) {
                    Some(']') => PathError::Unexpected {
                        path: s.to_string(),
                        found: ']',
                        offset: pos,
                    },
                    _ => PathError::EmptySegment {
                        path: s.to_string(),
                        offset: pos,
                    },
                });
            }
            segments.push(PathSegment::Property(chars[start..pos].iter().collect()));

            while pos < chars.len() && chars[pos] == '[' {
                let open = pos;
                pos += 1;
                let digits_start = pos;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                if pos == digits_start || pos >= chars.len() || chars[pos] != ']' {
                    return Err(PathError::BadIndex {
                        path: s.to_string(),
                        offset: open,
                    });
                }
                let digits: String = chars[digits_start..pos].iter().collect();
                let idx = digits.parse::<usize>().map_err(|_| PathError::BadIndex {
                    path: s.to_string(),
                    offset: open,
                })?;
                segments.push(PathSegment::Index(idx));
                pos += 1;
            }

            match chars.get(pos) {
                None => break,
                Some('.') => pos += 1,
                Some(other) => {
                    return Err(PathError::Unexpected {
                        path: s.to_string(),
                        found: *other,
                        offset: pos,
                    })
                }
            }
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Property(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Property(name) => write!(f, ".{}", name)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Path Writer
// ============================================================================

/// Write `value` into `target` at `path`.
///
/// Missing intermediate objects and arrays are created. Arrays shorter than
/// the requested index are padded with `{}` placeholders, and any
/// non-container value standing in the way is replaced by the container the
/// next segment needs.
pub fn write_at_path(target: &mut Value, path: &FieldPath, value: Value) {
    write_segments(target, path.segments(), value);
}

/// Parse `path` and write through [`write_at_path`].
pub fn set_value_at(target: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    let path = FieldPath::parse(path)?;
    write_at_path(target, &path, value);
    Ok(())
}

fn write_segments(target: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    match head {
        PathSegment::Property(name) => match target {
            Value::Object(map) => {
                let slot = map.entry(name.clone()).or_insert(Value::Null);
                write_segments(slot, rest, value);
            }
            other => {
                *other = Value::Object(Map::new());
                write_segments(other, segments, value);
            }
        },
        PathSegment::Index(idx) => match target {
            Value::Array(items) => {
                while items.len() <= *idx {
                    items.push(Value::Object(Map::new()));
                }
                write_segments(&mut items[*idx], rest, value);
            }
            other => {
                *other = Value::Array(Vec::new());
                write_segments(other, segments, value);
            }
        },
    }
}

/// Read the value at `path`, if every segment exists.
pub fn lookup<'a>(source: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(source, |current, seg| match seg {
            PathSegment::Property(name) => current.get(name.as_str()),
            PathSegment::Index(idx) => current.get(*idx),
        })
}
