//! Structural diff between two event payloads.
//!
//! Objects are matched key by key, arrays position by position. Anything
//! else (scalars, or two values of different JSON kinds) is compared as a
//! whole and reported as [`ChangeKind::Changed`] at that path.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One step into a nested payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location of a difference, outermost segment first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name of the top-level field, if the path starts with an object key.
    #[must_use]
    pub fn first_key(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }

    #[must_use]
    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

#[cfg(test)]
impl From<&str> for FieldPath {
    fn from(dotted: &str) -> Self {
        Self(
            dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(|s| PathSegment::Key(s.to_string()))
                .collect(),
        )
    }
}

/// Renders as the segments joined with `.`, e.g. `attributes.skillsNeeded.0`.
impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Kind of difference detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present only on the rewritten side.
    Added,
    /// Present only on the legacy side.
    Removed,
    /// Present on both sides with different values.
    Changed,
}

/// A single field-level difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub path: FieldPath,
    pub kind: ChangeKind,
    /// Legacy-side value (absent for `Added`).
    pub legacy: Option<Value>,
    /// Rewritten-side value (absent for `Removed`).
    pub rewritten: Option<Value>,
}

impl DiffEntry {
    #[must_use]
    pub fn added(path: FieldPath, rewritten: Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Added,
            legacy: None,
            rewritten: Some(rewritten),
        }
    }

    #[must_use]
    pub fn removed(path: FieldPath, legacy: Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Removed,
            legacy: Some(legacy),
            rewritten: None,
        }
    }

    #[must_use]
    pub fn changed(path: FieldPath, legacy: Value, rewritten: Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Changed,
            legacy: Some(legacy),
            rewritten: Some(rewritten),
        }
    }
}

/// Computes every difference between a legacy and a rewritten payload.
///
/// Entries come out depth-first: legacy keys in their order, then keys only
/// the rewritten side has.
#[must_use]
pub fn diff_values(legacy: &Value, rewritten: &Value) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    diff_recursive(&FieldPath::root(), legacy, rewritten, &mut entries);
    entries
}

fn diff_recursive(path: &FieldPath, legacy: &Value, rewritten: &Value, out: &mut Vec<DiffEntry>) {
    match (legacy, rewritten) {
        (Value::Object(lhs), Value::Object(rhs)) => {
            for (key, left) in lhs {
                let child = path.child(PathSegment::Key(key.clone()));
                match rhs.get(key) {
                    Some(right) => diff_recursive(&child, left, right, out),
                    None => out.push(DiffEntry::removed(child, left.clone())),
                }
            }
            for (key, right) in rhs {
                if !lhs.contains_key(key) {
                    let child = path.child(PathSegment::Key(key.clone()));
                    out.push(DiffEntry::added(child, right.clone()));
                }
            }
        }
        (Value::Array(lhs), Value::Array(rhs)) => {
            for index in 0..lhs.len().max(rhs.len()) {
                let child = path.child(PathSegment::Index(index));
                match (lhs.get(index), rhs.get(index)) {
                    (Some(left), Some(right)) => diff_recursive(&child, left, right, out),
                    (Some(left), None) => out.push(DiffEntry::removed(child, left.clone())),
                    (None, Some(right)) => out.push(DiffEntry::added(child, right.clone())),
                    (None, None) => {}
                }
            }
        }
        (left, right) => {
            if !scalars_equal(left, right) {
                out.push(DiffEntry::changed(path.clone(), left.clone(), right.clone()));
            }
        }
    }
}

/// Numbers compare by value so `1` and `1.0` are equal.
fn scalars_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            if let (Some(l), Some(r)) = (l.as_i64(), r.as_i64()) {
                return l == r;
            }
            if let (Some(l), Some(r)) = (l.as_u64(), r.as_u64()) {
                return l == r;
            }
            match (l.as_f64(), r.as_f64()) {
                #[allow(clippy::float_cmp)]
                (Some(l), Some(r)) => l == r,
                _ => false,
            }
        }
        _ => left == right,
    }
}
