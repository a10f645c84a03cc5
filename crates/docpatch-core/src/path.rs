//! Key paths into a value tree.

use crate::error::{DocError, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A segment in a key path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array index.
    Index(usize),
    /// Object key.
    Key(String),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{}", k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A path into a value tree, root first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath(Vec<PathSegment>);

impl KeyPath {
    /// The empty (root) path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Split into (parent segments, last segment) without touching `self`.
    pub fn split_last(&self) -> (&[PathSegment], Option<&PathSegment>) {
        match self.0.split_last() {
            Some((last, parent)) => (parent, Some(last)),
            None => (&[], None),
        }
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Copy of this path with one more segment.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut new = self.clone();
        new.push(segment);
        new
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

fn render(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

/// Look up one string segment on a container value.
///
/// Arrays take base-10 indices; every other kind has no children.
pub fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Map(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

pub fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Map(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Walk `key_path` left to right from `root`.
///
/// The path is only borrowed, so the same slice may be resolved any number
/// of times.
pub fn resolve_sub_value<'a>(root: &'a Value, key_path: &[String]) -> Result<&'a Value> {
    let mut current = root;
    for (depth, segment) in key_path.iter().enumerate() {
        current = child(current, segment)
            .ok_or_else(|| DocError::PathNotFound(render(&key_path[..=depth])))?;
    }
    Ok(current)
}

pub fn resolve_sub_value_mut<'a>(
    root: &'a mut Value,
    key_path: &[String],
) -> Result<&'a mut Value> {
    let mut current = root;
    for (depth, segment) in key_path.iter().enumerate() {
        current = child_mut(current, segment)
            .ok_or_else(|| DocError::PathNotFound(render(&key_path[..=depth])))?;
    }
    Ok(current)
}
