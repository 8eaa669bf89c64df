//! Addressing values inside nested trees.
//!
//! A [`Path`] is the ordered list of scope keys from the application root to a
//! partial's slice. Paths are immutable: scoping a function under one more
//! ancestor builds a new, longer path and leaves the old one untouched.

use std::fmt;
use std::rc::Rc;

use crate::error::AddressError;
use crate::tree::{Node, Tree};
use crate::value::{Map, Value};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Rc<[String]>,
}

impl Path {
    pub fn root() -> Self {
        Self {
            segments: Rc::from(Vec::new()),
        }
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a dotted path such as `a.b.c`; the empty string is the root.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        Self::new(dotted.split('.'))
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Path of a child scope nested under this one.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.to_vec();
        segments.push(key.to_owned());
        Self {
            segments: segments.into(),
        }
    }

    /// Path seen from an enclosing scope: `scope` becomes the first segment.
    pub fn prepend(&self, scope: &str) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(scope.to_owned());
        segments.extend(self.segments.iter().cloned());
        Self {
            segments: segments.into(),
        }
    }

    /// Concatenation of `self` followed by `other`.
    pub fn join(&self, other: &Path) -> Self {
        if other.is_root() {
            return self.clone();
        }
        if self.is_root() {
            return other.clone();
        }
        Self::new(self.segments.iter().chain(other.segments.iter()).cloned())
    }

    /// The enclosing path and the last key, unless this is the root.
    pub fn split_last(&self) -> Option<(Path, &str)> {
        self.segments
            .split_last()
            .map(|(last, rest)| (Path::new(rest.iter().cloned()), last.as_str()))
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("<root>");
        }
        f.write_str(&self.segments.join("."))
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

/// A tree whose interior nodes can be addressed by key.
pub trait Addressable: Clone {
    fn child(&self, key: &str) -> Option<&Self>;

    /// Copy of `self` with `key` bound to `child`.
    fn with_child(&self, key: &str, child: Self) -> Self;

    fn empty() -> Self;

    /// Whether keys can be bound on this node. Missing and null entries count
    /// as empty scopes.
    fn is_scope(&self) -> bool {
        true
    }
}

impl Addressable for Value {
    fn child(&self, key: &str) -> Option<&Self> {
        self.get(key)
    }

    fn with_child(&self, key: &str, child: Self) -> Self {
        let mut map = self.as_map().cloned().unwrap_or_default();
        map.insert(key.to_owned(), child);
        Value::Map(map)
    }

    fn empty() -> Self {
        Value::Map(Map::new())
    }

    fn is_scope(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Null)
    }
}

impl<T: Clone> Addressable for Tree<T> {
    fn child(&self, key: &str) -> Option<&Self> {
        self.branch(key)
    }

    fn with_child(&self, key: &str, child: Self) -> Self {
        let mut tree = self.clone();
        tree.insert(key, Node::Branch(child));
        tree
    }

    fn empty() -> Self {
        Tree::new()
    }
}

/// Follows `path` from the root of `tree`.
pub fn extract<'a, T: Addressable>(path: &Path, tree: &'a T) -> Result<&'a T, AddressError> {
    let mut cursor = tree;
    for key in path.segments() {
        cursor = cursor.child(key).ok_or_else(|| AddressError::Missing {
            path: path.clone(),
            key: key.clone(),
        })?;
    }
    Ok(cursor)
}

/// Returns a copy of `tree` holding `value` at `path`.
///
/// Missing intermediate scopes are created empty. Walking through an entry
/// that holds a plain value fails with [`AddressError::NotAScope`] instead of
/// discarding it.
pub fn assign<T: Addressable>(path: &Path, tree: &T, value: T) -> Result<T, AddressError> {
    assign_from(path, 0, tree, value)
}

fn assign_from<T: Addressable>(
    path: &Path,
    depth: usize,
    tree: &T,
    value: T,
) -> Result<T, AddressError> {
    let segments = path.segments();
    let key = segments.get(depth).ok_or(AddressError::EmptyPath)?;
    if !tree.is_scope() {
        return Err(AddressError::NotAScope {
            path: path.clone(),
            at: Path::new(segments[..depth].iter().cloned()),
        });
    }
    if depth + 1 == segments.len() {
        return Ok(tree.with_child(key, value));
    }
    let child = tree.child(key).cloned().unwrap_or_else(T::empty);
    Ok(tree.with_child(key, assign_from(path, depth + 1, &child, value)?))
}

#[cfg(test)]
#[path = "tests/path_tests.rs"]
mod tests;
