//! Ordered trees of functions and the event-set shape.
//!
//! Action, view and widget tables are all [`Tree`]s: a key maps either to a
//! leaf function or to the tree of a nested scope. Event tables are flat and
//! map a name to one handler or an ordered run of handlers.

use std::fmt;

use indexmap::IndexMap;

#[derive(Clone)]
pub enum Node<T> {
    Leaf(T),
    Branch(Tree<T>),
}

#[derive(Clone)]
pub struct Tree<T> {
    nodes: IndexMap<String, Node<T>>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Binds `key`, replacing whatever was there before.
    pub fn insert(&mut self, key: impl Into<String>, node: Node<T>) -> Option<Node<T>> {
        self.nodes.insert(key.into(), node)
    }

    pub fn insert_leaf(&mut self, key: impl Into<String>, leaf: T) {
        self.nodes.insert(key.into(), Node::Leaf(leaf));
    }

    pub fn insert_branch(&mut self, key: impl Into<String>, branch: Tree<T>) {
        self.nodes.insert(key.into(), Node::Branch(branch));
    }

    pub fn get(&self, key: &str) -> Option<&Node<T>> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn leaf(&self, key: &str) -> Option<&T> {
        match self.nodes.get(key) {
            Some(Node::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    pub fn branch(&self, key: &str) -> Option<&Tree<T>> {
        match self.nodes.get(key) {
            Some(Node::Branch(branch)) => Some(branch),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node<T>)> {
        self.nodes.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Number of leaves across every nested scope.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .values()
            .map(|node| match node {
                Node::Leaf(_) => 1,
                Node::Branch(branch) => branch.leaf_count(),
            })
            .sum()
    }
}

impl<T> FromIterator<(String, Node<T>)> for Tree<T> {
    fn from_iter<I: IntoIterator<Item = (String, Node<T>)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Tree<T> {
    type Item = (String, Node<T>);
    type IntoIter = indexmap::map::IntoIter<String, Node<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<T> fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, node) in &self.nodes {
            match node {
                Node::Leaf(_) => map.entry(key, &"<fn>"),
                Node::Branch(branch) => map.entry(key, branch),
            };
        }
        map.finish()
    }
}

/// Rebuilds `tree` with every leaf replaced by `wrapper(leaf, key)`.
///
/// Nested scopes are walked recursively; `tree` itself is left untouched.
pub fn wrap_function_tree<T, U>(wrapper: &impl Fn(&T, &str) -> U, tree: &Tree<T>) -> Tree<U> {
    tree.nodes
        .iter()
        .map(|(key, node)| {
            let wrapped = match node {
                Node::Leaf(leaf) => Node::Leaf(wrapper(leaf, key)),
                Node::Branch(branch) => Node::Branch(wrap_function_tree(wrapper, branch)),
            };
            (key.clone(), wrapped)
        })
        .collect()
}

#[derive(Clone)]
pub enum Handlers<H> {
    One(H),
    Many(Vec<H>),
}

impl<H> Handlers<H> {
    pub fn len(&self) -> usize {
        match self {
            Handlers::One(_) => 1,
            Handlers::Many(handlers) => handlers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, H> {
        match self {
            Handlers::One(handler) => std::slice::from_ref(handler).iter(),
            Handlers::Many(handlers) => handlers.iter(),
        }
    }

    fn into_vec(self) -> Vec<H> {
        match self {
            Handlers::One(handler) => vec![handler],
            Handlers::Many(handlers) => handlers,
        }
    }

    fn map<G>(&self, wrapper: impl Fn(&H) -> G) -> Handlers<G> {
        match self {
            Handlers::One(handler) => Handlers::One(wrapper(handler)),
            Handlers::Many(handlers) => Handlers::Many(handlers.iter().map(wrapper).collect()),
        }
    }
}

/// Event name to handler table.
#[derive(Clone)]
pub struct EventTable<H> {
    events: IndexMap<String, Handlers<H>>,
}

impl<H> Default for EventTable<H> {
    fn default() -> Self {
        Self {
            events: IndexMap::new(),
        }
    }
}

impl<H> EventTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Binds `name` to exactly `handlers`, dropping earlier ones.
    pub fn set(&mut self, name: impl Into<String>, handlers: Handlers<H>) {
        self.events.insert(name.into(), handlers);
    }

    /// Appends `handler` after any handlers already bound to `name`.
    pub fn on(&mut self, name: impl Into<String>, handler: H) {
        self.append(name.into(), Handlers::One(handler));
    }

    /// Concatenates `other` onto `self`, name by name.
    ///
    /// Handlers of `self` keep their positions and run first.
    pub fn extend(&mut self, other: EventTable<H>) {
        for (name, handlers) in other.events {
            self.append(name, handlers);
        }
    }

    fn append(&mut self, name: String, handlers: Handlers<H>) {
        match self.events.get_mut(&name) {
            None => {
                self.events.insert(name, handlers);
            }
            Some(existing) => {
                let mut merged = std::mem::replace(existing, Handlers::Many(Vec::new())).into_vec();
                merged.extend(handlers.into_vec());
                *existing = Handlers::Many(merged);
            }
        }
    }

    pub fn handlers(&self, name: &str) -> Option<&Handlers<H>> {
        self.events.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }
}

impl<H> fmt::Debug for EventTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.events.iter().map(|(name, handlers)| (name, handlers.len())))
            .finish()
    }
}

/// Replaces every handler of `set` with `wrapper(handler)`, keeping the
/// single-versus-sequence shape of each entry.
pub fn wrap_array_set<H, G>(wrapper: impl Fn(&H) -> G, set: &EventTable<H>) -> EventTable<G> {
    EventTable {
        events: set
            .events
            .iter()
            .map(|(name, handlers)| (name.clone(), handlers.map(&wrapper)))
            .collect(),
    }
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
