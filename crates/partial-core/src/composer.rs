//! Folding a tree of partials into one application tree.
//!
//! [`compose`] walks a partial and its nested partials depth first. Every
//! level mounts its children under their keys, then scopes the aggregate under
//! its own key, so a function declared `n` levels deep ends up with an
//! `n`-segment path without ever being scoped twice at the same level.

use crate::action::{scoped_actions, Action};
use crate::error::Result;
use crate::event::{scoped_events, Emitter, Handler};
use crate::partial::{Init, PartialSource};
use crate::path::Path;
use crate::registry::Registry;
use crate::tree::{EventTable, Tree};
use crate::value::{Map, Value};
use crate::view::{scoped_views, View};

/// The flattened output of one partial and everything nested inside it.
#[derive(Clone, Debug, Default)]
pub struct Composed {
    /// Absolute path of the composed partial.
    pub path: Path,
    pub state: Value,
    pub actions: Tree<Action>,
    pub events: EventTable<Handler>,
    pub views: Tree<View>,
    /// Init hooks, children before their parent.
    pub inits: Vec<Init>,
}

struct Level {
    state: Map,
    actions: Tree<Action>,
    events: EventTable<Handler>,
    views: Tree<View>,
    inits: Vec<Init>,
}

impl Level {
    fn mount(&mut self, key: &str, child: Composed) {
        self.state.insert(key.to_owned(), child.state);
        self.actions.insert_branch(key, child.actions);
        self.views.insert_branch(key, child.views);
        self.events.extend(child.events);
        self.inits.extend(child.inits);
    }
}

/// Composes `source` as the partial mounted at `parent.scope`.
///
/// The returned functions are scoped to `scope` relative to `parent`; the
/// caller folds them into its own level.
pub fn compose(scope: &str, source: &PartialSource, emit: &Emitter, parent: &Path) -> Composed {
    let path = parent.child(scope);
    let partial = source.resolve(emit);
    let mut level = Level {
        state: partial.state.clone(),
        actions: partial.actions.clone(),
        events: partial.events.clone(),
        views: partial.views.clone(),
        inits: Vec::new(),
    };
    for (key, child) in &partial.partials {
        level.mount(key, compose(key, child, emit, &path));
    }
    level.inits.extend(partial.inits.iter().cloned());
    log::debug!(
        "composed partial {path}: {} actions, {} views",
        level.actions.leaf_count(),
        level.views.leaf_count()
    );
    Composed {
        state: Value::Map(level.state),
        actions: scoped_actions(scope, &level.actions),
        events: scoped_events(scope, &level.events),
        views: scoped_views(scope, &level.views),
        inits: level.inits.iter().map(|init| init.rescope(scope)).collect(),
        path,
    }
}

/// Composes a top-level partial and registers its views under `[scope]`
/// before handing it back.
pub fn mixin(
    scope: &str,
    source: &PartialSource,
    emit: &Emitter,
    registry: &Registry,
) -> Result<Composed> {
    let composed = compose(scope, source, emit, &Path::root());
    registry.register(&composed.path, composed.views.clone())?;
    Ok(composed)
}

/// Composes the application root.
///
/// The root's own state and actions stay unscoped and come first. Handlers
/// contributed by partials run before the root's own handlers for the same
/// event, and every partial init runs before the root's.
pub fn compose_root(root: &PartialSource, emit: &Emitter, registry: &Registry) -> Result<Composed> {
    let partial = root.resolve(emit);
    if !partial.views.is_empty() {
        registry.register(&Path::root(), partial.views.clone())?;
    }
    let mut level = Level {
        state: partial.state.clone(),
        actions: partial.actions.clone(),
        events: EventTable::new(),
        views: partial.views.clone(),
        inits: Vec::new(),
    };
    for (key, child) in &partial.partials {
        level.mount(key, mixin(key, child, emit, registry)?);
    }
    level.events.extend(partial.events.clone());
    level.inits.extend(partial.inits.iter().cloned());
    log::debug!(
        "composed application root: {} partials, {} actions",
        partial.partials.len(),
        level.actions.leaf_count()
    );
    Ok(Composed {
        path: Path::root(),
        state: Value::Map(level.state),
        actions: level.actions,
        events: level.events,
        views: level.views,
        inits: level.inits,
    })
}

#[cfg(test)]
#[path = "tests/composer_tests.rs"]
mod tests;
