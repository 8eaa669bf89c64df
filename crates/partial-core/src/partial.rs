//! Partial declarations.
//!
//! A [`Partial`] is the unit authors write: a slice of state plus the actions,
//! event handlers, views and init hooks that work on it, and any nested
//! partials mounted under their own keys. Declarations are plain values; the
//! composer reads them and never changes them, so one declaration can be
//! mounted at several places in the same application.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::action::{Action, ActionResult, Actions};
use crate::error::Result;
use crate::event::{Emitter, Handler};
use crate::path::{extract, Path};
use crate::registry::Widgets;
use crate::tree::{EventTable, Tree};
use crate::value::{Map, Value};
use crate::view::View;

pub type InitFn = dyn Fn(&Actions);

/// Hook run once after the application is built, with the actions of the
/// partial that declared it.
#[derive(Clone)]
pub struct Init {
    path: Path,
    func: Rc<InitFn>,
}

impl Init {
    pub fn new(func: impl Fn(&Actions) + 'static) -> Self {
        Self {
            path: Path::root(),
            func: Rc::new(func),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rescope(&self, scope: &str) -> Init {
        Init {
            path: self.path.prepend(scope),
            func: Rc::clone(&self.func),
        }
    }

    pub fn invoke(&self, actions: &Actions) -> Result<()> {
        (self.func)(extract(&self.path, actions)?);
        Ok(())
    }
}

impl fmt::Debug for Init {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Init").field("path", &self.path).finish()
    }
}

pub type PartialFactory = Rc<dyn Fn(&Emitter) -> Partial>;

/// Where a nested partial comes from.
#[derive(Clone)]
pub enum PartialSource {
    Declaration(Partial),
    /// Built on demand with access to the application's emitter.
    Factory(PartialFactory),
}

impl PartialSource {
    pub fn resolve(&self, emit: &Emitter) -> Partial {
        match self {
            PartialSource::Declaration(partial) => partial.clone(),
            PartialSource::Factory(factory) => factory(emit),
        }
    }
}

impl From<Partial> for PartialSource {
    fn from(partial: Partial) -> Self {
        PartialSource::Declaration(partial)
    }
}

impl fmt::Debug for PartialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialSource::Declaration(partial) => partial.fmt(f),
            PartialSource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

#[derive(Clone, Default)]
pub struct Partial {
    pub(crate) state: Map,
    pub(crate) actions: Tree<Action>,
    pub(crate) events: EventTable<Handler>,
    pub(crate) views: Tree<View>,
    pub(crate) partials: IndexMap<String, PartialSource>,
    pub(crate) inits: Vec<Init>,
}

impl Partial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    /// Sets every key of `state` at once; non-map values are ignored.
    pub fn with_state(mut self, state: Value) -> Self {
        if let Value::Map(map) = state {
            self.state.extend(map);
        }
        self
    }

    pub fn action(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &Actions, Value) -> ActionResult + 'static,
    ) -> Self {
        self.actions.insert_leaf(name, Action::new(func));
        self
    }

    /// Adds a handler for `name` after any handlers this partial already has.
    pub fn event(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &Actions, Value) -> Value + 'static,
    ) -> Self {
        self.events.on(name, Handler::new(func));
        self
    }

    pub fn view(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &Actions, &Widgets, &Value, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        self.views.insert_leaf(name, View::new(func));
        self
    }

    pub fn partial(mut self, key: impl Into<String>, partial: impl Into<PartialSource>) -> Self {
        self.partials.insert(key.into(), partial.into());
        self
    }

    pub fn partial_factory(
        mut self,
        key: impl Into<String>,
        factory: impl Fn(&Emitter) -> Partial + 'static,
    ) -> Self {
        self.partials
            .insert(key.into(), PartialSource::Factory(Rc::new(factory)));
        self
    }

    pub fn init(mut self, func: impl Fn(&Actions) + 'static) -> Self {
        self.inits.push(Init::new(func));
        self
    }

    pub fn state_value(&self) -> Value {
        Value::Map(self.state.clone())
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys()
    }

    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.views.keys()
    }

    pub fn partial_keys(&self) -> impl Iterator<Item = &str> {
        self.partials.keys().map(String::as_str)
    }
}

impl fmt::Debug for Partial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partial")
            .field("state", &self.state)
            .field("actions", &self.actions)
            .field("events", &self.events)
            .field("views", &self.views)
            .field("partials", &self.partials)
            .field("inits", &self.inits.len())
            .finish()
    }
}
