//! Scoped actions and the updater that writes their results back.
//!
//! An action is authored against its own slice of state. [`Action`] pairs the
//! authored function with the [`Path`] of the partial it belongs to and
//! translates whatever the function returns into an [`Effect`] the host can
//! apply to the whole application state.

use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::error::{PartialError, Result};
use crate::path::{assign, extract, Path};
use crate::platform::Host;
use crate::tree::{wrap_function_tree, Tree};
use crate::value::Value;

pub type TransformFn = dyn Fn(&Value) -> Result<Value>;

/// A change to a slice of state.
#[derive(Clone)]
pub enum Patch {
    /// Shallow-merge the value into the slice.
    Merge(Value),
    /// Compute a value from the slice as it is when the patch is applied,
    /// then merge it in.
    Transform(Rc<TransformFn>),
}

impl Patch {
    pub fn transform(f: impl Fn(&Value) -> Value + 'static) -> Self {
        Patch::Transform(Rc::new(move |current: &Value| Ok(f(current))))
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Patch::Merge(Value::Null))
    }

    pub fn apply_to(&self, current: &Value) -> Result<Value> {
        match self {
            Patch::Merge(value) => Ok(current.merge(value)),
            Patch::Transform(f) => Ok(current.merge(&f(current)?)),
        }
    }

    /// Lifts a slice patch to a patch of the whole tree.
    ///
    /// The slice at `path` is looked up when the returned patch runs, so
    /// updates that were captured earlier still merge against fresh state.
    pub fn scoped(self, path: &Path) -> Patch {
        if path.is_root() || self.is_noop() {
            return self;
        }
        let path = path.clone();
        Patch::Transform(Rc::new(move |state: &Value| {
            let slice = extract(&path, state)?;
            let next = self.apply_to(slice)?;
            Ok(assign(&path, state, next)?)
        }))
    }
}

impl fmt::Debug for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Patch::Merge(value) => f.debug_tuple("Merge").field(value).finish(),
            Patch::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Write handle for one slice of state. Cheap to clone and valid for as long
/// as the host lives.
#[derive(Clone)]
pub struct Updater {
    apply: Rc<dyn Fn(Patch) -> Result<()>>,
}

impl Updater {
    pub fn new(apply: impl Fn(Patch) -> Result<()> + 'static) -> Self {
        Self {
            apply: Rc::new(apply),
        }
    }

    /// Root updater forwarding to the host's raw update primitive.
    pub fn from_host(host: Weak<dyn Host>) -> Self {
        Self::new(move |patch| {
            host.upgrade()
                .ok_or(PartialError::HostUnavailable)?
                .update(patch)
        })
    }

    pub fn apply(&self, patch: Patch) -> Result<()> {
        (self.apply)(patch)
    }

    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        self.apply(Patch::Merge(value.into()))
    }

    pub fn transform(&self, f: impl Fn(&Value) -> Value + 'static) -> Result<()> {
        self.apply(Patch::transform(f))
    }

    /// Updater for the slice at `path` relative to this one.
    pub fn scoped(&self, path: &Path) -> Updater {
        if path.is_root() {
            return self.clone();
        }
        let inner = self.clone();
        let path = path.clone();
        Updater::new(move |patch| inner.apply(patch.scoped(&path)))
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater").finish_non_exhaustive()
    }
}

pub type Consumer = Box<dyn FnOnce(Updater) -> Value>;

/// What an authored action hands back.
pub enum ActionResult {
    /// New partial state for the slice, merged in right away.
    Value(Value),
    /// Receives the slice's updater and may call it now, later, or many times.
    Updater(Consumer),
    /// Resolves to a patch for the slice at some later point.
    Deferred(LocalBoxFuture<'static, Patch>),
}

impl ActionResult {
    pub fn none() -> Self {
        ActionResult::Value(Value::Null)
    }

    pub fn updater(consumer: impl FnOnce(Updater) -> Value + 'static) -> Self {
        ActionResult::Updater(Box::new(consumer))
    }

    pub fn deferred(future: impl Future<Output = Value> + 'static) -> Self {
        ActionResult::Deferred(future.map(Patch::Merge).boxed_local())
    }

    /// Rewrites this result so it only ever touches the slice at `path`.
    pub fn scoped(self, path: &Path) -> Effect {
        match self {
            ActionResult::Value(value) => Effect::Apply {
                patch: Patch::Merge(value.clone()).scoped(path),
                returned: value,
            },
            ActionResult::Updater(consumer) => {
                let path = path.clone();
                Effect::Consume(Box::new(move |updater: Updater| consumer(updater.scoped(&path))))
            }
            ActionResult::Deferred(future) => {
                let path = path.clone();
                Effect::Defer(future.map(move |patch| patch.scoped(&path)).boxed_local())
            }
        }
    }
}

impl From<Value> for ActionResult {
    fn from(value: Value) -> Self {
        ActionResult::Value(value)
    }
}

impl fmt::Debug for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ActionResult::Updater(_) => f.write_str("Updater(..)"),
            ActionResult::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// An action result expressed against the whole application state.
pub enum Effect {
    Apply { patch: Patch, returned: Value },
    Consume(Consumer),
    Defer(LocalBoxFuture<'static, Patch>),
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Apply { patch, returned } => f
                .debug_struct("Apply")
                .field("patch", patch)
                .field("returned", returned)
                .finish(),
            Effect::Consume(_) => f.write_str("Consume(..)"),
            Effect::Defer(_) => f.write_str("Defer(..)"),
        }
    }
}

/// A callable bound to the host: dispatches the action it was built from.
pub type BoundAction = Rc<dyn Fn(Value) -> Result<Value>>;

/// The callable action tree handed to actions, events, views and inits.
pub type Actions = Tree<BoundAction>;

impl Tree<BoundAction> {
    pub fn call(&self, name: &str, data: impl Into<Value>) -> Result<Value> {
        let action = self
            .leaf(name)
            .ok_or_else(|| PartialError::UnknownAction {
                path: Path::root(),
                name: name.to_owned(),
            })?;
        action(data.into())
    }

    /// Calls the action at `scope` (relative to this tree) named `name`.
    pub fn call_in(&self, scope: &Path, name: &str, data: impl Into<Value>) -> Result<Value> {
        let actions = extract(scope, self)?;
        let action = actions
            .leaf(name)
            .ok_or_else(|| PartialError::UnknownAction {
                path: scope.clone(),
                name: name.to_owned(),
            })?;
        action(data.into())
    }
}

pub type ActionFn = dyn Fn(&Value, &Actions, Value) -> ActionResult;

/// An authored action together with the path of the slice it owns.
#[derive(Clone)]
pub struct Action {
    path: Path,
    func: Rc<ActionFn>,
}

impl Action {
    pub fn new(func: impl Fn(&Value, &Actions, Value) -> ActionResult + 'static) -> Self {
        Self {
            path: Path::root(),
            func: Rc::new(func),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The same action as seen from the parent scope `scope`.
    pub fn rescope(&self, scope: &str) -> Action {
        Action {
            path: self.path.prepend(scope),
            func: Rc::clone(&self.func),
        }
    }

    /// Runs the action against the whole application `state` and `actions`.
    pub fn invoke(&self, state: &Value, actions: &Actions, data: Value) -> Result<Effect> {
        let slice = extract(&self.path, state)?;
        let scoped_actions = extract(&self.path, actions)?;
        log::trace!("action at {} invoked", self.path);
        Ok((self.func)(slice, scoped_actions, data).scoped(&self.path))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("path", &self.path).finish()
    }
}

/// Scopes every action of `actions` under `scope`.
pub fn scoped_actions(scope: &str, actions: &Tree<Action>) -> Tree<Action> {
    wrap_function_tree(&|action: &Action, _name: &str| action.rescope(scope), actions)
}

#[cfg(test)]
#[path = "tests/action_tests.rs"]
mod tests;
