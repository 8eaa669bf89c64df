use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::action::Actions;
use crate::error::Result;
use crate::path::{extract, Path};
use crate::platform::Host;
use crate::tree::{wrap_array_set, EventTable};
use crate::value::Value;

pub type EventFn = dyn Fn(&Value, &Actions, Value) -> Value;

/// An event handler together with the path of the slice it observes.
#[derive(Clone)]
pub struct Handler {
    path: Path,
    func: Rc<EventFn>,
}

impl Handler {
    pub fn new(func: impl Fn(&Value, &Actions, Value) -> Value + 'static) -> Self {
        Self {
            path: Path::root(),
            func: Rc::new(func),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rescope(&self, scope: &str) -> Handler {
        Handler {
            path: self.path.prepend(scope),
            func: Rc::clone(&self.func),
        }
    }

    pub fn invoke(&self, state: &Value, actions: &Actions, data: Value) -> Result<Value> {
        let slice = extract(&self.path, state)?;
        let scoped_actions = extract(&self.path, actions)?;
        Ok((self.func)(slice, scoped_actions, data))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("path", &self.path).finish()
    }
}

pub fn scoped_events(scope: &str, events: &EventTable<Handler>) -> EventTable<Handler> {
    wrap_array_set(|handler: &Handler| handler.rescope(scope), events)
}

/// Runs every handler bound to `name` in order.
///
/// Each non-null result replaces `data` for the next handler. `state` is asked
/// for a fresh snapshot before every handler so later handlers observe updates
/// made by earlier ones.
pub fn run_handlers(
    events: &EventTable<Handler>,
    name: &str,
    state: &dyn Fn() -> Value,
    actions: &Actions,
    mut data: Value,
) -> Result<Value> {
    let Some(handlers) = events.handlers(name) else {
        return Ok(data);
    };
    for handler in handlers.iter() {
        let result = handler.invoke(&state(), actions, data.clone())?;
        if !result.is_null() {
            data = result;
        }
    }
    Ok(data)
}

/// Late-bound handle to the host's `emit`, handed to partial factories.
///
/// Factories run while the application is still being built; until the host
/// binds itself, emitting returns the payload untouched.
#[derive(Clone, Default)]
pub struct Emitter {
    target: Rc<RefCell<Option<Weak<dyn Host>>>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, host: Weak<dyn Host>) {
        *self.target.borrow_mut() = Some(host);
    }

    pub fn is_bound(&self) -> bool {
        self.host().is_some()
    }

    pub fn emit(&self, name: &str, data: impl Into<Value>) -> Result<Value> {
        let data = data.into();
        match self.host() {
            Some(host) => host.emit(name, data),
            None => {
                log::debug!("event `{name}` emitted before the host was bound");
                Ok(data)
            }
        }
    }

    fn host(&self) -> Option<Rc<dyn Host>> {
        self.target.borrow().as_ref().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/event_tests.rs"]
mod tests;
