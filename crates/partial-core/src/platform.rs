//! Contract between the composition engine and the host framework.
//!
//! The engine never owns application state. It reads and writes it through a
//! host that keeps the state tree, applies patches and dispatches events.

use crate::action::Patch;
use crate::error::Result;
use crate::value::Value;

pub trait Host {
    /// The current application state.
    fn state(&self) -> Value;

    /// Applies `patch` to the root of the state tree.
    fn update(&self, patch: Patch) -> Result<()>;

    /// Runs the handler chain for `name` and returns the last non-null result,
    /// or `data` itself when nothing is registered.
    fn emit(&self, name: &str, data: Value) -> Result<Value>;
}
