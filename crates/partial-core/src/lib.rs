#![doc = r"Scoping and composition engine for partial state-action-view modules."]
//!
//! A [`Partial`] declares a slice of state together with the actions, event
//! handlers and views that work on it. [`compose_root`] mounts a tree of
//! partials into one application: each partial's state lands under its scope
//! key, its functions are rewritten to see only that slice, and its views are
//! registered so any view can call any other through [`Widgets`].
//!
//! The engine does not own state. A [`Host`] keeps the state tree, applies
//! [`Patch`]es and dispatches events; `partial-app-shell` provides one.

pub mod action;
pub mod composer;
pub mod error;
pub mod event;
pub mod partial;
pub mod path;
pub mod platform;
pub mod registry;
pub mod tree;
pub mod value;
pub mod view;

pub use action::{
    scoped_actions, Action, ActionResult, Actions, BoundAction, Effect, Patch, Updater,
};
pub use composer::{compose, compose_root, mixin, Composed};
pub use error::{AddressError, PartialError, Result};
pub use event::{run_handlers, scoped_events, Emitter, Handler};
pub use partial::{Init, Partial, PartialSource};
pub use path::{assign, extract, Addressable, Path};
pub use platform::Host;
pub use registry::{RegistrationPolicy, Registry, Widgets};
pub use tree::{wrap_array_set, wrap_function_tree, EventTable, Handlers, Node, Tree};
pub use value::{Map, Value};
pub use view::{scoped_views, TopView, View};
