//! Per-application view registry and render-time dispatch.
//!
//! Each top-level partial registers its (already scoped) view tree here while
//! the application is being built. At render time the registry hands the top
//! view a [`Widgets`] handle mirroring the registered scopes, through which any
//! view can call any other view by scope and name.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::action::Actions;
use crate::error::{PartialError, Result};
use crate::path::{assign, extract, Path};
use crate::tree::{Node, Tree};
use crate::value::Value;
use crate::view::{TopView, View};

/// What happens when a scope registers views a second time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegistrationPolicy {
    /// Fail with [`PartialError::DuplicateRegistration`].
    #[default]
    Reject,
    /// Last registration wins.
    Replace,
}

/// Internal events between the composer, the render wrapper and the registry.
pub(crate) enum CoreEvent<'a> {
    Register {
        path: &'a Path,
        views: Tree<View>,
    },
    Dispatch {
        frame: &'a Rc<Frame>,
        view: &'a View,
        props: &'a Value,
        children: &'a [Value],
    },
}

pub struct Registry {
    views: RefCell<Tree<View>>,
    policy: RegistrationPolicy,
}

impl Registry {
    pub fn new(policy: RegistrationPolicy) -> Self {
        Self {
            views: RefCell::new(Tree::new()),
            policy,
        }
    }

    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Records `views` under `path`.
    pub fn register(&self, path: &Path, views: Tree<View>) -> Result<()> {
        self.handle(CoreEvent::Register { path, views }).map(|_| ())
    }

    pub fn is_registered(&self, path: &Path) -> bool {
        path.is_root() || occupied(&self.views.borrow(), path)
    }

    /// Snapshot of everything registered so far.
    pub fn views(&self) -> Tree<View> {
        self.views.borrow().clone()
    }

    /// Widgets for one render pass over `state` and `actions`.
    pub fn widgets(self: &Rc<Self>, state: Value, actions: Actions) -> Widgets {
        let frame = Rc::new(Frame {
            state,
            actions,
            views: self.views(),
            registry: Rc::clone(self),
        });
        Widgets {
            frame,
            path: Path::root(),
        }
    }

    /// Wraps `top` into the host's view callback: the live state and actions
    /// go in, and the top view additionally receives the widget tree.
    pub fn render(self: &Rc<Self>, top: TopView) -> impl Fn(&Value, &Actions) -> Result<Value> {
        let registry = Rc::clone(self);
        move |state: &Value, actions: &Actions| {
            let widgets = registry.widgets(state.clone(), actions.clone());
            top(state, actions, &widgets)
        }
    }

    pub(crate) fn handle(&self, event: CoreEvent<'_>) -> Result<Value> {
        match event {
            CoreEvent::Register { path, views } => {
                self.store(path, views)?;
                Ok(Value::Null)
            }
            CoreEvent::Dispatch {
                frame,
                view,
                props,
                children,
            } => {
                let widgets = Widgets {
                    frame: Rc::clone(frame),
                    path: Path::root(),
                };
                view.render(&frame.state, &frame.actions, &widgets, props, children)
            }
        }
    }

    fn store(&self, path: &Path, views: Tree<View>) -> Result<()> {
        let mut registered = self.views.borrow_mut();
        let count = views.leaf_count();
        if path.is_root() {
            if self.policy == RegistrationPolicy::Reject {
                if let Some(name) = views.keys().find(|name| registered.contains(name)) {
                    return Err(PartialError::DuplicateRegistration {
                        path: path.child(name),
                    });
                }
            }
            for (name, node) in views {
                registered.insert(name, node);
            }
        } else {
            if occupied(&registered, path) {
                if self.policy == RegistrationPolicy::Reject {
                    return Err(PartialError::DuplicateRegistration { path: path.clone() });
                }
                log::warn!("replacing views registered at {path}");
            }
            *registered = assign(path, &*registered, views)?;
        }
        log::debug!("registered {count} views at {path}");
        Ok(())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("views", &*self.views.borrow())
            .field("policy", &self.policy)
            .finish()
    }
}

fn occupied(views: &Tree<View>, path: &Path) -> bool {
    match path.split_last() {
        Some((parent, key)) => extract(&parent, views)
            .map(|scope| scope.contains(key))
            .unwrap_or(false),
        None => !views.is_empty(),
    }
}

pub(crate) struct Frame {
    state: Value,
    actions: Actions,
    views: Tree<View>,
    registry: Rc<Registry>,
}

/// Render-time handle to registered views, positioned at one scope.
#[derive(Clone)]
pub struct Widgets {
    frame: Rc<Frame>,
    path: Path,
}

impl Widgets {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Widgets of the child scope `key`.
    pub fn scope(&self, key: &str) -> Widgets {
        Widgets {
            frame: Rc::clone(&self.frame),
            path: self.path.child(key),
        }
    }

    pub fn descend(&self, path: &Path) -> Widgets {
        Widgets {
            frame: Rc::clone(&self.frame),
            path: self.path.join(path),
        }
    }

    /// View names registered directly at this scope.
    pub fn names(&self) -> Vec<String> {
        self.entries(|node| matches!(node, Node::Leaf(_)))
    }

    /// Child scopes that have views registered.
    pub fn scopes(&self) -> Vec<String> {
        self.entries(|node| matches!(node, Node::Branch(_)))
    }

    /// Renders the view `name` of this scope with the frame's state and
    /// actions, returning whatever the view returns.
    pub fn call(&self, name: &str, props: impl Into<Value>, children: &[Value]) -> Result<Value> {
        let view = extract(&self.path, &self.frame.views)
            .ok()
            .and_then(|views| views.leaf(name))
            .cloned()
            .ok_or_else(|| PartialError::UnknownView {
                path: self.path.clone(),
                name: name.to_owned(),
            })?;
        let props = props.into();
        self.frame.registry.handle(CoreEvent::Dispatch {
            frame: &self.frame,
            view: &view,
            props: &props,
            children,
        })
    }

    fn entries(&self, keep: impl Fn(&Node<View>) -> bool) -> Vec<String> {
        extract(&self.path, &self.frame.views)
            .map(|views| {
                views
                    .iter()
                    .filter(|(_, node)| keep(node))
                    .map(|(key, _)| key.to_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Debug for Widgets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widgets").field("path", &self.path).finish()
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
