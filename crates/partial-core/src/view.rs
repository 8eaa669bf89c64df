use std::fmt;
use std::rc::Rc;

use crate::action::Actions;
use crate::error::Result;
use crate::path::{extract, Path};
use crate::registry::Widgets;
use crate::tree::{wrap_function_tree, Tree};
use crate::value::Value;

/// `(state, actions, widgets, props, children)` of the view's own scope.
pub type ViewFn = dyn Fn(&Value, &Actions, &Widgets, &Value, &[Value]) -> Result<Value>;

/// The application's single top-level view; sees the whole state.
pub type TopView = Rc<dyn Fn(&Value, &Actions, &Widgets) -> Result<Value>>;

#[derive(Clone)]
pub struct View {
    path: Path,
    func: Rc<ViewFn>,
}

impl View {
    pub fn new(
        func: impl Fn(&Value, &Actions, &Widgets, &Value, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            path: Path::root(),
            func: Rc::new(func),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds one enclosing scope level.
    pub fn rescope(&self, scope: &str) -> View {
        View {
            path: self.path.prepend(scope),
            func: Rc::clone(&self.func),
        }
    }

    /// Renders against the whole application; props and children pass
    /// through unchanged.
    pub fn render(
        &self,
        state: &Value,
        actions: &Actions,
        widgets: &Widgets,
        props: &Value,
        children: &[Value],
    ) -> Result<Value> {
        let slice = extract(&self.path, state)?;
        let scoped_actions = extract(&self.path, actions)?;
        let scoped_widgets = widgets.descend(&self.path);
        (self.func)(slice, scoped_actions, &scoped_widgets, props, children)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View").field("path", &self.path).finish()
    }
}

pub fn scoped_views(scope: &str, views: &Tree<View>) -> Tree<View> {
    wrap_function_tree(&|view: &View, _name: &str| view.rescope(scope), views)
}
