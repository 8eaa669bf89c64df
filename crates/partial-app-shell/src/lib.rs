//! Application host for composed partials.
//!
//! [`App`] owns the state tree, the bound action tree and the merged event
//! table produced by [`compose_root`], and implements [`Host`] so scoped
//! updaters and emitters can reach it. Deferred action results run on a
//! [`Runtime`] the app drives through [`App::flush`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use partial_core::{
    compose_root, run_handlers, wrap_function_tree, Action, Actions, BoundAction, Effect, Emitter,
    EventTable, Handler, Host, PartialError, PartialSource, Patch, Path, RegistrationPolicy,
    Registry, Result, TopView, Tree, Updater, Value, Widgets,
};
use partial_runtime_std::{Runtime, RuntimeHandle};

type RenderFn = Box<dyn Fn(&Value, &Actions) -> Result<Value>>;

/// Options used to configure an application instance.
#[derive(Debug, Clone)]
pub struct AppConfig {
    name: String,
    registration_policy: RegistrationPolicy,
    render_on_build: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "partial-app".to_string(),
            registration_policy: RegistrationPolicy::default(),
            render_on_build: true,
        }
    }
}

impl AppConfig {
    /// Sets the name used in log output.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets what happens when two partials register views at the same scope.
    pub fn with_registration_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.registration_policy = policy;
        self
    }

    /// Whether [`AppBuilder::build`] renders once after the init hooks ran.
    pub fn with_render_on_build(mut self, render: bool) -> Self {
        self.render_on_build = render;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registration_policy(&self) -> RegistrationPolicy {
        self.registration_policy
    }

    pub fn render_on_build(&self) -> bool {
        self.render_on_build
    }
}

/// Builder used to configure and construct an [`App`].
pub struct AppBuilder {
    root: PartialSource,
    view: Option<TopView>,
    config: AppConfig,
    runtime: Option<Runtime>,
}

impl AppBuilder {
    /// Sets the top-level view. It sees the whole state and action trees
    /// together with the widgets of every registered partial.
    pub fn view(
        mut self,
        view: impl Fn(&Value, &Actions, &Widgets) -> Result<Value> + 'static,
    ) -> Self {
        self.view = Some(Rc::new(view));
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs deferred work on `runtime` instead of a private one.
    pub fn runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Composes the partial tree, binds every action to the new app, runs
    /// init hooks children first and, unless disabled, renders once.
    pub fn build(self) -> Result<App> {
        let AppBuilder {
            root,
            view,
            config,
            runtime,
        } = self;
        let emitter = Emitter::new();
        let registry = Rc::new(Registry::new(config.registration_policy));
        let composed = compose_root(&root, &emitter, &registry)?;
        let render: Option<RenderFn> = view.map(|top| Box::new(registry.render(top)) as RenderFn);

        let inner = Rc::new_cyclic(|weak: &Weak<AppInner>| AppInner {
            state: RefCell::new(composed.state),
            actions: RefCell::new(bind_actions(weak, &composed.actions)),
            events: RefCell::new(composed.events),
            registry,
            render,
            runtime: runtime.unwrap_or_default(),
            needs_render: Cell::new(true),
            last_render: RefCell::new(None),
            config,
        });
        let host: Weak<dyn Host> = Rc::downgrade(&inner) as Weak<dyn Host>;
        emitter.bind(host);

        let actions = inner.actions();
        for init in &composed.inits {
            log::trace!("running init at {}", init.path());
            init.invoke(&actions)?;
        }
        log::debug!(
            "app `{}` built: {} actions, {} init hooks",
            inner.config.name,
            actions.leaf_count(),
            composed.inits.len()
        );

        let app = App { inner };
        if app.inner.config.render_on_build {
            app.inner.runtime.run_until_stalled();
            app.render()?;
        }
        Ok(app)
    }
}

impl fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppBuilder")
            .field("root", &self.root)
            .field("has_view", &self.view.is_some())
            .field("config", &self.config)
            .finish()
    }
}

fn bind_actions(app: &Weak<AppInner>, actions: &Tree<Action>) -> Actions {
    wrap_function_tree(
        &|action: &Action, name: &str| {
            let app = app.clone();
            let action = action.clone();
            let name = name.to_owned();
            Rc::new(move |data: Value| -> Result<Value> {
                let app = app.upgrade().ok_or(PartialError::HostUnavailable)?;
                app.dispatch(&action, &name, data)
            }) as BoundAction
        },
        actions,
    )
}

struct AppInner {
    state: RefCell<Value>,
    actions: RefCell<Actions>,
    events: RefCell<EventTable<Handler>>,
    registry: Rc<Registry>,
    render: Option<RenderFn>,
    runtime: Runtime,
    needs_render: Cell<bool>,
    last_render: RefCell<Option<Value>>,
    config: AppConfig,
}

impl AppInner {
    fn actions(&self) -> Actions {
        self.actions.borrow().clone()
    }

    fn updater(self: &Rc<Self>) -> Updater {
        let host: Weak<dyn Host> = Rc::downgrade(self) as Weak<dyn Host>;
        Updater::from_host(host)
    }

    fn dispatch(self: &Rc<Self>, action: &Action, name: &str, data: Value) -> Result<Value> {
        log::trace!("dispatch `{name}` at {}", action.path());
        let effect = action.invoke(&self.state(), &self.actions(), data)?;
        match effect {
            Effect::Apply { patch, returned } => {
                self.update(patch)?;
                Ok(returned)
            }
            Effect::Consume(consumer) => Ok(consumer(self.updater())),
            Effect::Defer(future) => {
                let app = Rc::downgrade(self);
                let label = format!("{}.{name}", action.path());
                let spawned = self.runtime.handle().spawn_local(async move {
                    let patch = future.await;
                    let Some(app) = app.upgrade() else {
                        log::debug!("deferred result of `{label}` dropped with its app");
                        return;
                    };
                    if let Err(err) = app.update(patch) {
                        log::error!("deferred update from `{label}` failed: {err}");
                    }
                });
                if !spawned {
                    log::warn!("could not schedule deferred result of `{name}`");
                }
                Ok(Value::Null)
            }
        }
    }

    fn render(&self) -> Result<Value> {
        // views may dispatch actions; those updates must leave the app dirty
        self.needs_render.set(false);
        let output = match &self.render {
            Some(render) => render(&self.state(), &self.actions()).map_err(|err| {
                self.needs_render.set(true);
                err
            })?,
            None => Value::Null,
        };
        *self.last_render.borrow_mut() = Some(output.clone());
        Ok(output)
    }
}

impl Host for AppInner {
    fn state(&self) -> Value {
        self.state.borrow().clone()
    }

    fn update(&self, patch: Patch) -> Result<()> {
        if patch.is_noop() {
            return Ok(());
        }
        let current = self.state();
        let next = patch.apply_to(&current)?;
        *self.state.borrow_mut() = next;
        self.needs_render.set(true);
        log::trace!("state updated in `{}`", self.config.name);
        Ok(())
    }

    fn emit(&self, name: &str, data: Value) -> Result<Value> {
        let events = self.events.borrow().clone();
        let actions = self.actions();
        log::trace!("emit `{name}`");
        run_handlers(&events, name, &|| self.state(), &actions, data)
    }
}

/// A running application built from a tree of partials.
#[derive(Clone)]
pub struct App {
    inner: Rc<AppInner>,
}

impl App {
    pub fn builder(root: impl Into<PartialSource>) -> AppBuilder {
        AppBuilder {
            root: root.into(),
            view: None,
            config: AppConfig::default(),
            runtime: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Snapshot of the whole state tree.
    pub fn state(&self) -> Value {
        self.inner.state()
    }

    /// The bound action tree, shaped like the partial tree.
    pub fn actions(&self) -> Actions {
        self.inner.actions()
    }

    /// Invokes the bound action at the dotted `path`, e.g. `"s1.s2.add"`.
    pub fn call(&self, path: &str, data: impl Into<Value>) -> Result<Value> {
        let path = Path::parse(path);
        let Some((scope, name)) = path.split_last() else {
            return Err(PartialError::UnknownAction {
                path: Path::root(),
                name: String::new(),
            });
        };
        self.actions().call_in(&scope, name, data)
    }

    /// Runs the handlers bound to `name` and returns the threaded result.
    pub fn emit(&self, name: &str, data: impl Into<Value>) -> Result<Value> {
        self.inner.emit(name, data.into())
    }

    /// Applies `patch` to the root of the state tree.
    pub fn update(&self, patch: Patch) -> Result<()> {
        self.inner.update(patch)
    }

    pub fn render(&self) -> Result<Value> {
        self.inner.render()
    }

    pub fn last_render(&self) -> Option<Value> {
        self.inner.last_render.borrow().clone()
    }

    pub fn needs_render(&self) -> bool {
        self.inner.needs_render.get()
    }

    /// Widgets over the current state, as the top view would receive them.
    pub fn widgets(&self) -> Widgets {
        self.inner
            .registry
            .widgets(self.inner.state(), self.inner.actions())
    }

    /// Drains queued runtime work, then re-renders if any update landed.
    /// Returns whether a render happened.
    pub fn flush(&self) -> Result<bool> {
        self.inner.runtime.run_until_stalled();
        if !self.inner.needs_render.get() {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// Moves the app's virtual clock forward by `delta_ms`, firing due timers,
    /// and flushes.
    pub fn advance_by(&self, delta_ms: u64) -> Result<bool> {
        self.inner.runtime.advance_by(delta_ms);
        self.flush()
    }

    pub fn runtime(&self) -> Runtime {
        self.inner.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.inner.runtime.handle()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.inner.config.name)
            .field("state", &*self.inner.state.borrow())
            .field("needs_render", &self.inner.needs_render.get())
            .field("runtime", &self.inner.runtime)
            .finish()
    }
}
