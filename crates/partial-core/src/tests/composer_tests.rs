use super::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::action::{ActionResult, Actions, BoundAction};
use crate::event::run_handlers;
use crate::partial::Partial;
use crate::path::extract;
use crate::registry::RegistrationPolicy;
use crate::tree::wrap_function_tree;

fn bind_noop(actions: &Tree<Action>) -> Actions {
    wrap_function_tree(
        &|_: &Action, name: &str| {
            let name = name.to_owned();
            Rc::new(move |_: Value| -> Result<Value> { Ok(Value::from(name.clone())) }) as BoundAction
        },
        actions,
    )
}

fn noop(_: &Value, _: &Actions, _: Value) -> ActionResult {
    ActionResult::none()
}

fn counter() -> Partial {
    Partial::new()
        .state("count", 0)
        .action("up", noop)
        .view("show", |state, _, _, _, _| Ok(state.get("count").cloned().unwrap_or_default()))
}

#[test]
fn same_declaration_mounts_at_two_paths() {
    let registry = Registry::new(RegistrationPolicy::Reject);
    let root = Partial::new()
        .state("title", "two counters")
        .partial("left", counter())
        .partial("right", counter());
    let app = compose_root(&root.into(), &Emitter::new(), &registry).unwrap();

    assert_eq!(app.state.keys(), vec!["title", "left", "right"]);
    assert_eq!(
        extract(&Path::parse("left.count"), &app.state),
        Ok(&Value::Int(0))
    );
    let left = app.actions.branch("left").unwrap().leaf("up").unwrap();
    let right = app.actions.branch("right").unwrap().leaf("up").unwrap();
    assert_eq!(left.path(), &Path::parse("left"));
    assert_eq!(right.path(), &Path::parse("right"));
    assert!(registry.is_registered(&Path::parse("left")));
    assert!(registry.is_registered(&Path::parse("right")));
}

#[test]
fn three_levels_compose_a_three_segment_path() {
    let s2 = Partial::new().state("key", "v").action("a", noop);
    let s1 = Partial::new().partial("s2", s2);
    let root = Partial::new().partial("s1", s1);
    let app = compose_root(&root.into(), &Emitter::new(), &Registry::new(RegistrationPolicy::Reject)).unwrap();

    let action = app
        .actions
        .branch("s1")
        .and_then(|s1| s1.branch("s2"))
        .and_then(|s2| s2.leaf("a"))
        .unwrap();
    assert_eq!(action.path(), &Path::parse("s1.s2"));
    assert_eq!(
        extract(&Path::parse("s1.s2.key"), &app.state),
        Ok(&Value::from("v"))
    );
}

#[test]
fn nested_compose_reports_absolute_path() {
    let leaf = Partial::new().action("a", noop);
    let composed = compose("inner", &leaf.into(), &Emitter::new(), &Path::parse("outer"));
    assert_eq!(composed.path, Path::parse("outer.inner"));
    // functions are scoped relative to the parent only
    assert_eq!(composed.actions.leaf("a").unwrap().path(), &Path::parse("inner"));
}

#[test]
fn partial_events_run_before_root_events() {
    let child = Partial::new().event("aaa", |_, _, data| {
        Value::from(format!("{}D", data.as_str().unwrap_or("")))
    });
    let root = Partial::new()
        .event("aaa", |_, _, data| {
            Value::from(format!("{}A", data.as_str().unwrap_or("")))
        })
        .partial("child", child);
    let app = compose_root(&root.into(), &Emitter::new(), &Registry::new(RegistrationPolicy::Reject)).unwrap();

    let state = app.state.clone();
    let actions = bind_noop(&app.actions);
    let result = run_handlers(&app.events, "aaa", &|| state.clone(), &actions, Value::from("X")).unwrap();
    assert_eq!(result, Value::from("XDA"));
}

#[test]
fn partial_own_handlers_precede_nested_ones() {
    let tag = |suffix: &'static str| {
        move |_: &Value, _: &Actions, data: Value| {
            Value::from(format!("{}{suffix}", data.as_str().unwrap_or("")))
        }
    };
    let inner = Partial::new().event("e", tag("i"));
    let outer = Partial::new().event("e", tag("o")).partial("inner", inner);
    let composed = compose("outer", &outer.into(), &Emitter::new(), &Path::root());

    let paths: Vec<String> = composed
        .events
        .handlers("e")
        .unwrap()
        .iter()
        .map(|handler| handler.path().to_string())
        .collect();
    assert_eq!(paths, vec!["outer", "outer.inner"]);
}

#[test]
fn inits_run_children_first_with_scoped_actions() {
    let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
    let record = |seen: &Rc<RefCell<Vec<Vec<String>>>>| {
        let seen = Rc::clone(seen);
        move |actions: &Actions| {
            seen.borrow_mut()
                .push(actions.keys().map(str::to_owned).collect());
        }
    };

    let c = Partial::new().action("baz", noop).init(record(&seen));
    let a = Partial::new().action("bar", noop).partial("c", c);
    let b = Partial::new()
        .action("qux", noop)
        .action("zap", noop)
        .init(record(&seen));
    let root = Partial::new()
        .action("foo", noop)
        .partial("a", a)
        .partial("b", b)
        .init(record(&seen));

    let app = compose_root(&root.into(), &Emitter::new(), &Registry::new(RegistrationPolicy::Reject)).unwrap();
    let paths: Vec<String> = app.inits.iter().map(|init| init.path().to_string()).collect();
    assert_eq!(paths, vec!["a.c", "b", "<root>"]);

    let actions = bind_noop(&app.actions);
    for init in &app.inits {
        init.invoke(&actions).unwrap();
    }
    assert_eq!(
        *seen.borrow(),
        vec![
            vec!["baz".to_owned()],
            vec!["qux".to_owned(), "zap".to_owned()],
            vec!["foo".to_owned(), "a".to_owned(), "b".to_owned()],
        ]
    );
}

#[test]
fn factories_receive_the_emitter() {
    let emit = Emitter::new();
    let built = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&built);
    let root = Partial::new().partial_factory("lazy", move |emit: &Emitter| {
        *counter.borrow_mut() += 1;
        Partial::new().state("ready", emit.is_bound())
    });
    let app = compose_root(&root.into(), &emit, &Registry::new(RegistrationPolicy::Reject)).unwrap();
    assert_eq!(*built.borrow(), 1);
    assert_eq!(
        extract(&Path::parse("lazy.ready"), &app.state),
        Ok(&Value::Bool(false))
    );
}

#[test]
fn mixin_registers_nested_views_under_scope() {
    let registry = Registry::new(RegistrationPolicy::Reject);
    let outer = Partial::new()
        .view("frame", |_, _, _, _, _| Ok(Value::Null))
        .partial("inner", counter());
    let composed = mixin("outer", &outer.into(), &Emitter::new(), &registry).unwrap();

    assert_eq!(composed.path, Path::parse("outer"));
    let views = registry.views();
    let outer_views = views.branch("outer").unwrap();
    assert_eq!(outer_views.leaf("frame").unwrap().path(), &Path::parse("outer"));
    let show = outer_views.branch("inner").unwrap().leaf("show").unwrap();
    assert_eq!(show.path(), &Path::parse("outer.inner"));

    assert!(matches!(
        mixin("outer", &Partial::new().into(), &Emitter::new(), &registry),
        Err(crate::error::PartialError::DuplicateRegistration { .. })
    ));
}

#[test]
fn declarations_are_not_changed_by_composition() {
    let declaration = counter();
    let before = format!("{declaration:?}");
    let root = Partial::new().partial("a", declaration.clone());
    compose_root(&root.into(), &Emitter::new(), &Registry::new(RegistrationPolicy::Reject)).unwrap();
    assert_eq!(format!("{declaration:?}"), before);
    assert_eq!(declaration.action_names().collect::<Vec<_>>(), vec!["up"]);
}
