use partial_app_shell::{App, AppConfig};
use partial_core::{ActionResult, Partial, PartialError, Path, RegistrationPolicy, Value};

fn list(values: &[Value]) -> Value {
    Value::from(values.to_vec())
}

fn nested_partials() -> Partial {
    let s2 = Partial::new()
        .state("label", "deep")
        .view("badge", |state, _, _, props, children| {
            Ok(list(&[
                state.get("label").cloned().unwrap_or_default(),
                props.clone(),
                Value::from(children.len() as i64),
            ]))
        });
    let s1 = Partial::new()
        .state("title", "outer")
        .view("heading", |state, _, _, _, _| {
            Ok(state.get("title").cloned().unwrap_or_default())
        })
        .view("card", |_, _, widgets, props, _| {
            let heading = widgets.call("heading", Value::Null, &[])?;
            let badge = widgets.scope("s2").call("badge", props.clone(), &[])?;
            Ok(list(&[heading, badge]))
        })
        .partial("s2", s2);
    Partial::new().partial("s1", s1)
}

#[test]
fn views_call_siblings_and_children_synchronously() {
    let app = App::builder(nested_partials())
        .view(|_, _, widgets| widgets.scope("s1").call("card", "bold", &[]))
        .build()
        .unwrap();

    let rendered = app.last_render().unwrap();
    assert_eq!(
        rendered,
        list(&[
            Value::from("outer"),
            list(&[Value::from("deep"), Value::from("bold"), Value::Int(0)]),
        ])
    );
}

#[test]
fn props_and_children_are_optional() {
    let app = App::builder(nested_partials()).build().unwrap();
    let badge = app.widgets().descend(&Path::parse("s1.s2"));

    assert_eq!(
        badge.call("badge", Value::Null, &[]).unwrap(),
        list(&[Value::from("deep"), Value::Null, Value::Int(0)])
    );
    let props: Value = [("size", 2)].into_iter().collect();
    assert_eq!(
        badge.call("badge", props.clone(), &[]).unwrap(),
        list(&[Value::from("deep"), props.clone(), Value::Int(0)])
    );
    let children = [Value::from("a"), Value::from("b"), Value::from("c")];
    assert_eq!(
        badge.call("badge", props.clone(), &children).unwrap(),
        list(&[Value::from("deep"), props, Value::Int(3)])
    );
}

#[test]
fn render_reflects_updates_after_flush() {
    let counter = Partial::new()
        .state("count", 0)
        .action("inc", |state, _, _| {
            let count = state.get("count").and_then(Value::as_int).unwrap_or(0);
            [("count", count + 1)].into_iter().collect::<Value>().into()
        })
        .view("show", |state, _, _, _, _| {
            Ok(Value::from(format!(
                "count={}",
                state.get("count").cloned().unwrap_or_default()
            )))
        });
    let app = App::builder(Partial::new().partial("counter", counter))
        .view(|_, _, widgets| widgets.scope("counter").call("show", Value::Null, &[]))
        .build()
        .unwrap();
    assert_eq!(app.last_render(), Some(Value::from("count=0")));

    app.call("counter.inc", Value::Null).unwrap();
    app.call("counter.inc", Value::Null).unwrap();
    assert!(app.needs_render());
    assert_eq!(app.last_render(), Some(Value::from("count=0")));

    assert!(app.flush().unwrap());
    assert_eq!(app.last_render(), Some(Value::from("count=2")));
}

#[test]
fn views_can_dispatch_their_own_actions() {
    let toggle = Partial::new()
        .state("on", false)
        .action("flip", |state, _, _| {
            let on = state.get("on").and_then(Value::as_bool).unwrap_or(false);
            [("on", !on)].into_iter().collect::<Value>().into()
        })
        .view("button", |state, actions, _, _, _| {
            let label = if state.get("on") == Some(&Value::Bool(true)) {
                "on"
            } else {
                "off"
            };
            if label == "off" {
                actions.call("flip", Value::Null)?;
            }
            Ok(Value::from(label))
        });
    let app = App::builder(Partial::new().partial("toggle", toggle))
        .view(|_, _, widgets| widgets.scope("toggle").call("button", Value::Null, &[]))
        .build()
        .unwrap();

    assert_eq!(app.last_render(), Some(Value::from("off")));
    assert!(app.flush().unwrap());
    assert_eq!(app.last_render(), Some(Value::from("on")));
}

#[test]
fn root_views_are_reachable_from_the_top_view() {
    let root = Partial::new()
        .state("name", "app")
        .view("footer", |state, _, _, _, _| {
            Ok(state.get("name").cloned().unwrap_or_default())
        })
        .partial("s1", Partial::new().view("body", |_, _, _, _, _| Ok(Value::from("body"))));
    let app = App::builder(root)
        .view(|_, _, widgets| {
            Ok(list(&[
                widgets.scope("s1").call("body", Value::Null, &[])?,
                widgets.call("footer", Value::Null, &[])?,
            ]))
        })
        .build()
        .unwrap();

    assert_eq!(
        app.last_render(),
        Some(list(&[Value::from("body"), Value::from("app")]))
    );
    assert_eq!(app.widgets().names(), vec!["footer"]);
    assert_eq!(app.widgets().scopes(), vec!["s1"]);
}

#[test]
fn unknown_views_fail_the_render() {
    let result = App::builder(nested_partials())
        .view(|_, _, widgets| widgets.scope("s1").call("missing", Value::Null, &[]))
        .build();
    assert!(matches!(result, Err(PartialError::UnknownView { .. })));

    let deferred = App::builder(nested_partials())
        .view(|_, _, widgets| widgets.scope("s1").call("missing", Value::Null, &[]))
        .config(AppConfig::default().with_render_on_build(false))
        .build()
        .unwrap();
    assert!(deferred.last_render().is_none());
    assert!(deferred.render().is_err());
}

#[test]
fn root_view_names_cannot_collide_with_partial_scopes() {
    let root = || {
        Partial::new()
            .view("s1", |_, _, _, _, _| Ok(Value::Null))
            .partial("s1", Partial::new().action("a", |_, _, _| ActionResult::none()))
    };
    assert!(matches!(
        App::builder(root()).build(),
        Err(PartialError::DuplicateRegistration { .. })
    ));

    let app = App::builder(root())
        .config(AppConfig::default().with_registration_policy(RegistrationPolicy::Replace))
        .build()
        .unwrap();
    assert_eq!(app.widgets().scopes(), vec!["s1"]);
}
