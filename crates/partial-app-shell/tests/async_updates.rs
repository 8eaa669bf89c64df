use partial_app_shell::App;
use partial_core::{extract, ActionResult, Partial, Path, Value};
use partial_runtime_std::Runtime;

fn at(app: &App, dotted: &str) -> Option<Value> {
    extract(&Path::parse(dotted), &app.state()).ok().cloned()
}

#[test]
fn timer_updates_reread_state_before_merging() {
    let runtime = Runtime::new();
    let timers = runtime.handle();
    let s2 = Partial::new()
        .state("other", "keep")
        .action("later", move |_, _, _| {
            let timers = timers.clone();
            ActionResult::updater(move |update| {
                let first = update.clone();
                timers.set_timeout(10, move || {
                    first.set([("foo", "foo")].into_iter().collect::<Value>()).unwrap();
                });
                timers.set_timeout(20, move || {
                    update.set([("bar", "bar")].into_iter().collect::<Value>()).unwrap();
                });
                Value::Null
            })
        });
    let root = Partial::new().partial("s1", Partial::new().partial("s2", s2));
    let app = App::builder(root).runtime(runtime.clone()).build().unwrap();

    app.call("s1.s2.later", Value::Null).unwrap();
    assert_eq!(at(&app, "s1.s2.foo"), None);

    app.advance_by(10).unwrap();
    assert_eq!(at(&app, "s1.s2.foo"), Some(Value::from("foo")));
    assert_eq!(at(&app, "s1.s2.bar"), None);

    assert!(app.advance_by(10).unwrap());
    assert_eq!(at(&app, "s1.s2.foo"), Some(Value::from("foo")));
    assert_eq!(at(&app, "s1.s2.bar"), Some(Value::from("bar")));
    assert_eq!(at(&app, "s1.s2.other"), Some(Value::from("keep")));
    assert!(!runtime.has_pending_work());
}

#[test]
fn writes_between_timers_are_not_lost() {
    let runtime = Runtime::new();
    let timers = runtime.handle();
    let form = Partial::new()
        .state("draft", "")
        .state("saved", false)
        .action("type", |_, _, data| {
            [("draft", data)].into_iter().collect::<Value>().into()
        })
        .action("autosave", move |_, _, _| {
            let timers = timers.clone();
            ActionResult::updater(move |update| {
                timers.set_timeout(50, move || {
                    update.set([("saved", true)].into_iter().collect::<Value>()).unwrap();
                });
                Value::from("scheduled")
            })
        });
    let app = App::builder(Partial::new().partial("form", form))
        .runtime(runtime)
        .build()
        .unwrap();

    assert_eq!(app.call("form.autosave", Value::Null).unwrap(), Value::from("scheduled"));
    app.call("form.type", "hello").unwrap();
    app.advance_by(50).unwrap();

    assert_eq!(at(&app, "form.draft"), Some(Value::from("hello")));
    assert_eq!(at(&app, "form.saved"), Some(Value::Bool(true)));
}

#[test]
fn deferred_results_land_after_the_runtime_runs() {
    let runtime = Runtime::new();
    let sleeper = runtime.handle();
    let loader = Partial::new()
        .state("status", "idle")
        .action("load", move |state, _, data| {
            let sleeper = sleeper.clone();
            let previous = state.get("status").cloned().unwrap_or_default();
            ActionResult::deferred(async move {
                sleeper.sleep(100).await;
                [("status", Value::from("loaded")), ("was", previous), ("payload", data)]
                    .into_iter()
                    .collect::<Value>()
            })
        });
    let app = App::builder(Partial::new().partial("loader", loader))
        .runtime(runtime.clone())
        .build()
        .unwrap();

    assert_eq!(app.call("loader.load", 7).unwrap(), Value::Null);
    assert!(!app.flush().unwrap());
    assert_eq!(at(&app, "loader.status"), Some(Value::from("idle")));
    assert!(runtime.has_pending_work());

    assert!(app.advance_by(100).unwrap());
    assert_eq!(at(&app, "loader.status"), Some(Value::from("loaded")));
    assert_eq!(at(&app, "loader.was"), Some(Value::from("idle")));
    assert_eq!(at(&app, "loader.payload"), Some(Value::Int(7)));
    assert!(!runtime.has_pending_work());
}

#[test]
fn ready_futures_apply_on_flush() {
    let counter = Partial::new().state("count", 1).action("double_later", |state, _, _| {
        let count = state.get("count").and_then(Value::as_int).unwrap_or(0);
        ActionResult::deferred(async move { [("count", count * 2)].into_iter().collect::<Value>() })
    });
    let app = App::builder(Partial::new().partial("counter", counter)).build().unwrap();

    app.call("counter.double_later", Value::Null).unwrap();
    assert_eq!(at(&app, "counter.count"), Some(Value::Int(1)));
    assert!(app.flush().unwrap());
    assert_eq!(at(&app, "counter.count"), Some(Value::Int(2)));
}

#[test]
fn pending_deferred_results_are_dropped_with_the_app() {
    let runtime = Runtime::new();
    let sleeper = runtime.handle();
    let slow = Partial::new().action("slow", move |_, _, _| {
        let sleeper = sleeper.clone();
        ActionResult::deferred(async move {
            sleeper.sleep(10).await;
            [("done", true)].into_iter().collect::<Value>()
        })
    });
    let app = App::builder(Partial::new().partial("slow", slow))
        .runtime(runtime.clone())
        .build()
        .unwrap();
    app.call("slow.slow", Value::Null).unwrap();
    drop(app);

    runtime.advance_by(10);
    assert!(!runtime.has_pending_work());
}
