use std::thread;
use std::time::Duration;

use partial_app_shell::{App, AppConfig};
use partial_core::{ActionResult, Actions, Emitter, Partial, Value, Widgets};
use partial_runtime_std::{RuntimeHandle, StdRuntime};

const TICK_MS: u64 = 250;
const TICKS: i64 = 6;

fn counter(label: &'static str) -> Partial {
    Partial::new()
        .state("label", label)
        .state("count", 0)
        .action("add", |state, _, data| {
            let count = state.get("count").and_then(Value::as_int).unwrap_or(0);
            let step = data.as_int().unwrap_or(1);
            [("count", count + step)].into_iter().collect::<Value>().into()
        })
        .view("line", |state, _, _, props, _| {
            let marker = props.as_str().unwrap_or("-");
            Ok(Value::from(format!(
                "{marker} {}: {}",
                state.get("label").cloned().unwrap_or_default(),
                state.get("count").cloned().unwrap_or_default()
            )))
        })
}

/// Ticks on a timer and announces every tick as a `tick` event.
fn clock(timers: RuntimeHandle) -> impl Fn(&Emitter) -> Partial {
    move |emit: &Emitter| {
        let timers = timers.clone();
        let emit = emit.clone();
        Partial::new()
            .state("ticks", 0)
            .action("start", move |_, _, _| {
                let timers = timers.clone();
                let emit = emit.clone();
                ActionResult::updater(move |update| {
                    schedule_tick(timers, emit, update, 1);
                    Value::Null
                })
            })
            .init(|actions| {
                if let Err(err) = actions.call("start", Value::Null) {
                    log::error!("clock failed to start: {err}");
                }
            })
    }
}

fn schedule_tick(
    timers: RuntimeHandle,
    emit: Emitter,
    update: partial_core::Updater,
    tick: i64,
) {
    let next = timers.clone();
    timers.set_timeout(TICK_MS, move || {
        if let Err(err) = update.set([("ticks", tick)].into_iter().collect::<Value>()) {
            log::error!("tick {tick} lost: {err}");
            return;
        }
        if let Err(err) = emit.emit("tick", tick) {
            log::error!("tick handlers failed: {err}");
        }
        if tick < TICKS {
            schedule_tick(next, emit, update, tick + 1);
        }
    });
}

fn top_view(state: &Value, _: &Actions, widgets: &Widgets) -> partial_core::Result<Value> {
    let counters = widgets.scope("counters");
    let lines = vec![
        Value::from(format!(
            "tick {}",
            state
                .get("clock")
                .and_then(|clock| clock.get("ticks"))
                .cloned()
                .unwrap_or_default()
        )),
        counters.scope("left").call("line", "<", &[])?,
        counters.scope("right").call("line", ">", &[])?,
    ];
    Ok(Value::from(lines))
}

fn main() {
    env_logger::init();

    let std_runtime = StdRuntime::new();
    let counters = Partial::new()
        .partial("left", counter("left"))
        .partial("right", counter("right"));
    let root = Partial::new()
        .partial("counters", counters)
        .partial_factory("clock", clock(std_runtime.runtime_handle()))
        .event("tick", |_, actions, data| {
            let tick = data.as_int().unwrap_or(0);
            let scope = if tick % 2 == 0 { "left" } else { "right" };
            let counters = actions.branch("counters").and_then(|c| c.branch(scope));
            if let Some(counter) = counters {
                if let Err(err) = counter.call("add", tick) {
                    log::error!("tick {tick} could not bump {scope}: {err}");
                }
            }
            Value::Null
        });

    let app = match App::builder(root)
        .view(top_view)
        .config(AppConfig::default().with_name("counter-demo"))
        .runtime(std_runtime.runtime())
        .build()
    {
        Ok(app) => app,
        Err(err) => {
            log::error!("failed to build app: {err}");
            std::process::exit(1);
        }
    };

    if let Some(frame) = app.last_render() {
        println!("{frame}");
    }
    while std_runtime.has_pending_work() {
        let wait = std_runtime
            .time_to_next_deadline()
            .unwrap_or(Duration::from_millis(TICK_MS));
        thread::sleep(wait);
        std_runtime.pump();
        match app.flush() {
            Ok(true) => {
                if let Some(frame) = app.last_render() {
                    println!("{frame}");
                }
            }
            Ok(false) => {}
            Err(err) => log::error!("render failed: {err}"),
        }
    }
    println!("done: {}", app.state());
}
