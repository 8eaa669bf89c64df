use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::executor::{LocalPool, LocalSpawner};
use futures::FutureExt;
use futures_task::{LocalFutureObj, LocalSpawn};

use crate::sleep::Sleep;

/// Identifies a pending timeout so it can be cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

type Task = Box<dyn FnOnce() + 'static>;

struct RuntimeInner {
    now: Cell<u64>,
    next_timer_id: Cell<u64>,
    // keyed by (due, id) so equal deadlines fire in registration order
    timers: RefCell<BTreeMap<(u64, TimerId), Task>>,
    pending_tasks: RefCell<VecDeque<Task>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    live_futures: Rc<Cell<usize>>,
    work_requested: Cell<bool>,
}

impl RuntimeInner {
    fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            now: Cell::new(0),
            next_timer_id: Cell::new(1),
            timers: RefCell::new(BTreeMap::new()),
            pending_tasks: RefCell::new(VecDeque::new()),
            pool: RefCell::new(pool),
            spawner,
            live_futures: Rc::new(Cell::new(0)),
            work_requested: Cell::new(false),
        }
    }

    fn request_work(&self) {
        self.work_requested.set(true);
    }

    fn set_timeout(&self, delay_ms: u64, callback: Task) -> TimerId {
        let id = TimerId(self.next_timer_id.get());
        self.next_timer_id.set(id.0 + 1);
        let due = self.now.get().saturating_add(delay_ms);
        self.timers.borrow_mut().insert((due, id), callback);
        log::trace!("timer {id:?} due at {due}ms");
        self.request_work();
        id
    }

    fn clear_timeout(&self, id: TimerId) -> bool {
        let mut timers = self.timers.borrow_mut();
        let key = timers.keys().find(|(_, timer)| *timer == id).copied();
        key.and_then(|key| timers.remove(&key)).is_some()
    }

    fn enqueue_task(&self, task: Task) {
        self.pending_tasks.borrow_mut().push_back(task);
        self.request_work();
    }

    fn drain_tasks(&self) -> bool {
        let tasks: Vec<Task> = self.pending_tasks.borrow_mut().drain(..).collect();
        let ran = !tasks.is_empty();
        for task in tasks {
            task();
        }
        ran
    }

    fn has_tasks(&self) -> bool {
        !self.pending_tasks.borrow().is_empty()
    }

    fn spawn_local(&self, future: impl Future<Output = ()> + 'static) -> bool {
        let live = Rc::clone(&self.live_futures);
        live.set(live.get() + 1);
        let tracked = future
            .map(move |()| live.set(live.get().saturating_sub(1)))
            .boxed_local();
        match self.spawner.spawn_local_obj(LocalFutureObj::new(tracked)) {
            Ok(()) => {
                self.request_work();
                true
            }
            Err(err) => {
                log::warn!("failed to spawn local future: {err}");
                self.live_futures
                    .set(self.live_futures.get().saturating_sub(1));
                false
            }
        }
    }

    fn run_until_stalled(&self) {
        loop {
            self.drain_tasks();
            match self.pool.try_borrow_mut() {
                Ok(mut pool) => pool.run_until_stalled(),
                Err(_) => {
                    log::warn!("run_until_stalled called from inside a running future");
                    return;
                }
            }
            if !self.has_tasks() {
                break;
            }
        }
    }

    fn pop_due(&self, deadline: u64) -> Option<(u64, Task)> {
        let mut timers = self.timers.borrow_mut();
        let (&(due, id), _) = timers.iter().next()?;
        if due > deadline {
            return None;
        }
        timers.remove(&(due, id)).map(|task| (due, task))
    }

    fn advance_to(&self, target: u64) {
        self.run_until_stalled();
        while let Some((due, task)) = self.pop_due(target) {
            if due > self.now.get() {
                self.now.set(due);
            }
            task();
            self.run_until_stalled();
        }
        if target > self.now.get() {
            self.now.set(target);
        }
    }

    fn next_deadline(&self) -> Option<u64> {
        self.timers.borrow().keys().next().map(|&(due, _)| due)
    }

    fn has_pending_work(&self) -> bool {
        self.has_tasks() || !self.timers.borrow().is_empty() || self.live_futures.get() > 0
    }
}

/// Single-threaded executor with virtual time.
///
/// Tasks and futures run when the owner calls [`Runtime::run_until_stalled`];
/// timers fire only while time is moved forward with [`Runtime::advance_by`]
/// or [`Runtime::advance_to`].
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new()),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    /// Current virtual time in milliseconds.
    pub fn now_millis(&self) -> u64 {
        self.inner.now.get()
    }

    /// Runs queued tasks and polls spawned futures until none can make progress.
    pub fn run_until_stalled(&self) {
        self.inner.run_until_stalled();
    }

    pub fn advance_by(&self, delta_ms: u64) {
        let target = self.inner.now.get().saturating_add(delta_ms);
        self.inner.advance_to(target);
    }

    /// Fires every timer due at or before `target_ms` in deadline order.
    /// Time never moves backwards.
    pub fn advance_to(&self, target_ms: u64) {
        self.inner.advance_to(target_ms);
    }

    pub fn has_pending_work(&self) -> bool {
        self.inner.has_pending_work()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.inner.next_deadline()
    }

    /// Returns whether work was scheduled since the last call.
    pub fn take_work_request(&self) -> bool {
        self.inner.work_requested.replace(false)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("now_ms", &self.inner.now.get())
            .field("timers", &self.inner.timers.borrow().len())
            .field("pending_tasks", &self.inner.pending_tasks.borrow().len())
            .field("live_futures", &self.inner.live_futures.get())
            .finish()
    }
}

/// Weak handle to a [`Runtime`], safe to capture inside callbacks.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn now_millis(&self) -> u64 {
        self.0
            .upgrade()
            .map(|inner| inner.now.get())
            .unwrap_or(0)
    }

    /// Runs `callback` once `delay_ms` of virtual time has passed.
    pub fn set_timeout(&self, delay_ms: u64, callback: impl FnOnce() + 'static) -> Option<TimerId> {
        self.0
            .upgrade()
            .map(|inner| inner.set_timeout(delay_ms, Box::new(callback)))
    }

    /// Returns whether a pending timer was removed.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.clear_timeout(id))
            .unwrap_or(false)
    }

    /// Queues `task` for the next drain; runs it right away when the runtime
    /// is gone.
    pub fn enqueue_task(&self, task: impl FnOnce() + 'static) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_task(Box::new(task));
        } else {
            task();
        }
    }

    pub fn spawn_local(&self, future: impl Future<Output = ()> + 'static) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.spawn_local(future))
            .unwrap_or(false)
    }

    /// Future that completes once `delay_ms` of virtual time has passed.
    pub fn sleep(&self, delay_ms: u64) -> Sleep {
        let sleep = Sleep::pending();
        let waker = sleep.clone();
        if self.set_timeout(delay_ms, move || waker.complete()).is_none() {
            sleep.complete();
        }
        sleep
    }

    pub fn has_pending_work(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_pending_work())
            .unwrap_or(false)
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
