//! Standard runtime services for partial applications.
//!
//! [`Runtime`] is a single-threaded executor with virtual time: it queues
//! plain tasks, polls spawned futures and fires timeouts in deadline order.
//! [`StdRuntime`] couples it with a wall clock so an event loop can keep
//! virtual time in step with real time.

mod runtime;
mod sleep;

use std::fmt;
use std::time::{Duration, Instant};

pub use runtime::{Runtime, RuntimeHandle, TimerId};
pub use sleep::Sleep;

/// Clock implementation backed by [`std::time`].
#[derive(Debug, Default, Clone)]
pub struct StdClock;

impl StdClock {
    pub fn now(&self) -> Instant {
        Instant::now()
    }

    pub fn elapsed_millis(&self, since: Instant) -> u64 {
        since.elapsed().as_millis() as u64
    }

    /// Returns the elapsed time as a [`Duration`] for convenience.
    pub fn elapsed(&self, since: Instant) -> Duration {
        since.elapsed()
    }
}

/// Convenience container bundling a runtime with the standard clock.
#[derive(Clone)]
pub struct StdRuntime {
    runtime: Runtime,
    clock: StdClock,
    started: Instant,
}

impl StdRuntime {
    pub fn new() -> Self {
        let clock = StdClock;
        Self {
            runtime: Runtime::new(),
            started: clock.now(),
            clock,
        }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn clock(&self) -> &StdClock {
        &self.clock
    }

    /// Moves virtual time up to the real time elapsed since construction,
    /// firing every timer that came due on the way.
    pub fn pump(&self) {
        let elapsed = self.clock.elapsed_millis(self.started);
        self.runtime.advance_to(elapsed.max(self.runtime.now_millis()));
    }

    /// Real time left until the next timer is due, if any.
    pub fn time_to_next_deadline(&self) -> Option<Duration> {
        let deadline = self.runtime.next_deadline()?;
        let elapsed = self.clock.elapsed_millis(self.started);
        Some(Duration::from_millis(deadline.saturating_sub(elapsed)))
    }

    pub fn has_pending_work(&self) -> bool {
        self.runtime.has_pending_work()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("runtime", &self.runtime)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}
