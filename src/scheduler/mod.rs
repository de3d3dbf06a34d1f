mod manual;
mod thread;

use std::time::Duration;

pub use manual::ManualScheduler;
pub use thread::TimerThread;

/// A deferred callback. Runs at most once.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle to one pending callback, returned by [`Scheduler::schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Deferred, cooperative callback execution.
///
/// Implementations must never run a task inline from `schedule`: callers may
/// hold locks across the call.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task) -> TimerId;

    /// Drop a pending task. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);
}
