use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{Scheduler, Task, TimerId};

/// Scheduler driven by hand against a virtual clock.
///
/// Nothing runs until the owner calls [`advance`](Self::advance),
/// [`run_next`](Self::run_next) or [`run_until_idle`](Self::run_until_idle).
/// Tasks run on the caller's thread, one at a time, ordered by deadline and
/// then by scheduling order.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    now: Duration,
    next_id: u64,
    queue: Vec<Entry>,
    scheduled: usize,
}

struct Entry {
    id: TimerId,
    due: Duration,
    task: Task,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Total calls to `schedule` so far, cancelled ones included.
    pub fn scheduled(&self) -> usize {
        self.lock().scheduled
    }

    /// Move the clock forward by `by`, running every task that falls due on
    /// the way (including ones scheduled by those tasks). Returns how many ran.
    pub fn advance(&self, by: Duration) -> usize {
        let until = self.now() + by;
        let mut ran = 0;
        while let Some(task) = self.pop_due(Some(until)) {
            task();
            ran += 1;
        }
        self.lock().now = until;
        ran
    }

    /// Jump to the earliest deadline and run that one task.
    pub fn run_next(&self) -> bool {
        match self.pop_due(None) {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run until the queue is empty. Returns how many tasks ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    // The lock is released before the task runs so it can reschedule itself.
    fn pop_due(&self, until: Option<Duration>) -> Option<Task> {
        let mut state = self.lock();
        let idx = state
            .queue
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(i, _)| i)?;
        let due = state.queue[idx].due;
        if until.is_some_and(|until| due > until) {
            return None;
        }
        let entry = state.queue.swap_remove(idx);
        state.now = state.now.max(due);
        Some(entry.task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let mut state = self.lock();
        state.next_id += 1;
        state.scheduled += 1;
        let id = TimerId::new(state.next_id);
        let due = state.now + delay;
        state.queue.push(Entry { id, due, task });
        id
    }

    fn cancel(&self, id: TimerId) {
        self.lock().queue.retain(|e| e.id != id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn log_into(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Task {
        let log = Arc::clone(log);
        Box::new(move || log.lock().unwrap().push(name))
    }

    #[test]
    fn runs_in_deadline_order() {
        let s = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        s.schedule(Duration::from_millis(30), log_into(&log, "c"));
        s.schedule(Duration::from_millis(10), log_into(&log, "a"));
        s.schedule(Duration::from_millis(10), log_into(&log, "b"));

        assert_eq!(s.run_until_idle(), 3);
        assert_eq!(*log.lock().unwrap(), ["a", "b", "c"]);
        assert_eq!(s.now(), Duration::from_millis(30));
    }

    #[test]
    fn advance_stops_at_window_end() {
        let s = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        s.schedule(Duration::from_millis(50), log_into(&log, "early"));
        s.schedule(Duration::from_millis(51), log_into(&log, "late"));

        assert_eq!(s.advance(Duration::from_millis(50)), 1);
        assert_eq!(*log.lock().unwrap(), ["early"]);
        assert_eq!(s.pending(), 1);
        assert_eq!(s.now(), Duration::from_millis(50));

        assert_eq!(s.advance(Duration::from_millis(1)), 1);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn cancelled_task_never_runs() {
        let s = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = s.schedule(Duration::from_millis(5), log_into(&log, "x"));
        s.cancel(id);
        // second cancel is a no-op
        s.cancel(id);

        assert_eq!(s.run_until_idle(), 0);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(s.scheduled(), 1);
    }

    #[test]
    fn task_can_reschedule_within_window() {
        let s = Arc::new(ManualScheduler::new());
        let hits = Arc::new(Mutex::new(0));

        let s2 = Arc::clone(&s);
        let h2 = Arc::clone(&hits);
        s.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                *h2.lock().unwrap() += 1;
                let h3 = Arc::clone(&h2);
                s2.schedule(
                    Duration::from_millis(10),
                    Box::new(move || *h3.lock().unwrap() += 1),
                );
            }),
        );

        assert_eq!(s.advance(Duration::from_millis(25)), 2);
        assert_eq!(*hits.lock().unwrap(), 2);
    }
}
