use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::animator::{CounterAnimator, Phase, STEP_DELAY, Tick};
use crate::scheduler::{Scheduler, TimerId};

/// Where a running counter writes its value.
pub trait CounterDisplay: Send + 'static {
    fn show(&mut self, value: u64);
}

impl<F> CounterDisplay for F
where
    F: FnMut(u64) + Send + 'static,
{
    fn show(&mut self, value: u64) {
        self(value)
    }
}

/// One animation of a counter from 0 to its target.
///
/// The first tick runs inside [`start`](Self::start); each further tick is a
/// single pending callback on the scheduler, queued only while the animator
/// keeps counting. Dropping the handle does not stop the run; call
/// [`cancel`](Self::cancel) for that.
pub struct CounterRun {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    scheduler: Arc<dyn Scheduler>,
}

struct State {
    animator: CounterAnimator,
    display: Box<dyn CounterDisplay>,
    pending: Option<TimerId>,
    cancelled: bool,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CounterRun {
    pub fn start(
        animator: CounterAnimator,
        display: impl CounterDisplay,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        debug!(
            ceil = animator.target(),
            mode = ?animator.mode(),
            "counter run started"
        );
        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                animator,
                display: Box::new(display),
                pending: None,
                cancelled: false,
            }),
            scheduler,
        });
        step(&inner);
        Self { inner }
    }

    /// Stop the run and drop its pending tick.
    ///
    /// Once this returns the display is not touched again. Returns `false` if
    /// the run had already finished or was cancelled before.
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.lock();
        if state.cancelled || state.animator.is_done() {
            return false;
        }
        state.cancelled = true;
        if let Some(id) = state.pending.take() {
            self.inner.scheduler.cancel(id);
        }
        debug!(
            ceil = state.animator.target(),
            value = state.animator.value(),
            "counter run cancelled"
        );
        true
    }

    pub fn target(&self) -> u64 {
        self.inner.lock().animator.target()
    }

    pub fn value(&self) -> u64 {
        self.inner.lock().animator.value()
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().animator.phase()
    }

    pub fn is_done(&self) -> bool {
        self.inner.lock().animator.is_done()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().cancelled
    }
}

// Holds the state lock across tick, display and reschedule so a concurrent
// `cancel` either lands before the tick or after the next one is queued.
fn step(inner: &Arc<Inner>) {
    let mut state = inner.lock();
    if state.cancelled {
        return;
    }
    state.pending = None;

    let tick = state.animator.tick();
    state.display.show(tick.value());

    match tick {
        Tick::Continue(_) => {
            let next = Arc::clone(inner);
            let id = inner
                .scheduler
                .schedule(STEP_DELAY, Box::new(move || step(&next)));
            state.pending = Some(id);
        }
        Tick::Done(value) => {
            debug!(value, ticks = state.animator.ticks(), "counter run done");
        }
    }
}
