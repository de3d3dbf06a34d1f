use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Number of visual steps a run is divided into.
pub const STEP_COUNT: u64 = 15;

/// Delay between two ticks of a running counter.
pub const STEP_DELAY: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Counting,
    Done,
}

/// How a counting tick derives the next displayed value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// `ceil(value + target / 15)` in floating point, clamped to the target.
    #[default]
    Ceil,
    /// Step `k` shows `ceil(target * k / 15)`, computed in integers.
    Exact,
}

/// Outcome of a single [`CounterAnimator::tick`].
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The value moved; another tick is due after [`STEP_DELAY`].
    Continue(u64),
    /// The value is pinned to the target. Nothing more is scheduled.
    Done(u64),
}

impl Tick {
    pub fn value(self) -> u64 {
        match self {
            Tick::Continue(v) | Tick::Done(v) => v,
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, Tick::Done(_))
    }
}

/// Counts a displayed value from 0 up to a fixed target.
///
/// The animator only holds state; it never sleeps or schedules. Whoever drives
/// it calls [`tick`](Self::tick) and reschedules while the result is
/// [`Tick::Continue`]. See [`crate::run::CounterRun`].
#[derive(Clone, Debug)]
pub struct CounterAnimator {
    target: u64,
    value: u64,
    mode: StepMode,
    phase: Phase,
    // Counting ticks taken; the terminal tick is not included.
    steps: u64,
}

impl CounterAnimator {
    pub fn new(target: u64, mode: StepMode) -> Self {
        Self {
            target,
            value: 0,
            mode,
            phase: Phase::Counting,
            steps: 0,
        }
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    /// Ticks taken so far, including the terminal one.
    pub fn ticks(&self) -> u64 {
        match self.phase {
            Phase::Counting => self.steps,
            Phase::Done => self.steps + 1,
        }
    }

    /// Increment applied per counting tick in [`StepMode::Ceil`].
    pub fn step_size(&self) -> f64 {
        self.target as f64 / STEP_COUNT as f64
    }

    pub fn tick(&mut self) -> Tick {
        if self.phase == Phase::Done {
            return Tick::Done(self.target);
        }

        if self.value < self.target {
            let next = match self.mode {
                StepMode::Ceil => self.ceil_step(),
                StepMode::Exact => self.exact_step(),
            };
            self.steps += 1;
            self.value = next;
            trace!(ceil = self.target, value = next, step = self.steps, "counter tick");
            Tick::Continue(next)
        } else {
            // Final correction; also covers target == 0 on the first tick.
            self.value = self.target;
            self.phase = Phase::Done;
            Tick::Done(self.target)
        }
    }

    fn ceil_step(&self) -> u64 {
        // Float -> int `as` saturates, so NaN/inf cannot wrap here.
        let raw = (self.value as f64 + self.step_size()).ceil() as u64;
        // Past 2^53 the f64 sum can round back down; always move by at least one.
        raw.max(self.value + 1).min(self.target)
    }

    fn exact_step(&self) -> u64 {
        let k = (self.steps + 1).min(STEP_COUNT) as u128;
        let n = STEP_COUNT as u128;
        let next = (self.target as u128 * k).div_ceil(n) as u64;
        next.max(self.value).min(self.target)
    }
}
