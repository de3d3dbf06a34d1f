pub mod animator;
pub mod config;
pub mod run;
pub mod scheduler;

pub use animator::{CounterAnimator, Phase, STEP_COUNT, STEP_DELAY, StepMode, Tick};
pub use config::{CounterSettings, TargetError, parse_settings};
pub use run::{CounterDisplay, CounterRun};
pub use scheduler::{ManualScheduler, Scheduler, Task, TimerId, TimerThread};

pub const PLUGIN_ID: &str = "icu.veelume.stats";
