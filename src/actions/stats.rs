use std::sync::{Arc, OnceLock};

use stats_counter::{
    CounterAnimator, CounterDisplay, CounterRun, CounterSettings, Scheduler, TargetError,
    TimerThread, parse_settings,
};
use streamdeck_lib::prelude::*;
use tracing::{debug, warn};

use crate::render::{render_number, render_placeholder};

// One timer thread for every key, like a page sharing one event loop.
static TIMER: OnceLock<Arc<TimerThread>> = OnceLock::new();

fn timer() -> Arc<dyn Scheduler> {
    let timer = TIMER.get_or_init(|| Arc::new(TimerThread::spawn()));
    Arc::clone(timer) as Arc<dyn Scheduler>
}

/// Paints a run's values onto the key that owns it.
struct KeyDisplay {
    cx: Context,
    ctx_id: String,
}

impl CounterDisplay for KeyDisplay {
    fn show(&mut self, value: u64) {
        render_number(&self.cx, &self.ctx_id, value);
    }
}

#[derive(Default)]
pub struct StatsCounterAction {
    settings: Option<CounterSettings>,
    target_error: Option<TargetError>,
    run: Option<CounterRun>,
}

impl ActionStatic for StatsCounterAction {
    const ID: &'static str = super::ids::STATS_COUNTER;
}

impl Action for StatsCounterAction {
    fn id(&self) -> &str {
        Self::ID
    }

    fn init(&mut self, cx: &Context, ctx_id: &str) {
        cx.sd().get_settings(ctx_id);
    }

    fn did_receive_settings(&mut self, cx: &Context, ev: &incoming::DidReceiveSettings) {
        match parse_settings(&ev.settings) {
            Ok(settings) => {
                let changed = self.settings.as_ref() != Some(&settings);
                self.settings = Some(settings);
                self.target_error = None;
                // Property inspector re-sends settings on every edit; only
                // restart when something actually changed.
                if changed || self.run.is_none() {
                    self.restart(cx, ev.context);
                }
            }
            Err(e) => {
                warn!(context = ev.context, "counter not started: {e}");
                self.stop();
                self.settings = None;
                self.target_error = Some(e);
                render_placeholder(cx, ev.context);
                cx.sd().show_alert(ev.context);
            }
        }
    }

    fn will_appear(&mut self, cx: &Context, ev: &incoming::WillAppear) {
        if self.settings.is_some() {
            // Coming back to the page replays the count.
            self.restart(cx, ev.context);
        } else if self.target_error.is_some() {
            render_placeholder(cx, ev.context);
        } else {
            render_number(cx, ev.context, 0);
        }
    }

    fn will_disappear(&mut self, _cx: &Context, _ev: &incoming::WillDisappear) {
        self.stop();
    }

    fn teardown(&mut self, _cx: &Context, _ctx_id: &str) {
        self.stop();
    }

    fn key_up(&mut self, cx: &Context, ev: &incoming::KeyUp) {
        if self.settings.is_some() {
            self.restart(cx, ev.context);
        } else {
            cx.sd().show_alert(ev.context);
        }
    }
}

impl StatsCounterAction {
    fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            if run.cancel() {
                debug!(value = run.value(), "stopped counter mid-run");
            }
        }
    }

    fn restart(&mut self, cx: &Context, ctx_id: &str) {
        self.stop();
        let Some(settings) = self.settings.as_ref() else {
            return;
        };

        let display = KeyDisplay {
            cx: cx.clone(),
            ctx_id: ctx_id.to_string(),
        };
        let animator = CounterAnimator::new(settings.target, settings.step_mode);
        self.run = Some(CounterRun::start(animator, display, timer()));
    }
}
