use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{Scheduler, Task, TimerId};

enum Command {
    Schedule { id: u64, due: Instant, task: Task },
    Cancel(u64),
}

/// One background thread that fires every scheduled task in deadline order.
///
/// Tasks never run in parallel with each other, so any number of counters can
/// share one `TimerThread` the way timers share a single event loop. Once every
/// handle is dropped the thread still fires whatever is pending, each at its
/// own deadline, and then exits.
pub struct TimerThread {
    tx: Sender<Command>,
    next_id: AtomicU64,
}

impl TimerThread {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || run_worker(rx));
        debug!("timer thread started");
        Self {
            tx,
            next_id: AtomicU64::new(0),
        }
    }
}

impl Scheduler for TimerThread {
    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let due = Instant::now() + delay;
        if self.tx.send(Command::Schedule { id, due, task }).is_err() {
            warn!(id, "timer thread is gone; task dropped");
        }
        TimerId::new(id)
    }

    fn cancel(&self, id: TimerId) {
        // A dead worker has nothing left to cancel.
        let _ = self.tx.send(Command::Cancel(id.0));
    }
}

fn run_worker(rx: Receiver<Command>) {
    let mut deadlines: BinaryHeap<Reverse<(Instant, u64)>> = BinaryHeap::new();
    let mut tasks: HashMap<u64, Task> = HashMap::new();

    loop {
        let now = Instant::now();
        while let Some(&Reverse((due, id))) = deadlines.peek() {
            if due > now {
                break;
            }
            deadlines.pop();
            // Missing means cancelled.
            if let Some(task) = tasks.remove(&id) {
                task();
            }
        }

        let cmd = match deadlines.peek() {
            Some(&Reverse((due, _))) => {
                match rx.recv_timeout(due.saturating_duration_since(Instant::now())) {
                    Ok(cmd) => cmd,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(cmd) => cmd,
                Err(_) => break,
            },
        };

        match cmd {
            Command::Schedule { id, due, task } => {
                deadlines.push(Reverse((due, id)));
                tasks.insert(id, task);
            }
            Command::Cancel(id) => {
                tasks.remove(&id);
            }
        }
    }

    // Handles are gone but earlier work is still owed; nothing new can arrive.
    while let Some(Reverse((due, id))) = deadlines.pop() {
        let Some(task) = tasks.remove(&id) else {
            continue;
        };
        std::thread::sleep(due.saturating_duration_since(Instant::now()));
        task();
    }

    debug!("timer thread stopped");
}
