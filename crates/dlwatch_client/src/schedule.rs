//! Recurring timers behind a small trait, so the event loop can run on real
//! tokio timers while tests fire ticks by hand.

use std::collections::HashMap;
use std::time::Duration;

use dlwatch_core::{Msg, TimerKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use watch_logging::watch_debug;

pub trait Scheduler {
    /// Starts `timer`, replacing any running timer of the same kind. The
    /// first tick arrives one `interval` from now.
    fn start(&mut self, timer: TimerKind, interval: Duration);

    /// Cancels `timer`; a no-op when it is not running.
    fn cancel(&mut self, timer: TimerKind);

    fn is_running(&self, timer: TimerKind) -> bool;
}

/// Delivers `Msg::Tick` into the event loop's channel from tokio tasks.
pub struct TokioScheduler {
    msg_tx: mpsc::UnboundedSender<Msg>,
    timers: HashMap<TimerKind, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(msg_tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            msg_tx,
            timers: HashMap::new(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn start(&mut self, timer: TimerKind, interval: Duration) {
        // tokio panics on a zero period.
        let interval = interval.max(Duration::from_millis(1));
        let tx = self.msg_tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            // A slow event loop gets one late tick, not a burst.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(Msg::Tick(timer)).is_err() {
                    break;
                }
            }
        });
        watch_debug!("Started {:?} timer every {:?}", timer, interval);
        if let Some(previous) = self.timers.insert(timer, handle) {
            previous.abort();
        }
    }

    fn cancel(&mut self, timer: TimerKind) {
        if let Some(handle) = self.timers.remove(&timer) {
            watch_debug!("Cancelled {:?} timer", timer);
            handle.abort();
        }
    }

    fn is_running(&self, timer: TimerKind) -> bool {
        self.timers
            .get(&timer)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

/// Timer bookkeeping without a clock. Tests call [`ManualScheduler::fire`]
/// to get the tick a real timer would have delivered.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    timers: HashMap<TimerKind, Duration>,
    started: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tick for `timer`, or `None` once it was cancelled.
    pub fn fire(&self, timer: TimerKind) -> Option<Msg> {
        self.timers.contains_key(&timer).then_some(Msg::Tick(timer))
    }

    pub fn interval(&self, timer: TimerKind) -> Option<Duration> {
        self.timers.get(&timer).copied()
    }

    /// How many times any timer was (re)started.
    pub fn started_count(&self) -> usize {
        self.started
    }
}

impl Scheduler for ManualScheduler {
    fn start(&mut self, timer: TimerKind, interval: Duration) {
        self.started += 1;
        self.timers.insert(timer, interval);
    }

    fn cancel(&mut self, timer: TimerKind) {
        self.timers.remove(&timer);
    }

    fn is_running(&self, timer: TimerKind) -> bool {
        self.timers.contains_key(&timer)
    }
}
