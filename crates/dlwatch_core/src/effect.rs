use std::time::Duration;

use crate::submit::Submission;
use crate::tracker::{Epoch, StatusPoll};

/// Recurring timers owned by the trackers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    JobStatus,
    TaskList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob(Submission),
    FetchStatus(StatusPoll),
    FetchTasks { epoch: Epoch },
    FetchFiles,
    /// Start (or restart) a timer delivering `Msg::Tick(timer)` every `interval`.
    StartTimer { timer: TimerKind, interval: Duration },
    CancelTimer { timer: TimerKind },
}
