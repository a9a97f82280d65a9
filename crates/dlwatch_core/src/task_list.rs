use watch_logging::{watch_debug, watch_warn};

use crate::job::JobStatus;
use crate::tracker::Epoch;

/// Lightweight projection of a job for list views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: String,
    pub status: JobStatus,
    pub status_label: String,
    pub progress: u8,
    pub done: bool,
    pub success: bool,
    pub error: Option<String>,
}

impl TaskSummary {
    /// Title when the server knows one, else the url.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.url,
        }
    }
}

/// Snapshot poller over `GET /api/tasks`.
///
/// Every successful poll replaces the whole set in server order. Failures
/// keep the previous snapshot; the next tick simply tries again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskList {
    tasks: Vec<TaskSummary>,
    running: bool,
    epoch: Epoch,
    in_flight: bool,
    last_error: Option<String>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[TaskSummary] {
        &self.tasks
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.done).count()
    }

    /// Returns false when already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.epoch += 1;
        self.in_flight = false;
        true
    }

    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.epoch += 1;
        self.in_flight = false;
        true
    }

    /// Epoch for the next fetch, unless stopped or a fetch is outstanding.
    pub fn begin_poll(&mut self) -> Option<Epoch> {
        if !self.running {
            return None;
        }
        if self.in_flight {
            watch_debug!("Skipping task list tick; fetch still in flight");
            return None;
        }
        self.in_flight = true;
        Some(self.epoch)
    }

    /// Returns whether the visible snapshot changed.
    pub fn apply_snapshot(&mut self, epoch: Epoch, tasks: Vec<TaskSummary>) -> bool {
        if !self.accepts(epoch) {
            return false;
        }
        self.in_flight = false;
        let had_error = self.last_error.take().is_some();
        if self.tasks == tasks {
            return had_error;
        }
        self.tasks = tasks;
        true
    }

    /// Records a swallowed failure. Returns whether the error text changed.
    pub fn apply_failure(&mut self, epoch: Epoch, error: String) -> bool {
        if !self.accepts(epoch) {
            return false;
        }
        self.in_flight = false;
        watch_warn!("Task list poll failed: {}", error);
        if self.last_error.as_deref() == Some(error.as_str()) {
            return false;
        }
        self.last_error = Some(error);
        true
    }

    fn accepts(&self, epoch: Epoch) -> bool {
        self.running && epoch == self.epoch
    }
}
