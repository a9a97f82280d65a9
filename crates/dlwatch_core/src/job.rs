use crate::submit::Submission;
use crate::wire::StatusResponse;

/// Opaque identifier assigned by the server on submission.
pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    /// Maps a free-form server label onto the lifecycle enum.
    ///
    /// Completion flags are authoritative: a finished job is `Done` or
    /// `Failed` whatever its label says, and an unfinished one is never
    /// terminal. Any label other than queued/pending counts as running,
    /// since the server reports things like `"Downloading 42.0% (1MiB/s)"`.
    pub fn from_label(label: &str, done: bool, success: bool) -> Self {
        if done {
            return if success {
                JobStatus::Done
            } else {
                JobStatus::Failed
            };
        }
        match label.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" => JobStatus::Queued,
            _ => JobStatus::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Running => "Running",
            JobStatus::Done => "Done",
            JobStatus::Failed => "Failed",
        }
    }
}

/// Clamps a server-reported percentage into `0..=100`.
///
/// Missing and NaN values read as 0; fractions are truncated.
pub fn clamp_progress(raw: Option<f64>) -> u8 {
    match raw {
        Some(value) if !value.is_nan() => value.clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// Local view of one server-side job, mutated only by poll responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    /// Parameters the job was submitted with, unknown when tracking was
    /// started for an id obtained elsewhere.
    pub submission: Option<Submission>,
    pub status: JobStatus,
    pub status_label: String,
    pub progress: u8,
    pub log_cursor: u64,
    pub logs: Vec<String>,
    pub done: bool,
    pub success: bool,
    pub error: Option<String>,
}

impl Job {
    pub fn new(id: JobId, submission: Option<Submission>) -> Self {
        Self {
            id,
            submission,
            status: JobStatus::Queued,
            status_label: JobStatus::Queued.label().to_string(),
            progress: 0,
            log_cursor: 0,
            logs: Vec::new(),
            done: false,
            success: false,
            error: None,
        }
    }

    /// Applies one status response. Returns the number of appended lines.
    pub(crate) fn apply_status(&mut self, response: StatusResponse) -> usize {
        let label = response.status.unwrap_or_default();
        self.status = JobStatus::from_label(&label, response.done, response.success);
        self.status_label = if label.trim().is_empty() {
            self.status.label().to_string()
        } else {
            label
        };
        self.progress = clamp_progress(response.progress);

        let appended = response.logs.len();
        let next = response
            .next
            .unwrap_or(self.log_cursor + appended as u64);
        self.logs.extend(response.logs);
        self.log_cursor = self.log_cursor.max(next);

        self.done = response.done;
        self.success = response.done && response.success;
        self.error = if self.status == JobStatus::Failed {
            response.error.filter(|e| !e.trim().is_empty())
        } else {
            None
        };
        appended
    }

    /// Marks the job failed for a reason the server never reported.
    pub(crate) fn fail_locally(&mut self, reason: &str) {
        self.status = JobStatus::Failed;
        self.status_label = JobStatus::Failed.label().to_string();
        self.done = true;
        self.success = false;
        self.error = Some(reason.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_onto_lifecycle() {
        assert_eq!(JobStatus::from_label("Queued", false, false), JobStatus::Queued);
        assert_eq!(
            JobStatus::from_label("Downloading 42.0% (1MiB/s)", false, false),
            JobStatus::Running
        );
        assert_eq!(JobStatus::from_label("Completed", true, true), JobStatus::Done);
        assert_eq!(JobStatus::from_label("Running", true, false), JobStatus::Failed);
        assert_eq!(JobStatus::from_label("Failed", false, false), JobStatus::Running);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(clamp_progress(Some(-5.0)), 0);
        assert_eq!(clamp_progress(Some(42.9)), 42);
        assert_eq!(clamp_progress(Some(250.0)), 100);
        assert_eq!(clamp_progress(Some(f64::INFINITY)), 100);
        assert_eq!(clamp_progress(Some(f64::NAN)), 0);
        assert_eq!(clamp_progress(None), 0);
    }

    #[test]
    fn missing_next_advances_by_line_count_and_never_rewinds() {
        let mut job = Job::new("j1".into(), None);
        job.apply_status(StatusResponse {
            logs: vec!["a".into(), "b".into()],
            ..StatusResponse::default()
        });
        assert_eq!(job.log_cursor, 2);

        job.apply_status(StatusResponse {
            next: Some(1),
            ..StatusResponse::default()
        });
        assert_eq!(job.log_cursor, 2);
        assert_eq!(job.logs, vec!["a", "b"]);
    }
}
