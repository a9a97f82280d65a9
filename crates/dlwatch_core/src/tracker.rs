//! Single-job tracker: one job slot, an incremental log cursor and an epoch
//! guard against responses that outlive the session that issued them.

use thiserror::Error;
use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::job::{Job, JobId};
use crate::submit::Submission;
use crate::wire::StatusResponse;

/// Tracking session counter; bumped on every start and stop.
pub type Epoch = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerPhase {
    #[default]
    Idle,
    Starting,
    Running,
    Done,
    Failed,
}

impl TrackerPhase {
    pub fn is_active(self) -> bool {
        matches!(self, TrackerPhase::Starting | TrackerPhase::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TrackerPhase::Done | TrackerPhase::Failed)
    }
}

/// One `GET /api/status/{job_id}?after={after}` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPoll {
    pub job_id: JobId,
    pub after: u64,
    pub epoch: Epoch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Response belonged to an earlier session and was dropped.
    Stale,
    Progressed,
    Finished { success: bool },
    /// The request itself failed; the session ended without a server verdict.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("job {active} is still being tracked")]
    Busy { active: JobId },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobTracker {
    phase: TrackerPhase,
    job: Option<Job>,
    epoch: Epoch,
    in_flight: bool,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    pub fn poll_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Replaces the slot with a fresh job and opens a new epoch.
    ///
    /// Refused while another job is starting or running; the active job is
    /// left untouched.
    pub fn start_tracking(
        &mut self,
        job_id: JobId,
        submission: Option<Submission>,
    ) -> Result<Epoch, TrackError> {
        if let Some(active) = self.job.as_ref().filter(|_| self.phase.is_active()) {
            return Err(TrackError::Busy {
                active: active.id.clone(),
            });
        }
        self.epoch += 1;
        self.phase = TrackerPhase::Starting;
        self.in_flight = false;
        watch_info!("Tracking job {} (epoch {})", job_id, self.epoch);
        self.job = Some(Job::new(job_id, submission));
        Ok(self.epoch)
    }

    /// Issues the next poll, or `None` when idle, finished, or a poll is
    /// still outstanding.
    pub fn begin_poll(&mut self) -> Option<StatusPoll> {
        if !self.phase.is_active() {
            return None;
        }
        if self.in_flight {
            watch_debug!("Skipping status tick; poll still in flight");
            return None;
        }
        let job = self.job.as_ref()?;
        self.in_flight = true;
        Some(StatusPoll {
            job_id: job.id.clone(),
            after: job.log_cursor,
            epoch: self.epoch,
        })
    }

    pub fn apply_status(&mut self, epoch: Epoch, response: StatusResponse) -> PollOutcome {
        if !self.accepts(epoch) {
            return PollOutcome::Stale;
        }
        self.in_flight = false;
        let Some(job) = self.job.as_mut() else {
            return PollOutcome::Stale;
        };

        let appended = job.apply_status(response);
        watch_debug!(
            "Job {} status={:?} progress={} appended={} cursor={}",
            job.id,
            job.status,
            job.progress,
            appended,
            job.log_cursor
        );

        if !job.done {
            self.phase = TrackerPhase::Running;
            return PollOutcome::Progressed;
        }

        if job.success {
            self.phase = TrackerPhase::Done;
            watch_info!("Job {} finished", job.id);
        } else {
            self.phase = TrackerPhase::Failed;
            if let Some(error) = job.error.clone() {
                job.logs.push(format!("ERROR: {error}"));
            }
            watch_warn!("Job {} failed: {:?}", job.id, job.error);
        }
        PollOutcome::Finished {
            success: job.success,
        }
    }

    /// Ends the session after a failed request. The cursor can no longer be
    /// trusted, so there is no retry.
    pub fn apply_transport_failure(&mut self, epoch: Epoch, reason: &str) -> PollOutcome {
        if !self.accepts(epoch) {
            return PollOutcome::Stale;
        }
        self.in_flight = false;
        self.phase = TrackerPhase::Failed;
        if let Some(job) = self.job.as_mut() {
            watch_warn!("Status poll for job {} failed: {}", job.id, reason);
            job.fail_locally(reason);
        }
        PollOutcome::Aborted
    }

    /// Explicit stop. Returns whether a session was actually interrupted.
    pub fn stop(&mut self) -> bool {
        if !self.phase.is_active() {
            return false;
        }
        self.epoch += 1;
        self.phase = TrackerPhase::Idle;
        self.in_flight = false;
        if let Some(job) = self.job.as_ref() {
            watch_info!("Stopped tracking job {}", job.id);
        }
        true
    }

    /// Empties the local log view. The cursor keeps its position so cleared
    /// lines are not fetched again.
    pub fn clear_logs(&mut self) -> bool {
        match self.job.as_mut() {
            Some(job) if !job.logs.is_empty() => {
                job.logs.clear();
                true
            }
            _ => false,
        }
    }

    fn accepts(&self, epoch: Epoch) -> bool {
        if epoch != self.epoch || !self.phase.is_active() {
            watch_debug!(
                "Discarding status response for epoch {} (current {}, {:?})",
                epoch,
                self.epoch,
                self.phase
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(logs: &[&str], next: u64) -> StatusResponse {
        StatusResponse {
            status: Some("Running".into()),
            progress: Some(10.0),
            logs: logs.iter().map(|l| l.to_string()).collect(),
            next: Some(next),
            ..StatusResponse::default()
        }
    }

    #[test]
    fn overlapping_ticks_are_skipped() {
        let mut tracker = JobTracker::new();
        tracker.start_tracking("j1".into(), None).unwrap();
        assert!(tracker.begin_poll().is_some());
        assert!(tracker.begin_poll().is_none());
    }

    #[test]
    fn response_after_stop_is_discarded() {
        let mut tracker = JobTracker::new();
        let epoch = tracker.start_tracking("j1".into(), None).unwrap();
        tracker.begin_poll().unwrap();
        assert!(tracker.stop());

        assert_eq!(tracker.apply_status(epoch, running(&["late"], 1)), PollOutcome::Stale);
        assert!(tracker.job().unwrap().logs.is_empty());
        assert_eq!(tracker.phase(), TrackerPhase::Idle);
    }

    #[test]
    fn response_from_previous_session_is_discarded() {
        let mut tracker = JobTracker::new();
        let old = tracker.start_tracking("j1".into(), None).unwrap();
        tracker.begin_poll().unwrap();
        tracker.stop();
        let new = tracker.start_tracking("j2".into(), None).unwrap();
        assert_ne!(old, new);

        assert_eq!(tracker.apply_status(old, running(&["j1 line"], 1)), PollOutcome::Stale);
        assert_eq!(tracker.job().unwrap().log_cursor, 0);
        assert_eq!(tracker.phase(), TrackerPhase::Starting);
    }

    #[test]
    fn clearing_logs_keeps_cursor() {
        let mut tracker = JobTracker::new();
        let epoch = tracker.start_tracking("j1".into(), None).unwrap();
        tracker.begin_poll().unwrap();
        tracker.apply_status(epoch, running(&["a", "b"], 2));
        assert!(tracker.clear_logs());

        let poll = tracker.begin_poll().unwrap();
        assert_eq!(poll.after, 2);
        assert!(tracker.job().unwrap().logs.is_empty());
    }
}
