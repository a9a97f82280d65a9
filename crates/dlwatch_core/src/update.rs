use watch_logging::{watch_info, watch_warn};

use crate::submit::{validate, Submission};
use crate::tracker::PollOutcome;
use crate::{AppState, Effect, JobId, Msg, SubmitOutcome, TimerKind};

/// Local error recorded when a status poll itself fails.
pub(crate) const STATUS_FETCH_FAILED: &str = "status fetch failed";

const SUBMISSION_PENDING: &str = "A submission is still pending.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::AppStarted => {
            let mut effects = Vec::new();
            if state.tasks.start() {
                effects.push(Effect::StartTimer {
                    timer: TimerKind::TaskList,
                    interval: state.intervals.tasks,
                });
                if let Some(epoch) = state.tasks.begin_poll() {
                    effects.push(Effect::FetchTasks { epoch });
                }
            }
            if state.files.request_refresh() {
                effects.push(Effect::FetchFiles);
            }
            effects
        }
        Msg::UrlInputChanged(text) => {
            if state.form.url != text {
                state.form.url = text;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PresetSelected(preset) => {
            if state.form.preset != preset {
                state.form.preset = preset;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::UseCookiesToggled(enabled) => {
            let enabled = enabled && state.defaults.cookies_available;
            if state.form.use_cookies != enabled {
                state.form.use_cookies = enabled;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ClearUrlClicked => {
            if !state.form.url.is_empty() {
                state.form.url.clear();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ClearLogClicked => {
            if state.tracker.clear_logs() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SubmitClicked => {
            // The form is locked while a job is active or a submission is pending.
            if state.tracker.is_active() || state.pending_submission.is_some() {
                return (state, Vec::new());
            }
            match validate(&state.form, &state.defaults) {
                Ok(submission) => {
                    state.pending_submission = Some(submission.clone());
                    state.set_status("Starting...");
                    state.mark_dirty();
                    vec![Effect::SubmitJob(submission)]
                }
                Err(err) => {
                    state.set_status(err.to_string());
                    Vec::new()
                }
            }
        }
        Msg::JobSubmitted(result) => {
            let submission = state.pending_submission.take();
            state.mark_dirty();
            match result {
                Ok(SubmitOutcome::Job(job_id)) => start_tracking(&mut state, job_id, submission),
                Ok(SubmitOutcome::Batch { count }) => {
                    watch_info!("Server started {} tasks from one submission", count);
                    state.set_status(format!("Started {count} tasks"));
                    poll_tasks_now(&mut state)
                }
                Err(message) => {
                    watch_warn!("Submission rejected: {}", message);
                    state.set_status(message);
                    Vec::new()
                }
            }
        }
        Msg::TrackJob(job_id) => {
            // The pending submission claims the tracker when it resolves.
            if state.pending_submission.is_some() {
                watch_warn!("Not tracking job {}: a submission is pending", job_id);
                state.set_status(SUBMISSION_PENDING);
                Vec::new()
            } else {
                start_tracking(&mut state, job_id, None)
            }
        }
        Msg::StopTrackingClicked => {
            if state.tracker.stop() {
                state.set_status("Stopped");
                state.mark_dirty();
                vec![Effect::CancelTimer {
                    timer: TimerKind::JobStatus,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::Tick(TimerKind::JobStatus) => match state.tracker.begin_poll() {
            Some(poll) => vec![Effect::FetchStatus(poll)],
            None => Vec::new(),
        },
        Msg::Tick(TimerKind::TaskList) => match state.tasks.begin_poll() {
            Some(epoch) => vec![Effect::FetchTasks { epoch }],
            None => Vec::new(),
        },
        Msg::StatusFetched { epoch, result } => {
            let outcome = match result {
                Ok(response) => state.tracker.apply_status(epoch, response),
                Err(err) => {
                    watch_warn!("Status request failed: {}", err);
                    state.tracker.apply_transport_failure(epoch, STATUS_FETCH_FAILED)
                }
            };
            on_poll_outcome(&mut state, outcome)
        }
        Msg::TasksFetched { epoch, result } => {
            let changed = match result {
                Ok(tasks) => state.tasks.apply_snapshot(epoch, tasks),
                Err(err) => state.tasks.apply_failure(epoch, err),
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FilesFetched(result) => {
            let follow_up = match result {
                Ok(files) => {
                    state.mark_dirty();
                    state.files.apply_snapshot(files)
                }
                Err(err) => state.files.apply_failure(&err),
            };
            if follow_up {
                vec![Effect::FetchFiles]
            } else {
                Vec::new()
            }
        }
        Msg::RefreshFilesClicked => refresh_files(&mut state),
    };

    (state, effects)
}

fn start_tracking(state: &mut AppState, job_id: JobId, submission: Option<Submission>) -> Vec<Effect> {
    match state.tracker.start_tracking(job_id, submission) {
        Ok(_) => {
            state.set_status("Starting...");
            state.mark_dirty();
            let mut effects = vec![Effect::StartTimer {
                timer: TimerKind::JobStatus,
                interval: state.intervals.status,
            }];
            if let Some(poll) = state.tracker.begin_poll() {
                effects.push(Effect::FetchStatus(poll));
            }
            effects
        }
        Err(err) => {
            watch_warn!("Not tracking new job: {}", err);
            state.set_status(err.to_string());
            Vec::new()
        }
    }
}

fn on_poll_outcome(state: &mut AppState, outcome: PollOutcome) -> Vec<Effect> {
    match outcome {
        PollOutcome::Stale => Vec::new(),
        PollOutcome::Progressed => {
            if let Some(label) = state.tracker.job().map(|job| job.status_label.clone()) {
                state.set_status(label);
            }
            state.mark_dirty();
            Vec::new()
        }
        PollOutcome::Finished { success } => {
            state.mark_dirty();
            let mut effects = vec![Effect::CancelTimer {
                timer: TimerKind::JobStatus,
            }];
            if success {
                state.set_status("Done");
                effects.extend(refresh_files(state));
            } else {
                state.set_status("Failed");
            }
            effects
        }
        PollOutcome::Aborted => {
            state.set_status("Failed to fetch status.");
            state.mark_dirty();
            vec![Effect::CancelTimer {
                timer: TimerKind::JobStatus,
            }]
        }
    }
}

fn refresh_files(state: &mut AppState) -> Vec<Effect> {
    if state.files.request_refresh() {
        vec![Effect::FetchFiles]
    } else {
        Vec::new()
    }
}

fn poll_tasks_now(state: &mut AppState) -> Vec<Effect> {
    match state.tasks.begin_poll() {
        Some(epoch) => vec![Effect::FetchTasks { epoch }],
        None => Vec::new(),
    }
}
