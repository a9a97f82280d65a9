use crate::{Epoch, FileEntry, JobId, StatusResponse, SubmitOutcome, TaskSummary, TimerKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Start background polling (task list and initial file listing).
    AppStarted,
    /// User edited the URL field.
    UrlInputChanged(String),
    /// User picked a preset by name.
    PresetSelected(String),
    /// User toggled the cookies checkbox.
    UseCookiesToggled(bool),
    /// User submitted the form.
    SubmitClicked,
    /// User cleared the URL field.
    ClearUrlClicked,
    /// User cleared the log pane.
    ClearLogClicked,
    /// User asked for a file listing refresh.
    RefreshFilesClicked,
    /// User stopped tracking the current job.
    StopTrackingClicked,
    /// Track a job id obtained outside this session.
    TrackJob(JobId),
    /// Submission request resolved.
    JobSubmitted(Result<SubmitOutcome, String>),
    /// A recurring timer fired.
    Tick(TimerKind),
    /// Status poll resolved for the session identified by `epoch`.
    StatusFetched {
        epoch: Epoch,
        result: Result<StatusResponse, String>,
    },
    /// Task list poll resolved.
    TasksFetched {
        epoch: Epoch,
        result: Result<Vec<TaskSummary>, String>,
    },
    /// File listing resolved.
    FilesFetched(Result<Vec<FileEntry>, String>),
}
