//! dlwatch core: pure tracker state machines and view-model projection.
mod config;
mod effect;
mod files;
mod format;
mod job;
mod msg;
mod state;
mod submit;
mod task_list;
mod tracker;
mod update;
mod view_model;
mod wire;

pub use config::{FormDefaults, PollIntervals, DEFAULT_PRESETS};
pub use effect::{Effect, TimerKind};
pub use files::{download_path, encode_component, FileEntry, FileRegistry};
pub use format::{format_bytes, format_mtime};
pub use job::{clamp_progress, Job, JobId, JobStatus};
pub use msg::Msg;
pub use state::AppState;
pub use submit::{validate, Submission, SubmitForm, SubmitOutcome, ValidationError};
pub use task_list::{TaskList, TaskSummary};
pub use tracker::{Epoch, JobTracker, PollOutcome, StatusPoll, TrackError, TrackerPhase};
pub use update::update;
pub use view_model::{project, AppViewModel, FileRowView, FormView, TaskRowView, TrackerView};
pub use wire::{FileWire, FilesResponse, StartResponse, StatusResponse, TaskWire, TasksResponse};
