use crate::files::download_path;
use crate::format::{format_bytes, format_mtime};
use crate::{AppState, JobStatus, TrackerPhase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub form: FormView,
    pub status_text: String,
    pub tracker: TrackerView,
    pub tasks: Vec<TaskRowView>,
    pub active_count: usize,
    pub tasks_error: Option<String>,
    pub files: Vec<FileRowView>,
    pub files_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormView {
    pub url: String,
    pub preset: String,
    pub presets: Vec<String>,
    pub use_cookies: bool,
    pub cookies_enabled: bool,
    pub cookie_hint: String,
    pub download_dir: String,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerView {
    pub phase: TrackerPhase,
    pub job_id: Option<String>,
    pub url: Option<String>,
    pub status_label: String,
    pub progress: u8,
    pub log_cursor: u64,
    pub logs: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRowView {
    pub id: Option<String>,
    pub title: String,
    pub url: String,
    pub status: JobStatus,
    pub status_label: String,
    pub progress: u8,
    pub done: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub name: String,
    pub size_text: String,
    pub mtime_text: String,
    pub href: String,
}

/// Projects tracked state onto what a renderer needs. No I/O, no mutation.
pub fn project(state: &AppState) -> AppViewModel {
    let busy = state.tracker.is_active() || state.is_submitting();
    let defaults = &state.defaults;

    let form = FormView {
        url: state.form.url.clone(),
        preset: state.form.preset.clone(),
        presets: defaults.presets.clone(),
        use_cookies: state.form.use_cookies && defaults.cookies_available,
        cookies_enabled: defaults.cookies_available && !busy,
        cookie_hint: defaults.cookie_hint(),
        download_dir: defaults.download_dir.clone(),
        submit_enabled: !busy,
        submit_label: if busy { "Downloading..." } else { "Start Download" },
    };

    let tracker = match state.tracker.job() {
        Some(job) => TrackerView {
            phase: state.tracker.phase(),
            job_id: Some(job.id.clone()),
            url: job.submission.as_ref().map(|s| s.url.clone()),
            status_label: job.status_label.clone(),
            progress: job.progress,
            log_cursor: job.log_cursor,
            logs: job.logs.clone(),
            error: job.error.clone(),
        },
        None => TrackerView::default(),
    };

    let tasks = state
        .tasks
        .tasks()
        .iter()
        .map(|task| TaskRowView {
            id: task.id.clone(),
            title: task.display_title().to_string(),
            url: task.url.clone(),
            status: task.status,
            status_label: task.status_label.clone(),
            progress: task.progress,
            done: task.done,
            error: task.error.clone(),
        })
        .collect();

    let files = state
        .files
        .files()
        .iter()
        .map(|file| FileRowView {
            name: file.name.clone(),
            size_text: format_bytes(file.size),
            mtime_text: format_mtime(file.mtime),
            href: download_path(&file.name),
        })
        .collect();

    AppViewModel {
        form,
        status_text: state.status_message.clone(),
        tracker,
        tasks,
        active_count: state.tasks.active_count(),
        tasks_error: state.tasks.last_error().map(str::to_string),
        files,
        files_loaded: state.files.is_loaded(),
    }
}
