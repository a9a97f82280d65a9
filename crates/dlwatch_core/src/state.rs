use crate::config::{FormDefaults, PollIntervals};
use crate::files::FileRegistry;
use crate::submit::{Submission, SubmitForm};
use crate::task_list::TaskList;
use crate::tracker::JobTracker;
use crate::view_model::{project, AppViewModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub(crate) defaults: FormDefaults,
    pub(crate) intervals: PollIntervals,
    pub(crate) form: SubmitForm,
    pub(crate) status_message: String,
    /// Submission awaiting the server's answer.
    pub(crate) pending_submission: Option<Submission>,
    pub(crate) tracker: JobTracker,
    pub(crate) tasks: TaskList,
    pub(crate) files: FileRegistry,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(FormDefaults::default(), PollIntervals::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(defaults: FormDefaults, intervals: PollIntervals) -> Self {
        Self {
            form: SubmitForm::from_defaults(&defaults),
            defaults,
            intervals,
            status_message: "Idle".to_string(),
            pending_submission: None,
            tracker: JobTracker::new(),
            tasks: TaskList::new(),
            files: FileRegistry::new(),
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        project(self)
    }

    pub fn defaults(&self) -> &FormDefaults {
        &self.defaults
    }

    pub fn form(&self) -> &SubmitForm {
        &self.form
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn files(&self) -> &FileRegistry {
        &self.files
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn is_submitting(&self) -> bool {
        self.pending_submission.is_some()
    }

    /// Returns and clears the "needs render" flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.status_message != text {
            self.status_message = text;
            self.dirty = true;
        }
    }
}
