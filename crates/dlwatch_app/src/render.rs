//! Plain-text rendering of the view-model.
//!
//! The renderer remembers what it already printed and emits only what
//! changed, so the terminal reads like a log of the session.

use dlwatch_core::{AppViewModel, FileRowView, TaskRowView, TrackerPhase, TrackerView};

#[derive(Debug, Default)]
pub struct TextRenderer {
    form: Option<String>,
    status: Option<String>,
    job_id: Option<String>,
    printed_logs: usize,
    progress: Option<String>,
    job_error: Option<String>,
    tasks: Option<Vec<String>>,
    tasks_error: Option<String>,
    files: Option<Vec<String>>,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for `view`, given everything rendered so far.
    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut out = Vec::new();

        let form = form_line(view);
        if self.form.as_ref() != Some(&form) {
            out.push(form.clone());
            self.form = Some(form);
        }

        if self.status.as_deref() != Some(view.status_text.as_str()) {
            out.push(format!("status: {}", view.status_text));
            self.status = Some(view.status_text.clone());
        }

        self.render_tracker(&view.tracker, &mut out);
        self.render_tasks(view, &mut out);
        self.render_files(view, &mut out);
        out
    }

    fn render_tracker(&mut self, tracker: &TrackerView, out: &mut Vec<String>) {
        if tracker.job_id != self.job_id {
            self.job_id = tracker.job_id.clone();
            self.printed_logs = 0;
            self.progress = None;
            self.job_error = None;
            if let Some(id) = &tracker.job_id {
                match &tracker.url {
                    Some(url) => out.push(format!("job {id}: {url}")),
                    None => out.push(format!("job {id}")),
                }
            }
        }
        if tracker.job_id.is_none() {
            return;
        }

        // The log view was cleared; the cursor stays, new lines keep coming.
        if tracker.logs.len() < self.printed_logs {
            self.printed_logs = 0;
        }
        for line in &tracker.logs[self.printed_logs..] {
            out.push(format!("  | {line}"));
        }
        self.printed_logs = tracker.logs.len();

        let progress = progress_line(tracker);
        if self.progress.as_ref() != Some(&progress) {
            out.push(progress.clone());
            self.progress = Some(progress);
        }

        if tracker.error != self.job_error {
            if let Some(error) = &tracker.error {
                out.push(format!("  error: {error}"));
            }
            self.job_error = tracker.error.clone();
        }
    }

    fn render_tasks(&mut self, view: &AppViewModel, out: &mut Vec<String>) {
        let mut block = vec![format!(
            "tasks: {} total, {} active",
            view.tasks.len(),
            view.active_count
        )];
        block.extend(view.tasks.iter().map(task_line));
        if self.tasks.as_ref() != Some(&block) {
            out.extend(block.iter().cloned());
            self.tasks = Some(block);
        }

        if view.tasks_error != self.tasks_error {
            if let Some(error) = &view.tasks_error {
                out.push(format!("tasks: refresh failed ({error})"));
            }
            self.tasks_error = view.tasks_error.clone();
        }
    }

    fn render_files(&mut self, view: &AppViewModel, out: &mut Vec<String>) {
        if !view.files_loaded {
            return;
        }
        let mut block = vec![format!("files in {}:", view.form.download_dir)];
        if view.files.is_empty() {
            block.push("  (none)".to_string());
        }
        block.extend(view.files.iter().map(file_line));
        if self.files.as_ref() != Some(&block) {
            out.extend(block.iter().cloned());
            self.files = Some(block);
        }
    }
}

fn form_line(view: &AppViewModel) -> String {
    let form = &view.form;
    let cookies = if !form.cookies_enabled {
        "unavailable"
    } else if form.use_cookies {
        "on"
    } else {
        "off"
    };
    format!(
        "preset: {} | cookies: {} | {}",
        form.preset,
        cookies,
        if form.submit_enabled {
            form.submit_label
        } else {
            "busy"
        }
    )
}

fn progress_line(tracker: &TrackerView) -> String {
    let phase = match tracker.phase {
        TrackerPhase::Idle => "idle",
        TrackerPhase::Starting => "starting",
        TrackerPhase::Running => "running",
        TrackerPhase::Done => "done",
        TrackerPhase::Failed => "failed",
    };
    format!(
        "  [{phase}] {:>3}% {}",
        tracker.progress, tracker.status_label
    )
}

pub fn task_line(task: &TaskRowView) -> String {
    let id = task.id.as_deref().unwrap_or("-");
    let mut line = format!(
        "  {id:<10} {:>3}% {:<24} {}",
        task.progress, task.status_label, task.title
    );
    if let Some(error) = &task.error {
        line.push_str(&format!(" ({error})"));
    }
    line
}

pub fn file_line(file: &FileRowView) -> String {
    format!(
        "  {:<40} {:>10}  {}  {}",
        file.name, file.size_text, file.mtime_text, file.href
    )
}
