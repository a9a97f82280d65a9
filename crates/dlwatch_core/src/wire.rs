//! JSON bodies exchanged with the download server.
//!
//! Every field the server may omit or send as `null` is lenient here; the
//! conversions into the model types own the clamping rules.

use serde::{Deserialize, Deserializer};

use crate::files::FileEntry;
use crate::job::{clamp_progress, JobStatus};
use crate::submit::SubmitOutcome;
use crate::task_list::TaskSummary;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
    Other(#[allow(dead_code)] serde::de::IgnoredAny),
}

/// Numbers pass through, numeric strings are parsed, anything else is `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseNumber>::deserialize(deserializer)? {
        Some(LooseNumber::Number(value)) => Some(value),
        Some(LooseNumber::Text(text)) => text.trim().parse().ok(),
        Some(LooseNumber::Other(_)) | None => None,
    })
}

/// Body of `POST /api/start`, both for success and error answers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StartResponse {
    /// A single job id wins over a batch count. `None` means the body
    /// carried neither and is malformed.
    pub fn into_outcome(self) -> Option<SubmitOutcome> {
        match (self.job_id, self.count) {
            (Some(job_id), _) if !job_id.trim().is_empty() => Some(SubmitOutcome::Job(job_id)),
            (_, Some(count)) => Some(SubmitOutcome::Batch { count }),
            _ => None,
        }
    }
}

/// Body of `GET /api/status/{job_id}?after={cursor}`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub progress: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<String>,
    #[serde(default)]
    pub next: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub done: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TaskWire {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub progress: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub done: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TasksResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<TaskWire>,
}

impl TasksResponse {
    pub fn into_summaries(self) -> Vec<TaskSummary> {
        self.tasks.into_iter().map(TaskSummary::from).collect()
    }
}

impl From<TaskWire> for TaskSummary {
    fn from(wire: TaskWire) -> Self {
        let label = wire.status.unwrap_or_default();
        let status = JobStatus::from_label(&label, wire.done, wire.success);
        Self {
            id: wire.id,
            title: wire.title,
            url: wire.url,
            status,
            status_label: if label.trim().is_empty() {
                status.label().to_string()
            } else {
                label
            },
            progress: clamp_progress(wire.progress),
            done: wire.done,
            success: wire.done && wire.success,
            error: wire.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FileWire {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub mtime: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FilesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<FileWire>,
}

impl FilesResponse {
    pub fn into_entries(self) -> Vec<FileEntry> {
        self.files.into_iter().map(FileEntry::from).collect()
    }
}

impl From<FileWire> for FileEntry {
    fn from(wire: FileWire) -> Self {
        Self {
            name: wire.name,
            size: wire.size,
            mtime: wire
                .mtime
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .map(|secs| secs as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_response_tolerates_nulls_and_missing_fields() {
        let resp: StatusResponse =
            serde_json::from_str(r#"{"status":"Queued","logs":null,"done":null}"#).unwrap();
        assert_eq!(resp.status.as_deref(), Some("Queued"));
        assert!(resp.logs.is_empty());
        assert!(!resp.done);
        assert_eq!(resp.next, None);
        assert_eq!(resp.progress, None);
    }

    #[test]
    fn progress_accepts_numeric_text_and_ignores_garbage() {
        let resp: StatusResponse =
            serde_json::from_str(r#"{"status":"Running","progress":"42.5","logs":[]}"#).unwrap();
        assert_eq!(resp.progress, Some(42.5));

        let tasks: TasksResponse = serde_json::from_str(
            r#"{"tasks":[
                {"id":"j1","url":"http://x/1","progress":"n/a"},
                {"id":"j2","url":"http://x/2","progress":true},
                {"id":"j3","url":"http://x/3","progress":{"pct":3}}
            ]}"#,
        )
        .unwrap();
        let summaries = tasks.into_summaries();
        assert_eq!(summaries.len(), 3);
        assert!(summaries.iter().all(|task| task.progress == 0));
    }

    #[test]
    fn start_response_prefers_job_id_then_batch_count() {
        let single: StartResponse = serde_json::from_str(r#"{"job_id":"j1"}"#).unwrap();
        assert_eq!(single.into_outcome(), Some(SubmitOutcome::Job("j1".into())));

        let batch: StartResponse =
            serde_json::from_str(r#"{"message":"Tasks started","count":3}"#).unwrap();
        assert_eq!(batch.into_outcome(), Some(SubmitOutcome::Batch { count: 3 }));

        let empty: StartResponse = serde_json::from_str(r#"{"message":"ok"}"#).unwrap();
        assert_eq!(empty.into_outcome(), None);
    }

    #[test]
    fn task_wire_falls_back_to_generic_label_and_clamps() {
        let task: TaskSummary = TaskWire {
            url: "http://x/video".into(),
            progress: Some(180.5),
            done: true,
            success: true,
            ..TaskWire::default()
        }
        .into();
        assert_eq!(task.status, JobStatus::Done);
        assert_eq!(task.status_label, "Done");
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn file_wire_drops_unusable_mtime() {
        let files: FilesResponse = serde_json::from_str(
            r#"{"files":[{"name":"a.mp4","size":10,"mtime":1700000000.75},{"name":"b.mp3","size":null,"mtime":0}]}"#,
        )
        .unwrap();
        let entries = files.into_entries();
        assert_eq!(entries[0].mtime, Some(1_700_000_000));
        assert_eq!(entries[1].size, 0);
        assert_eq!(entries[1].mtime, None);
    }
}
