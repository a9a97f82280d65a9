use std::path::{Path, PathBuf};
use std::time::Duration;

use dlwatch_core::{
    encode_component, FileEntry, FilesResponse, StartResponse, StatusResponse, Submission,
    SubmitOutcome, TaskSummary, TasksResponse,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::de::DeserializeOwned;
use watch_logging::{watch_debug, watch_trace};

use crate::artifact::{self, DownloadError};
use crate::{FailureKind, TransportError};

/// Fallback when a rejected submission carries no `error` text.
const START_FAILED: &str = "Failed to start download.";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The server collaborator, one method per endpoint the trackers consume.
#[async_trait::async_trait]
pub trait DownloaderApi: Send + Sync {
    async fn start_job(&self, submission: &Submission) -> Result<SubmitOutcome, TransportError>;

    async fn fetch_status(&self, job_id: &str, after: u64)
        -> Result<StatusResponse, TransportError>;

    async fn fetch_tasks(&self) -> Result<Vec<TaskSummary>, TransportError>;

    async fn fetch_files(&self) -> Result<Vec<FileEntry>, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, TransportError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::new(
                FailureKind::InvalidUrl,
                format!("{base} cannot be used as a base url"),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute url of `GET /download/{name}`.
    pub fn artifact_url(&self, name: &str) -> Result<Url, TransportError> {
        let mut url = self.endpoint(&["download"])?;
        // Pre-encoded, so set_path keeps the escapes as they are.
        let path = format!("{}/{}", url.path(), encode_component(name));
        url.set_path(&path);
        Ok(url)
    }

    /// Streams one artifact into `dest_dir`, replacing a file of the same
    /// name only once the whole body arrived.
    pub async fn download_artifact(
        &self,
        name: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let url = self.artifact_url(name)?;
        watch_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = check_status(response)?;
        artifact::write_stream(response, dest_dir, name).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::new(FailureKind::InvalidUrl, "base url cannot carry a path")
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        watch_trace!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = check_status(response)?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl DownloaderApi for ReqwestApi {
    async fn start_job(&self, submission: &Submission) -> Result<SubmitOutcome, TransportError> {
        let url = self.endpoint(&["api", "start"])?;
        let payload = serde_json::to_vec(submission)
            .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))?;
        watch_debug!("POST {} preset={}", url, submission.preset);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed = serde_json::from_slice::<StartResponse>(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|body| body.error)
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| START_FAILED.to_string());
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        let body = parsed.map_err(|err| {
            watch_debug!("Unreadable start response: {}", err);
            TransportError::new(FailureKind::Decode, START_FAILED)
        })?;
        let error = body.error.clone().filter(|text| !text.trim().is_empty());
        body.into_outcome().ok_or_else(|| {
            watch_debug!("Start response carried neither job_id nor count");
            TransportError::new(
                FailureKind::Decode,
                error.unwrap_or_else(|| START_FAILED.to_string()),
            )
        })
    }

    async fn fetch_status(&self, job_id: &str, after: u64) -> Result<StatusResponse, TransportError> {
        let mut url = self.endpoint(&["api", "status", job_id])?;
        url.query_pairs_mut().append_pair("after", &after.to_string());
        self.get_json(url).await
    }

    async fn fetch_tasks(&self) -> Result<Vec<TaskSummary>, TransportError> {
        let url = self.endpoint(&["api", "tasks"])?;
        let body: TasksResponse = self.get_json(url).await?;
        Ok(body.into_summaries())
    }

    async fn fetch_files(&self) -> Result<Vec<FileEntry>, TransportError> {
        let url = self.endpoint(&["api", "files"])?;
        let body: FilesResponse = self.get_json(url).await?;
        Ok(body.into_entries())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TransportError::new(
            FailureKind::HttpStatus(status.as_u16()),
            format!("http status {}", status.as_u16()),
        ))
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return TransportError::new(FailureKind::Decode, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
