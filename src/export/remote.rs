use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::export::preset::ExportFormat;
use crate::foundation::error::{PosterError, PosterResult};
use crate::snap::engine::SnapSettings;

/// Body of `POST /exports`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJobRequest {
    /// Saved project document.
    pub project_data: serde_json::Value,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

/// Reply of `POST /exports`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedJob {
    pub job_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Completed,
    Failed,
}

/// Reply of `GET /jobs/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Backend export and preference service.
pub trait RemoteCompositor {
    fn submit(&mut self, request: &ExportJobRequest) -> PosterResult<SubmittedJob>;
    fn job_status(&mut self, job_id: &str) -> PosterResult<JobStatus>;
    /// Download a finished export.
    fn fetch(&mut self, file_url: &str) -> PosterResult<Vec<u8>>;
    fn load_prefs(&mut self) -> PosterResult<Option<SnapSettings>>;
    fn save_prefs(&mut self, prefs: &SnapSettings) -> PosterResult<()>;
}

/// Fixed-interval polling with an attempt cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1500),
            max_attempts: 40,
        }
    }
}

/// Poll `job_id` until it completes, fails or runs out of attempts, then download the result.
///
/// `sleep` is called between attempts.
pub fn poll_job(
    remote: &mut dyn RemoteCompositor,
    job_id: &str,
    policy: PollPolicy,
    mut sleep: impl FnMut(Duration),
) -> PosterResult<Vec<u8>> {
    for attempt in 1..=policy.max_attempts {
        let status = remote.job_status(job_id)?;
        match status.status {
            JobState::Completed => {
                let url = status.file_url.ok_or_else(|| {
                    PosterError::remote(format!("job {job_id} completed without a file url"))
                })?;
                return remote.fetch(&url);
            }
            JobState::Failed => {
                return Err(PosterError::remote(format!(
                    "job {job_id} failed: {}",
                    status.error_message.as_deref().unwrap_or("no message")
                )));
            }
            JobState::Pending if attempt < policy.max_attempts => sleep(policy.interval),
            JobState::Pending => {}
        }
    }
    Err(PosterError::remote(format!(
        "job {job_id} still pending after {} attempts",
        policy.max_attempts
    )))
}

/// Where an export's bytes came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportRoute {
    Remote,
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOutcome {
    pub bytes: Vec<u8>,
    pub route: ExportRoute,
    /// Why the remote path was abandoned, when it was tried.
    pub remote_error: Option<String>,
}

/// Export through `remote` when given, falling back to `local` on any remote failure.
pub fn export_with_fallback(
    remote: Option<&mut dyn RemoteCompositor>,
    request: &ExportJobRequest,
    policy: PollPolicy,
    sleep: impl FnMut(Duration),
    local: impl FnOnce() -> PosterResult<Vec<u8>>,
) -> PosterResult<ExportOutcome> {
    let mut remote_error = None;
    if let Some(remote) = remote {
        let attempt = remote
            .submit(request)
            .and_then(|job| poll_job(remote, &job.job_id, policy, sleep));
        match attempt {
            Ok(bytes) => {
                info!(bytes = bytes.len(), "remote export completed");
                return Ok(ExportOutcome {
                    bytes,
                    route: ExportRoute::Remote,
                    remote_error: None,
                });
            }
            Err(e) => {
                warn!(error = %e, "remote export failed; rendering locally");
                remote_error = Some(e.to_string());
            }
        }
    }
    let bytes = local()?;
    Ok(ExportOutcome {
        bytes,
        route: ExportRoute::Local,
        remote_error,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/export/remote.rs"]
mod tests;
