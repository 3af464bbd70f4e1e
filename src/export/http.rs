use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::export::remote::{ExportJobRequest, JobStatus, RemoteCompositor, SubmittedJob};
use crate::foundation::error::{PosterError, PosterResult};
use crate::snap::engine::SnapSettings;

/// [`RemoteCompositor`] over the backend's HTTP job API.
#[derive(Clone, Debug)]
pub struct HttpRemote {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> PosterResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PosterError::remote(format!("http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    fn send(&self, req: RequestBuilder, what: &str) -> PosterResult<Response> {
        let resp = self
            .authed(req)
            .send()
            .map_err(|e| PosterError::remote(format!("{what}: {e}")))?;
        if !resp.status().is_success() {
            return Err(PosterError::remote(format!("{what}: HTTP {}", resp.status())));
        }
        Ok(resp)
    }
}

impl RemoteCompositor for HttpRemote {
    fn submit(&mut self, request: &ExportJobRequest) -> PosterResult<SubmittedJob> {
        let req = self.client.post(self.url("/exports")).json(request);
        self.send(req, "POST /exports")?
            .json()
            .map_err(|e| PosterError::remote(format!("POST /exports reply: {e}")))
    }

    fn job_status(&mut self, job_id: &str) -> PosterResult<JobStatus> {
        let req = self.client.get(self.url(&format!("/jobs/{job_id}")));
        self.send(req, "GET /jobs")?
            .json()
            .map_err(|e| PosterError::remote(format!("GET /jobs reply: {e}")))
    }

    fn fetch(&mut self, file_url: &str) -> PosterResult<Vec<u8>> {
        let resp = self.send(self.client.get(file_url), "download export")?;
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| PosterError::remote(format!("download export: {e}")))
    }

    fn load_prefs(&mut self) -> PosterResult<Option<SnapSettings>> {
        let resp = self
            .authed(self.client.get(self.url("/prefs")))
            .send()
            .map_err(|e| PosterError::remote(format!("GET /prefs: {e}")))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(PosterError::remote(format!("GET /prefs: HTTP {}", resp.status())));
        }
        resp.json()
            .map(Some)
            .map_err(|e| PosterError::remote(format!("GET /prefs reply: {e}")))
    }

    fn save_prefs(&mut self, prefs: &SnapSettings) -> PosterResult<()> {
        let req = self.client.put(self.url("/prefs")).json(prefs);
        self.send(req, "PUT /prefs")?;
        Ok(())
    }
}
