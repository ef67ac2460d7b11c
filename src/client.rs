use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::JudgeConfig;
use crate::error::{EngineError, EngineResult};

/// Opaque handle of a job created on the remote judge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionHandle(String);

impl SubmissionHandle {
    pub fn new(link: impl Into<String>) -> Self {
        Self(link.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a remote job. Ordered so that a later state compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Queued,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub state: SubmissionState,
    pub result_code: Option<i64>,
}

impl SubmissionStatus {
    /// Interprets the judge's status word: negative is queued, zero is running,
    /// anything else is the result code of a finished job.
    pub fn from_wire(status: i64) -> Self {
        match status {
            s if s < 0 => Self {
                state: SubmissionState::Queued,
                result_code: None,
            },
            0 => Self {
                state: SubmissionState::Running,
                result_code: None,
            },
            code => Self {
                state: SubmissionState::Finished,
                result_code: Some(code),
            },
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == SubmissionState::Finished
    }
}

/// Full outcome of a finished remote job
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionDetails {
    pub result_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub compile_info: String,
    pub cpu_time_ms: u64,
    pub memory_kb: u64,
}

/// Transport to the remote judge.
///
/// Implementations never retry; retry policy belongs to the caller.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn create_submission(
        &self,
        source_code: &str,
        language_id: u32,
        stdin: &str,
    ) -> EngineResult<SubmissionHandle>;

    /// Side-effect free and safe to call repeatedly
    async fn get_status(&self, handle: &SubmissionHandle) -> EngineResult<SubmissionStatus>;

    /// Only meaningful once a `Finished` status has been observed
    async fn get_details(&self, handle: &SubmissionHandle) -> EngineResult<SubmissionDetails>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSubmissionRequest<'a> {
    source_code: &'a str,
    language: u32,
    input: &'a str,
    private: bool,
}

#[derive(Deserialize)]
struct CreateSubmissionResponse {
    link: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: i64,
}

#[derive(Deserialize)]
struct DetailsResponse {
    result: i64,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    cmpinfo: Option<String>,
    /// CPU time in seconds
    #[serde(default)]
    time: f64,
    /// Peak memory in KB
    #[serde(default)]
    memory: u64,
}

impl From<DetailsResponse> for SubmissionDetails {
    fn from(raw: DetailsResponse) -> Self {
        Self {
            result_code: raw.result,
            stdout: raw.output.unwrap_or_default(),
            stderr: raw.stderr.unwrap_or_default(),
            compile_info: raw.cmpinfo.unwrap_or_default(),
            cpu_time_ms: (raw.time.max(0.0) * 1000.0).round() as u64,
            memory_kb: raw.memory,
        }
    }
}

/// HTTP client for the remote judge REST API
pub struct HttpJudgeClient {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl HttpJudgeClient {
    pub fn new(config: &JudgeConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms()))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token(),
            client,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.query(&[("access_token", token.as_str())]),
            None => request,
        }
    }
}

/// Rejects non-2xx responses and decodes the body into a typed shape
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> EngineResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(EngineError::transport(format!(
            "judge responded with {status}"
        )));
    }

    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| EngineError::transport(format!("malformed judge response: {e}")))
}

#[async_trait]
impl JudgeClient for HttpJudgeClient {
    async fn create_submission(
        &self,
        source_code: &str,
        language_id: u32,
        stdin: &str,
    ) -> EngineResult<SubmissionHandle> {
        let url = format!("{}/submissions", self.base_url);
        let request = self.client.post(&url).json(&CreateSubmissionRequest {
            source_code,
            language: language_id,
            input: stdin,
            private: true,
        });

        let response = self.authorize(request).send().await?;
        let created: CreateSubmissionResponse = decode(response).await?;

        if created.link.is_empty() {
            return Err(EngineError::transport("judge returned an empty link"));
        }

        Ok(SubmissionHandle::new(created.link))
    }

    async fn get_status(&self, handle: &SubmissionHandle) -> EngineResult<SubmissionStatus> {
        let url = format!("{}/submissions/{handle}/status", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let status: StatusResponse = decode(response).await?;

        Ok(SubmissionStatus::from_wire(status.status))
    }

    async fn get_details(&self, handle: &SubmissionHandle) -> EngineResult<SubmissionDetails> {
        let url = format!("{}/submissions/{handle}", self.base_url);
        let request = self.client.get(&url).query(&[
            ("withOutput", "1"),
            ("withStderr", "1"),
            ("withCmpinfo", "1"),
        ]);
        let response = self.authorize(request).send().await?;
        let details: DetailsResponse = decode(response).await?;

        Ok(details.into())
    }
}
