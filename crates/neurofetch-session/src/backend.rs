//! Retrieval backend adapter: ingestion, question answering, and the
//! agent roster over HTTP.

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::SessionError;
use crate::model::{AgentRoster, QueryAnswer, StagedFile};

/// Agent label used when the backend does not name one.
pub const UNKNOWN_AGENT: &str = "Unknown";

pub trait RetrievalBackend: Send + Sync {
    /// Submit a batch of documents for ingestion.
    fn ingest(&self, files: &[StagedFile]) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn query(&self, question: &str)
    -> impl Future<Output = Result<QueryAnswer, SessionError>> + Send;

    fn agents(&self) -> impl Future<Output = Result<AgentRoster, SessionError>> + Send;
}

#[derive(Deserialize)]
struct UploadBody {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChatBody {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    agent: Option<Value>,
    #[serde(default)]
    agent_name: Option<Value>,
    #[serde(default)]
    trace: Option<Value>,
}

#[derive(Deserialize)]
struct FailureBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpRetrievalBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRetrievalBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Read the body and decode it, turning non-success statuses into
    /// `BackendRejected` with whatever `error` the backend supplied.
    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SessionError> {
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        if !status.is_success() {
            let reason = serde_json::from_slice::<FailureBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| status.to_string());
            return Err(SessionError::BackendRejected(reason));
        }

        serde_json::from_slice(&body).map_err(|e| SessionError::MalformedResponse(e.to_string()))
    }
}

fn transport(e: reqwest::Error) -> SessionError {
    if e.is_decode() {
        SessionError::MalformedResponse(e.to_string())
    } else {
        SessionError::BackendUnavailable(e.to_string())
    }
}

/// Strings pass through; anything else is shown as JSON text.
fn render(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// A present, non-empty label. Non-string labels are shown as JSON text.
fn label(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        other => Some(render(other)).filter(|s| !s.is_empty()),
    }
}

/// Trace steps in order. A lone non-array value is a single step.
fn trace_steps(value: Option<Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(steps)) => steps.into_iter().map(render).collect(),
        Some(other) => vec![render(other)],
    }
}

fn rejected(error: Option<String>) -> SessionError {
    SessionError::BackendRejected(error.unwrap_or_else(|| "request failed".to_string()))
}

impl RetrievalBackend for HttpRetrievalBackend {
    #[instrument(skip_all, fields(files = files.len()))]
    async fn ingest(&self, files: &[StagedFile]) -> Result<(), SessionError> {
        let mut form = Form::new();
        for file in files {
            let part = Part::stream_with_length(file.data.clone(), file.size)
                .file_name(file.name.clone());
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let body: UploadBody = Self::read(response).await?;
        match body.success {
            Some(true) => {
                debug!("ingestion accepted");
                Ok(())
            }
            _ => Err(rejected(body.error)),
        }
    }

    async fn query(&self, question: &str) -> Result<QueryAnswer, SessionError> {
        let response = self
            .client
            .post(self.url("/chat"))
            .json(&serde_json::json!({ "message": question }))
            .send()
            .await
            .map_err(transport)?;

        let body: ChatBody = Self::read(response).await?;
        if body.success == Some(false) {
            return Err(rejected(body.error));
        }

        let content = body.response.map(render).ok_or_else(|| {
            SessionError::MalformedResponse("answer has no `response` field".to_string())
        })?;
        let agent = label(body.agent)
            .or_else(|| label(body.agent_name))
            .unwrap_or_else(|| UNKNOWN_AGENT.to_string());
        let trace = trace_steps(body.trace);

        Ok(QueryAnswer {
            content,
            agent,
            trace,
        })
    }

    async fn agents(&self) -> Result<AgentRoster, SessionError> {
        let response = self
            .client
            .get(self.url("/agents"))
            .send()
            .await
            .map_err(transport)?;

        let body: Value = Self::read(response).await?;
        let Value::Object(map) = body else {
            return Err(SessionError::MalformedResponse(
                "agent roster is not an object".to_string(),
            ));
        };

        Ok(map.into_iter().map(|(name, status)| (name, render(status))).collect())
    }
}
