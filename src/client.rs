//! Access to the analysis backend.
//!
//! [`Backend`] is the seam the session controller talks through: exactly the
//! three calls that suspend a session. [`HttpBackend`] implements it against
//! the HTTP service:
//! - `POST /upload` - multipart batch, one `file` part per document
//! - `GET /summary` - `{ "summary": "..." }`
//! - `POST /ask?query=...` - `{ "answer": "..." }`
//!
//! Non-success responses may carry a `detail` string, which is surfaced
//! verbatim.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::ClientError;
use crate::models::FileRef;

/// Multipart field name for each uploaded file.
const UPLOAD_FIELD: &str = "file";

/// What the backend reports after accepting an upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Names of the files the backend kept. `None` means all of them.
    #[serde(default)]
    pub accepted: Option<Vec<String>>,
    /// Number of chunks indexed, when the backend reports it.
    #[serde(default)]
    pub chunks: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    answer: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// The operations a session needs from the analysis service.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send a batch of files as one request.
    async fn upload(&self, files: &[FileRef]) -> Result<UploadReceipt, ClientError>;

    /// Fetch a summary of everything uploaded so far.
    async fn summary(&self) -> Result<String, ClientError>;

    /// Ask a question against the uploaded corpus.
    async fn ask(&self, query: &str) -> Result<String, ClientError>;
}

/// HTTP client for the analysis backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    generic_error: String,
    client: Client,
}

impl HttpBackend {
    /// Create a client from an explicit configuration.
    pub fn new(config: &SessionConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            generic_error: config.generic_error_message.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Backend returned an error: {}", body);
            Err(ClientError::Server(self.detail_or_generic(&body)))
        }
    }

    /// Pull the user-facing message out of an error body.
    fn detail_or_generic(&self, body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .and_then(|d| match d {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .unwrap_or_else(|| self.generic_error.clone())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, files: &[FileRef]) -> Result<UploadReceipt, ClientError> {
        let mut form = Form::new();
        for file in files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
            // Canonical type for the classified kind; the declared string may not parse.
            if let Some(kind) = file.kind() {
                part = part.mime_str(kind.mime_type())?;
            }
            form = form.part(UPLOAD_FIELD, part);
        }

        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn summary(&self) -> Result<String, ClientError> {
        let response = self.client.get(self.url("/summary")).send().await?;
        let body: SummaryResponse = self.handle_response(response).await?;
        Ok(body.summary)
    }

    async fn ask(&self, query: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.url("/ask"))
            .query(&[("query", query)])
            .send()
            .await?;
        let body: AnswerResponse = self.handle_response(response).await?;
        Ok(body.answer)
    }
}
