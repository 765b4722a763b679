//! Wire types and HTTP backend for the code-generation service.
//!
//! ```rust,ignore
//! let backend = HttpBackend::builder("http://localhost:8000")
//!     .request_timeout(Duration::from_secs(60))
//!     .build();
//! let resp = backend.generate(&GenerateRequest::new("a todo app", true)).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::session::{GeneratedFile, Session};

// -- Wire types -------------------------------------------------------------

/// Body of `POST /generate-code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub enhance_prompt: bool,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, enhance_prompt: bool) -> Self {
        Self {
            prompt: prompt.into(),
            enhance_prompt,
        }
    }
}

/// Response of `POST /generate-code`; also the element type of `GET /history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub id: String,
    pub files: Vec<GeneratedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<String>,
}

/// A stored session as listed by `GET /history`.
pub type HistoryEntry = GenerateResponse;

impl From<GenerateResponse> for Session {
    fn from(resp: GenerateResponse) -> Self {
        let mut session = Session::new(resp.id, resp.files);
        session.prompt = resp.prompt;
        session.enhanced_prompt = resp.enhanced_prompt;
        session
    }
}

// -- Backend seam -----------------------------------------------------------

/// The three calls the controller makes against the service.
///
/// [`HttpBackend`] is the real implementation; tests substitute their own.
pub trait GenerationBackend: Send + Sync {
    fn generate(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<GenerateResponse, ClientError>> + Send;

    fn download(
        &self,
        session_id: &str,
        filename: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;

    fn history(&self) -> impl Future<Output = Result<Vec<HistoryEntry>, ClientError>> + Send;

    /// URL generation requests are posted to.
    fn generate_url(&self) -> String;

    /// URL a download for `filename` would be fetched from.
    fn download_url(&self, session_id: &str, filename: &str) -> String;
}

// -- HTTP implementation ----------------------------------------------------

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Base URL of the service (e.g. `http://localhost:8000`).
    pub base_url: String,
    /// TCP connection timeout.
    pub connect_timeout: Duration,
    /// Per-request timeout enforced by reqwest.
    pub request_timeout: Duration,
}

impl HttpBackendConfig {
    /// - connect_timeout: 30 s
    /// - request_timeout: 120 s (generation is slow)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }
}

pub struct HttpBackend {
    config: HttpBackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn builder(base_url: impl Into<String>) -> HttpBackendBuilder {
        HttpBackendBuilder::new(base_url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| ClientError::Config(format!(
            "invalid base url '{}': {e}",
            self.config.base_url
        )))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("base url '{}' cannot carry a path", self.config.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn map_send_error(&self, url: &Url, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
                after: self.config.request_timeout,
            }
        } else {
            ClientError::Connect {
                url: url.to_string(),
                detail: e.to_string(),
            }
        }
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, ClientError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        if !resp.status().is_success() {
            return Err(ClientError::Http {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.map_send_error(&url, e))?;
        Ok(bytes.to_vec())
    }
}

fn decode<T: for<'de> Deserialize<'de>>(url: &Url, bytes: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(bytes).map_err(|e| ClientError::Json {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

impl GenerationBackend for HttpBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ClientError> {
        let url = self.endpoint(&["generate-code"])?;
        debug!(%url, enhance = request.enhance_prompt, "POST generate-code");

        let resp = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            warn!(%url, status, "generation request rejected");
            return Err(ClientError::Http {
                status,
                url: url.to_string(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.map_send_error(&url, e))?;
        decode(&url, &bytes)
    }

    async fn download(&self, session_id: &str, filename: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint(&["download", session_id, filename])?;
        debug!(%url, "GET download");
        self.get_bytes(url).await
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        let url = self.endpoint(&["history"])?;
        debug!(%url, "GET history");
        let bytes = self.get_bytes(url.clone()).await?;
        decode(&url, &bytes)
    }

    fn generate_url(&self) -> String {
        self.endpoint(&["generate-code"])
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}/generate-code", self.config.base_url))
    }

    fn download_url(&self, session_id: &str, filename: &str) -> String {
        self.endpoint(&["download", session_id, filename])
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}/download/{session_id}/{filename}", self.config.base_url))
    }
}

/// Builder for [`HttpBackend`].
pub struct HttpBackendBuilder {
    config: HttpBackendConfig,
}

impl HttpBackendBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: HttpBackendConfig::new(base_url),
        }
    }

    /// Override the TCP connect timeout (default 30 s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Override the per-request timeout (default 120 s).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> HttpBackend {
        // reqwest::Client::builder() can fail in extreme environments;
        // fall back to a default client instead of panicking.
        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .build()
            .unwrap_or_default();

        HttpBackend {
            config: self.config,
            client,
        }
    }
}
