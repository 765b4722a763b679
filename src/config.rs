//! Client configuration: defaults, then an optional TOML file, then
//! `CODEGEN_*` environment variables. Command-line flags are applied last by
//! `main`.
//!
//! ```toml
//! base_url = "http://localhost:8000"
//! download_dir = "./generated"
//! request_timeout_secs = 120
//! connect_timeout_secs = 30
//! enhance_prompt = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub download_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Whether prompts are enhanced server-side unless the caller says otherwise.
    pub enhance_prompt: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            download_dir: PathBuf::from("."),
            request_timeout_secs: 120,
            connect_timeout_secs: 30,
            enhance_prompt: true,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ClientError> {
        let text = std::fs::read_to_string(path).map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Overlay `CODEGEN_BASE_URL`, `CODEGEN_DOWNLOAD_DIR` and
    /// `CODEGEN_TIMEOUT_SECS` from `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CODEGEN_BASE_URL") {
            self.base_url = url;
        }
        if let Some(dir) = lookup("CODEGEN_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("CODEGEN_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("CODEGEN_TIMEOUT_SECS is not a number: '{secs}'")))?;
        }
        Ok(())
    }

    pub fn apply_env(&mut self) -> Result<(), ClientError> {
        self.apply_env_with(|k| std::env::var(k).ok())
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config("request_timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
