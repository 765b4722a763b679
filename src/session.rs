use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// One source file returned by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub filename: String,
    pub content: String,
    pub language: String,
}

/// The result set currently on screen.
///
/// `active_index` always points into `files` when `files` is non-empty.
/// Sessions are replaced wholesale on every successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: String,
    files: Vec<GeneratedFile>,
    active_index: usize,
    /// The prompt as echoed back by the service.
    pub prompt: Option<String>,
    /// The prompt after server-side enhancement, when it was requested.
    pub enhanced_prompt: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>, files: Vec<GeneratedFile>) -> Self {
        Self {
            id: id.into(),
            files,
            active_index: 0,
            prompt: None,
            enhanced_prompt: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// The file under the active tab, or `None` for an empty session.
    pub fn active_file(&self) -> Option<&GeneratedFile> {
        self.files.get(self.active_index)
    }

    /// Move the active tab. Out-of-range indices leave the session untouched.
    pub fn select(&mut self, index: usize) -> Result<&GeneratedFile, ClientError> {
        if index >= self.files.len() {
            return Err(ClientError::InvalidIndex {
                index,
                len: self.files.len(),
            });
        }
        self.active_index = index;
        Ok(&self.files[index])
    }
}
