//! Test doubles: a scripted backend and a view that records every call.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use codegen_client::view::{ErrorPanel, ResultsFrame, View};
use codegen_client::{ClientError, GenerateRequest, GenerateResponse, GeneratedFile, GenerationBackend, HistoryEntry};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Loading(String),
    Results(ResultsFrame),
    Error(ErrorPanel),
    Alert(String),
    Downloaded(PathBuf),
    Cleared,
}

#[derive(Clone, Default)]
pub struct RecordingView {
    pub events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_results(&self) -> Option<ResultsFrame> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Results(f) => Some(f),
            _ => None,
        })
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Alert(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<ErrorPanel> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Error(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn push(&self, e: ViewEvent) {
        self.events.lock().unwrap().push(e);
    }
}

impl View for RecordingView {
    fn show_loading(&mut self, prompt: &str) {
        self.push(ViewEvent::Loading(prompt.to_string()));
    }
    fn show_results(&mut self, frame: &ResultsFrame) {
        self.push(ViewEvent::Results(frame.clone()));
    }
    fn show_error(&mut self, panel: &ErrorPanel) {
        self.push(ViewEvent::Error(panel.clone()));
    }
    fn alert(&mut self, message: &str) {
        self.push(ViewEvent::Alert(message.to_string()));
    }
    fn downloaded(&mut self, path: &Path) {
        self.push(ViewEvent::Downloaded(path.to_path_buf()));
    }
    fn clear(&mut self) {
        self.push(ViewEvent::Cleared);
    }
}

/// What the fake service does for a given prompt.
#[derive(Clone)]
pub enum Reply {
    Ok(GenerateResponse),
    Status(u16),
    Hang,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub replies: Arc<Mutex<HashMap<String, (Duration, Reply)>>>,
    pub requests: Arc<Mutex<Vec<GenerateRequest>>>,
    pub downloads: Arc<Mutex<Vec<(String, String)>>>,
    pub history: Arc<Mutex<Vec<HistoryEntry>>>,
    pub failing_downloads: Arc<Mutex<Vec<String>>>,
    pub history_delay: Arc<Mutex<Duration>>,
}

impl FakeBackend {
    pub fn reply(&self, prompt: &str, delay: Duration, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(prompt.to_string(), (delay, reply));
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn delay_history(&self, delay: Duration) {
        *self.history_delay.lock().unwrap() = delay;
    }

    pub fn downloads(&self) -> Vec<(String, String)> {
        self.downloads.lock().unwrap().clone()
    }
}

impl GenerationBackend for FakeBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        let scripted = self.replies.lock().unwrap().get(&request.prompt).cloned();
        let (delay, reply) = scripted.unwrap_or((Duration::ZERO, Reply::Status(404)));
        tokio::time::sleep(delay).await;
        match reply {
            Reply::Ok(resp) => Ok(resp),
            Reply::Status(status) => Err(ClientError::Http {
                status,
                url: self.generate_url(),
            }),
            Reply::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    async fn download(&self, session_id: &str, filename: &str) -> Result<Vec<u8>, ClientError> {
        self.downloads
            .lock()
            .unwrap()
            .push((session_id.to_string(), filename.to_string()));
        if self.failing_downloads.lock().unwrap().iter().any(|f| f == filename) {
            return Err(ClientError::Http {
                status: 404,
                url: self.download_url(session_id, filename),
            });
        }
        Ok(format!("bytes of {filename}").into_bytes())
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        let delay = *self.history_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        Ok(self.history.lock().unwrap().clone())
    }

    fn generate_url(&self) -> String {
        "http://fake/generate-code".to_string()
    }

    fn download_url(&self, session_id: &str, filename: &str) -> String {
        format!("http://fake/download/{session_id}/{filename}")
    }
}

pub fn file(name: &str, language: &str) -> GeneratedFile {
    GeneratedFile {
        filename: name.to_string(),
        content: format!("contents of {name}"),
        language: language.to_string(),
    }
}

pub fn response(id: &str, files: Vec<GeneratedFile>) -> GenerateResponse {
    GenerateResponse {
        id: id.to_string(),
        files,
        prompt: None,
        enhanced_prompt: None,
    }
}
