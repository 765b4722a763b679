//! The UI controller: prompt in, tabs out, files to disk.
//!
//! State is a single optional [`Session`] plus the [`View`] it is drawn on,
//! both behind one mutex that is never held across an `.await`.
//!
//! Submissions are epoch-stamped through a `watch` channel. Starting a new
//! submission (or reloading) bumps the epoch; any older submission still
//! waiting on the network sees the change, drops its request and returns
//! [`ClientError::Superseded`] without touching the screen. The same check is
//! repeated under the lock before a response is applied, so the latest
//! submission always wins.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{GenerateRequest, GenerationBackend, HistoryEntry};
use crate::error::ClientError;
use crate::session::{GeneratedFile, Session};
use crate::view::{ErrorPanel, ResultsFrame, View};

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Where downloaded files are written.
    pub download_dir: PathBuf,
    /// Upper bound on a single generation request, on top of any transport timeout.
    pub submit_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            submit_timeout: Duration::from_secs(120),
        }
    }
}

struct UiState<V> {
    session: Option<Session>,
    view: V,
}

pub struct UiController<B, V> {
    backend: B,
    config: ControllerConfig,
    state: Mutex<UiState<V>>,
    epoch: watch::Sender<u64>,
}

impl<B: GenerationBackend, V: View> UiController<B, V> {
    pub fn new(backend: B, view: V, config: ControllerConfig) -> Self {
        let (epoch, _) = watch::channel(0);
        Self {
            backend,
            config,
            state: Mutex::new(UiState {
                session: None,
                view,
            }),
            epoch,
        }
    }

    fn state(&self) -> MutexGuard<'_, UiState<V>> {
        // A panic inside a View must not brick the controller.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bump_epoch(&self) -> u64 {
        let mut current = 0;
        self.epoch.send_modify(|e| {
            *e += 1;
            current = *e;
        });
        current
    }

    fn is_current(&self, epoch: u64) -> bool {
        *self.epoch.borrow() == epoch
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Send `prompt` to the generation service and show the result.
    ///
    /// # Returns
    /// - `Ok(())` — the response was rendered and is now the current session.
    /// - `Err(ClientError::Superseded)` — a newer submission or a reload
    ///   replaced this one; nothing was rendered.
    /// - `Err(e)` for transport, status, decode and timeout failures; the error
    ///   panel is shown and the previous session is left in place.
    pub async fn submit_prompt(&self, prompt: &str, enhance: bool) -> Result<(), ClientError> {
        let epoch = self.bump_epoch();
        let mut rx = self.epoch.subscribe();

        self.state().view.show_loading(prompt);
        info!(epoch, enhance, prompt_len = prompt.len(), "submitting prompt");

        let request = GenerateRequest::new(prompt, enhance);
        let timeout = self.config.submit_timeout;
        let outcome = tokio::select! {
            res = tokio::time::timeout(timeout, self.backend.generate(&request)) => match res {
                Ok(r) => r,
                Err(_) => Err(ClientError::Timeout {
                    url: self.backend.generate_url(),
                    after: timeout,
                }),
            },
            _ = superseded(&mut rx, epoch) => Err(ClientError::Superseded),
        };

        let mut state = self.state();
        if !self.is_current(epoch) {
            debug!(epoch, "discarding response of superseded submission");
            return Err(ClientError::Superseded);
        }

        match outcome {
            Ok(resp) => {
                let session: Session = resp.into();
                info!(
                    epoch,
                    session_id = session.id(),
                    files = session.len(),
                    "generation succeeded"
                );
                match ResultsFrame::from_session(&session) {
                    Some(frame) => state.view.show_results(&frame),
                    None => {
                        warn!(session_id = session.id(), "service returned no files");
                        state.view.alert("The service returned no files");
                    }
                }
                state.session = Some(session);
                Ok(())
            }
            Err(e) => {
                error!(epoch, error = %e, "generation failed");
                state.view.show_error(&ErrorPanel::new(e.to_string()));
                Err(e)
            }
        }
    }

    /// Abort whatever submission is in flight without touching the screen.
    pub fn cancel_in_flight(&self) {
        let epoch = self.bump_epoch();
        debug!(epoch, "in-flight submission cancelled");
    }

    /// Retry action: full state reset.
    pub fn reload(&self) {
        let epoch = self.bump_epoch();
        let mut state = self.state();
        state.session = None;
        state.view.clear();
        info!(epoch, "state reset");
    }

    // -----------------------------------------------------------------------
    // Tabs
    // -----------------------------------------------------------------------

    /// Make tab `index` active and redraw.
    pub fn select_file(&self, index: usize) -> Result<(), ClientError> {
        let mut state = self.state();
        let UiState { session, view } = &mut *state;
        let session = session
            .as_mut()
            .ok_or(ClientError::InvalidIndex { index, len: 0 })?;
        session.select(index)?;
        if let Some(frame) = ResultsFrame::from_session(session) {
            view.show_results(&frame);
        }
        Ok(())
    }

    pub fn session(&self) -> Option<Session> {
        self.state().session.clone()
    }

    pub fn active_file(&self) -> Option<GeneratedFile> {
        self.state()
            .session
            .as_ref()
            .and_then(|s| s.active_file().cloned())
    }

    // -----------------------------------------------------------------------
    // Downloads
    // -----------------------------------------------------------------------

    /// Session id and file names, or an alert when there is nothing to download.
    fn downloadable(&self) -> Result<(String, Vec<String>, usize), ClientError> {
        let mut state = self.state();
        let found = state.session.as_ref().filter(|s| !s.is_empty()).map(|s| {
            (
                s.id().to_string(),
                s.files().iter().map(|f| f.filename.clone()).collect::<Vec<_>>(),
                s.active_index(),
            )
        });
        match found {
            Some(found) => Ok(found),
            None => {
                state.view.alert(&ClientError::NoFiles.to_string());
                Err(ClientError::NoFiles)
            }
        }
    }

    /// Fetch `filename` from the current session and save it under the
    /// download directory.
    pub async fn download_file(&self, filename: &str) -> Result<PathBuf, ClientError> {
        let (session_id, _, _) = self.downloadable()?;
        self.fetch_and_save(&session_id, filename).await
    }

    /// Download the file under the active tab.
    pub async fn download_current(&self) -> Result<PathBuf, ClientError> {
        let (session_id, names, active) = self.downloadable()?;
        self.fetch_and_save(&session_id, &names[active]).await
    }

    /// Download every file of the session, one after another, in tab order.
    /// Stops at the first failure.
    pub async fn download_all(&self) -> Result<Vec<PathBuf>, ClientError> {
        let (session_id, names, _) = self.downloadable()?;
        let mut saved = Vec::with_capacity(names.len());
        for name in &names {
            saved.push(self.fetch_and_save(&session_id, name).await?);
        }
        info!(session_id = %session_id, count = saved.len(), "downloaded all files");
        Ok(saved)
    }

    async fn fetch_and_save(&self, session_id: &str, filename: &str) -> Result<PathBuf, ClientError> {
        let url = self.backend.download_url(session_id, filename);
        debug!(%url, "downloading");

        let result = async {
            let bytes = self.backend.download(session_id, filename).await?;
            let path = target_path(&self.config.download_dir, filename);
            tokio::fs::create_dir_all(&self.config.download_dir)
                .await
                .map_err(|source| ClientError::Io {
                    path: self.config.download_dir.display().to_string(),
                    source,
                })?;
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|source| ClientError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
            Ok::<_, ClientError>(path)
        }
        .await;

        let mut state = self.state();
        match result {
            Ok(path) => {
                state.view.downloaded(&path);
                Ok(path)
            }
            Err(e) => {
                warn!(%url, error = %e, "download failed");
                state.view.alert(&format!("Download of {filename} failed: {e}"));
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Sessions previously stored by the service.
    pub async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        match self.backend.history().await {
            Ok(entries) => {
                debug!(count = entries.len(), "history fetched");
                Ok(entries)
            }
            Err(e) => {
                warn!(error = %e, "history request failed");
                self.state().view.alert(&format!("Could not load history: {e}"));
                Err(e)
            }
        }
    }

    /// Load a stored session as the current one.
    ///
    /// Takes part in the same epoch race as [`submit_prompt`](Self::submit_prompt):
    /// a submission or reload that starts while the history request is in
    /// flight wins, and this call returns [`ClientError::Superseded`].
    pub async fn open_history(&self, id: &str) -> Result<(), ClientError> {
        let epoch = self.bump_epoch();
        let mut rx = self.epoch.subscribe();

        let entries = tokio::select! {
            res = self.fetch_history() => res?,
            _ = superseded(&mut rx, epoch) => return Err(ClientError::Superseded),
        };
        let entry = entries
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| ClientError::UnknownSession(id.to_string()))?;

        let session: Session = entry.into();
        let mut state = self.state();
        if !self.is_current(epoch) {
            debug!(epoch, "discarding stored session opened after a newer action");
            return Err(ClientError::Superseded);
        }
        if let Some(frame) = ResultsFrame::from_session(&session) {
            state.view.show_results(&frame);
        }
        info!(epoch, session_id = session.id(), "opened stored session");
        state.session = Some(session);
        Ok(())
    }
}

/// Resolves once the epoch moves past `epoch`.
async fn superseded(rx: &mut watch::Receiver<u64>, epoch: u64) {
    loop {
        if *rx.borrow_and_update() != epoch {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: nothing can supersede us any more.
            std::future::pending::<()>().await;
        }
    }
}

/// Save location for a served file name. Only the final path component is
/// kept so a name like `../../etc/passwd` cannot escape `dir`.
pub fn target_path(dir: &Path, filename: &str) -> PathBuf {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("download");
    dir.join(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_path_keeps_plain_names() {
        assert_eq!(
            target_path(Path::new("/out"), "main.rs"),
            PathBuf::from("/out/main.rs")
        );
    }

    #[test]
    fn target_path_strips_directories() {
        assert_eq!(
            target_path(Path::new("/out"), "src/lib.rs"),
            PathBuf::from("/out/lib.rs")
        );
        assert_eq!(
            target_path(Path::new("/out"), "../../etc/passwd"),
            PathBuf::from("/out/passwd")
        );
    }

    #[test]
    fn target_path_falls_back_for_dot_names() {
        assert_eq!(target_path(Path::new("/out"), ".."), PathBuf::from("/out/download"));
        assert_eq!(target_path(Path::new("/out"), ""), PathBuf::from("/out/download"));
    }

    #[test]
    fn default_config() {
        let cfg = ControllerConfig::default();
        assert_eq!(cfg.download_dir, PathBuf::from("."));
        assert_eq!(cfg.submit_timeout, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn superseded_resolves_after_bump() {
        let (tx, mut rx) = watch::channel(1u64);
        let waiter = tokio::spawn(async move {
            superseded(&mut rx, 1).await;
        });
        tx.send_replace(2);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("superseded should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn superseded_pending_while_current() {
        let (_tx, mut rx) = watch::channel(3u64);
        let res = tokio::time::timeout(Duration::from_millis(30), superseded(&mut rx, 3)).await;
        assert!(res.is_err());
    }
}
