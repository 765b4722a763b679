//! Terminal client for a remote code-generation service.
//!
//! A prompt is posted to the service, the returned source files become tabs
//! with syntax-highlighted content, and files can be downloaded one at a time
//! or all at once. [`controller::UiController`] ties it together; the network
//! and the screen sit behind the [`api::GenerationBackend`] and [`view::View`]
//! traits.

pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod highlight;
pub mod interrupt;
pub mod session;
pub mod view;

pub use api::{GenerateRequest, GenerateResponse, GenerationBackend, HistoryEntry, HttpBackend};
pub use config::ClientConfig;
pub use controller::{ControllerConfig, UiController};
pub use error::ClientError;
pub use session::{GeneratedFile, Session};
pub use view::{ErrorPanel, ResultsFrame, Tab, TerminalView, View};
