//! Render models and the terminal view.
//!
//! The controller never prints; it builds a [`ResultsFrame`] or an
//! [`ErrorPanel`] and hands it to whatever [`View`] it was given.

use std::io::{self, Write};
use std::path::Path;

use colored::*;

use crate::highlight::{highlight_to_ansi, language_class};
use crate::session::Session;

/// Label of the action that resets all state after a failure.
pub const RELOAD_ACTION: &str = "Try Again";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub filename: String,
    pub active: bool,
}

/// Everything needed to draw a result set: the tab strip plus the active file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsFrame {
    pub session_id: String,
    pub tabs: Vec<Tab>,
    pub active_index: usize,
    pub content: String,
    pub highlight_class: String,
    pub enhanced_prompt: Option<String>,
}

impl ResultsFrame {
    /// `None` for an empty session, which renders nothing.
    pub fn from_session(session: &Session) -> Option<Self> {
        let active = session.active_file()?;
        let tabs = session
            .files()
            .iter()
            .enumerate()
            .map(|(i, f)| Tab {
                filename: f.filename.clone(),
                active: i == session.active_index(),
            })
            .collect();
        Some(Self {
            session_id: session.id().to_string(),
            tabs,
            active_index: session.active_index(),
            content: active.content.clone(),
            highlight_class: language_class(&active.language),
            enhanced_prompt: session.enhanced_prompt.clone(),
        })
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub title: String,
    pub message: String,
    pub action: String,
}

impl ErrorPanel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
            action: RELOAD_ACTION.to_string(),
        }
    }
}

/// Rendering surface for the controller.
pub trait View: Send {
    fn show_loading(&mut self, prompt: &str);
    fn show_results(&mut self, frame: &ResultsFrame);
    fn show_error(&mut self, panel: &ErrorPanel);
    /// Blocking user-facing warning.
    fn alert(&mut self, message: &str);
    fn downloaded(&mut self, path: &Path);
    /// Drop everything on screen.
    fn clear(&mut self);
}

// ---------------------------------------------------------------------------
// Terminal view
// ---------------------------------------------------------------------------

/// Writes frames to stdout and alerts to stderr.
pub struct TerminalView {
    color: bool,
}

impl TerminalView {
    pub fn new(color: bool) -> Self {
        if !color {
            colored::control::set_override(false);
        }
        Self { color }
    }

    fn tab_strip(frame: &ResultsFrame) -> String {
        let sep = "|".bright_blue().to_string();
        frame
            .tabs
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let label = format!(" {}:{} ", i, t.filename);
                if t.active {
                    label.black().on_bright_cyan().bold().to_string()
                } else {
                    label.bright_white().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(sep.as_str())
    }

    fn emit(text: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

impl View for TerminalView {
    fn show_loading(&mut self, prompt: &str) {
        eprintln!("{} {}", "Generating code for:".bright_yellow(), prompt.bright_white());
        eprintln!("{}", "  (waiting for the service, Ctrl+C to abort)".bright_blue());
    }

    fn show_results(&mut self, frame: &ResultsFrame) {
        let mut text = String::new();
        text.push_str(&format!("\n{}\n", "=".repeat(60).bright_blue()));
        text.push_str(&format!("{}: {}\n", "Session".bright_yellow(), frame.session_id));
        if let Some(enhanced) = &frame.enhanced_prompt {
            text.push_str(&format!("{}: {}\n", "Enhanced prompt".bright_magenta(), enhanced));
        }
        text.push_str(&Self::tab_strip(frame));
        text.push('\n');
        text.push_str(&format!("{}\n", "-".repeat(60).bright_blue()));
        let body = if self.color {
            highlight_to_ansi(&frame.content, &frame.highlight_class)
        } else {
            frame.content.clone()
        };
        text.push_str(&body);
        if !body.ends_with('\n') {
            text.push('\n');
        }
        Self::emit(&text);
    }

    fn show_error(&mut self, panel: &ErrorPanel) {
        eprintln!("\n{}", panel.title.bright_red().bold());
        eprintln!("{}", panel.message.red());
        eprintln!("[{}] {}", panel.action.bright_white().bold(), "type :reload".bright_blue());
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{} {}", "!".bright_red().bold(), message.bright_yellow());
    }

    fn downloaded(&mut self, path: &Path) {
        eprintln!("{} {}", "saved".bright_green(), path.display());
    }

    fn clear(&mut self) {
        eprintln!("{}", "-- reset --".bright_blue());
    }
}
