//! Ctrl+C routing for the terminal front end.
//!
//! Tokio's signal handler stays installed for the life of the process once
//! `ctrl_c()` has been called, so there is exactly one listener. It aborts the
//! request wrapped in [`Interrupts::run_abortable`] when there is one and exits
//! the process otherwise.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Exit status used when Ctrl+C ends the process (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Clone)]
pub struct Interrupts {
    busy: Arc<AtomicBool>,
    tx: Arc<watch::Sender<u64>>,
}

impl Default for Interrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupts {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(tx),
        }
    }

    /// Deliver one interrupt.
    ///
    /// Returns `true` when an abortable request was running and has been
    /// told to stop, `false` when nothing was running.
    pub fn interrupt(&self) -> bool {
        if !self.busy.load(Ordering::SeqCst) {
            return false;
        }
        self.tx.send_modify(|n| *n += 1);
        true
    }

    /// Spawn the process-wide Ctrl+C listener.
    pub fn install_ctrl_c(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "could not listen for Ctrl+C");
                    return;
                }
                if !this.interrupt() {
                    debug!("Ctrl+C while idle, exiting");
                    std::process::exit(EXIT_INTERRUPTED);
                }
            }
        });
    }

    /// Run `fut` until it finishes or an interrupt arrives.
    ///
    /// Interrupts delivered before the call do not count.
    pub async fn run_abortable<T, F>(&self, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let mut rx = self.tx.subscribe();
        rx.borrow_and_update();
        self.busy.store(true, Ordering::SeqCst);

        let result = tokio::select! {
            res = fut => res,
            changed = rx.changed() => match changed {
                Ok(()) => Err(ClientError::Aborted),
                Err(_) => std::future::pending().await,
            },
        };

        self.busy.store(false, Ordering::SeqCst);
        result
    }
}
