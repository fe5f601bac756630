//! Debounced regeneration for development servers.
//!
//! A [`ChangeWatcher`] owns a worker thread holding the debounce state.
//! Qualifying change events (re)arm a single deadline; when it passes
//! without further events the worker runs one generation pass and asks
//! the dev server for a full reload.

mod server;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::{Result, SpriteError};
use crate::scanner::{canonical_path, is_icon_path};
use crate::sprite::PassReport;

pub use server::{ChangeListener, DevServer, IconGlob, NotifyServer, Reload};

/// Debounce state owned by the watcher worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Scheduled { deadline: Instant },
}

impl WatchState {
    /// Schedule a regeneration `wait` after `now`, replacing any pending one.
    pub fn schedule(self, now: Instant, wait: Duration) -> Self {
        WatchState::Scheduled {
            deadline: now + wait,
        }
    }

    /// How long the worker may block before the deadline. `None` means
    /// block until the next event.
    pub fn timeout(&self, now: Instant) -> Option<Duration> {
        match self {
            WatchState::Idle => None,
            WatchState::Scheduled { deadline } => Some(deadline.saturating_duration_since(now)),
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self, WatchState::Scheduled { deadline } if *deadline <= now)
    }
}

enum Signal {
    Changed(PathBuf),
    Shutdown,
}

/// Cheap handle given to the dev server's change listener.
#[derive(Clone)]
pub struct ChangeTrigger {
    tx: Sender<Signal>,
    output_file: PathBuf,
}

impl ChangeTrigger {
    /// Whether a change to `path` should regenerate the sprite.
    ///
    /// The sprite itself never qualifies, however the path reaches it.
    pub fn qualifies(&self, path: &Path) -> bool {
        if !is_icon_path(path) {
            return false;
        }
        path.file_name() != self.output_file.file_name() || canonical_path(path) != self.output_file
    }

    /// Report a changed path. Returns whether it (re)armed the debounce.
    pub fn notify(&self, path: &Path) -> bool {
        if !self.qualifies(path) {
            return false;
        }
        info!("SVG file changed: {}", path.display());
        self.tx.send(Signal::Changed(path.to_path_buf())).is_ok()
    }
}

/// Background worker coalescing change events into generation passes.
///
/// Passes run on the worker itself, so they never overlap; events arriving
/// during a pass re-arm the deadline for one follow-up pass.
pub struct ChangeWatcher {
    trigger: ChangeTrigger,
    worker: Option<JoinHandle<()>>,
}

impl ChangeWatcher {
    pub fn spawn<F>(
        wait: Duration,
        output_file: PathBuf,
        mut pass: F,
        reloader: Arc<dyn Reload>,
    ) -> Result<Self>
    where
        F: FnMut() -> Result<PassReport> + Send + 'static,
    {
        let (tx, rx) = channel::<Signal>();

        let worker = std::thread::Builder::new()
            .name("icon-sprite-watch".to_string())
            .spawn(move || {
                let mut state = WatchState::Idle;

                loop {
                    let received = match state.timeout(Instant::now()) {
                        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                        Some(timeout) => rx.recv_timeout(timeout),
                    };

                    match received {
                        Ok(Signal::Changed(path)) => {
                            debug!("Debouncing change to {}", path.display());
                            state = state.schedule(Instant::now(), wait);
                        }
                        Ok(Signal::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }

                    if state.is_due(Instant::now()) {
                        state = WatchState::Idle;
                        match pass() {
                            Ok(report) => {
                                if report.wrote() {
                                    reloader.full_reload();
                                }
                            }
                            Err(e) => error!("Icon sprite regeneration failed: {}", e),
                        }
                    }
                }
            })
            .map_err(|e| SpriteError::Watch {
                message: format!("Failed to start watcher thread: {}", e),
            })?;

        Ok(Self {
            trigger: ChangeTrigger {
                tx,
                output_file: canonical_path(&output_file),
            },
            worker: Some(worker),
        })
    }

    pub fn trigger(&self) -> ChangeTrigger {
        self.trigger.clone()
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        let _ = self.trigger.tx.send(Signal::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
