//! The dev server seam and a `notify`-backed implementation of it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::{Result, SpriteError};
use crate::scanner::ICON_EXTENSION;

/// Poll interval of [`NotifyServer::run`] between stop-flag checks.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Callback invoked with every changed path.
pub type ChangeListener = Box<dyn Fn(&Path) + Send + Sync>;

/// Something that can make connected clients reload.
pub trait Reload: Send + Sync {
    fn full_reload(&self);
}

/// What the plugin needs from a development server.
pub trait DevServer {
    /// Add a glob to the server's watch set.
    fn watch(&mut self, glob: &IconGlob) -> Result<()>;

    /// Register a listener for change events.
    fn on_change(&mut self, listener: ChangeListener);

    /// Handle used to request a full reload of connected clients.
    fn reloader(&self) -> Arc<dyn Reload>;
}

/// Recursive glob matching every icon below a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconGlob {
    pub root: PathBuf,
}

impl IconGlob {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn pattern(&self) -> String {
        format!("{}/**/*.{}", self.root.display(), ICON_EXTENSION)
    }
}

impl fmt::Display for IconGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

/// A standalone dev server watching the file system with `notify`.
///
/// Events are collected on notify's thread and dispatched to listeners
/// from [`NotifyServer::run`].
pub struct NotifyServer {
    watcher: RecommendedWatcher,
    events: Receiver<PathBuf>,
    listeners: Vec<ChangeListener>,
    reloader: Arc<dyn Reload>,
}

impl NotifyServer {
    pub fn new(reloader: Arc<dyn Reload>) -> Result<Self> {
        let (tx, rx) = channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_content_change(&event.kind) => {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("File watch error: {}", e),
        })
        .map_err(|e| SpriteError::Watch {
            message: format!("Failed to create file watcher: {}", e),
        })?;

        Ok(Self {
            watcher,
            events: rx,
            listeners: Vec::new(),
            reloader,
        })
    }

    /// Pass a changed path to every listener.
    pub fn dispatch(&self, path: &Path) {
        for listener in &self.listeners {
            listener(path);
        }
    }

    /// Dispatch file system events until `running` is cleared.
    pub fn run(&self, running: &AtomicBool) -> Result<()> {
        while running.load(Ordering::SeqCst) {
            match self.events.recv_timeout(POLL_INTERVAL) {
                Ok(path) => self.dispatch(&path),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SpriteError::Watch {
                        message: "File watcher stopped unexpectedly".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl DevServer for NotifyServer {
    fn watch(&mut self, glob: &IconGlob) -> Result<()> {
        debug!("Watching {}", glob);
        self.watcher
            .watch(&glob.root, RecursiveMode::Recursive)
            .map_err(|e| SpriteError::Watch {
                message: format!("Failed to watch {}: {}", glob.root.display(), e),
            })
    }

    fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    fn reloader(&self) -> Arc<dyn Reload> {
        self.reloader.clone()
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    kind.is_create() || kind.is_modify() || kind.is_remove()
}
