//! Configuration file watcher for hot reload.
//!
//! Watches the file's parent directory so editors that save by renaming a
//! temp file over the original are still picked up. Events for other files
//! and saves that leave the content unchanged are ignored.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::DropsConfig;

/// Monitors the configuration file and sends validated reloads.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<DropsConfig>,
}

impl ConfigWatcher {
    /// Create a watcher and the receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<DropsConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(OsString::from);
        let last_seen = Mutex::new(std::fs::read_to_string(&self.path).ok());
        let path = self.path.clone();
        let tx = self.update_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(OsString::from) == file_name);
                    if ours {
                        if let Some(config) = reload(&path, &last_seen) {
                            let _ = tx.send(config);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Read and validate the file. `None` when unchanged or invalid.
fn reload(path: &Path, last_seen: &Mutex<Option<String>>) -> Option<DropsConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(error = %e, "Config file unreadable, keeping current configuration");
            return None;
        }
    };

    let mut last = last_seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if last.as_deref() == Some(content.as_str()) {
        tracing::debug!("Config file touched without changes");
        return None;
    }

    match parse_config(&content) {
        Ok(config) => {
            tracing::info!("Config file changed, reloading");
            *last = Some(content);
            Some(config)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            None
        }
    }
}
