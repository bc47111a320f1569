//! Filesystem event source: per-directory subscriptions over `notify`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::DaemonError;

/// One notification delivered by the event source.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    Changed { kind: EventKind, paths: Vec<PathBuf> },
    Failed(String),
}

impl From<notify::Result<Event>> for WatchEvent {
    fn from(result: notify::Result<Event>) -> Self {
        match result {
            Ok(event) => WatchEvent::Changed {
                kind: event.kind,
                paths: event.paths,
            },
            Err(err) => WatchEvent::Failed(err.to_string()),
        }
    }
}

/// Subscription handle over a filesystem watch facility.
pub trait EventSource {
    /// Start delivering change notifications for `path` (non-recursive).
    fn subscribe(&mut self, path: &Path) -> Result<(), DaemonError>;

    /// Release every subscription. Events stop flowing once this returns.
    fn close(&mut self);
}

/// [`EventSource`] backed by the platform's recommended `notify` watcher.
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
    watched: HashSet<PathBuf>,
}

impl NotifySource {
    /// Create the OS watch facility and the channel its events arrive on.
    ///
    /// This is the only fallible step of startup that aborts the process.
    pub fn open() -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>), DaemonError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<WatchEvent>();
        let watcher = recommended_watcher(move |event: notify::Result<Event>| {
            let _ = event_tx.send(WatchEvent::from(event));
        })?;

        Ok((
            Self {
                watcher: Some(watcher),
                watched: HashSet::new(),
            },
            event_rx,
        ))
    }

    pub fn watched(&self) -> &HashSet<PathBuf> {
        &self.watched
    }
}

impl EventSource for NotifySource {
    fn subscribe(&mut self, path: &Path) -> Result<(), DaemonError> {
        let watcher = self.watcher.as_mut().ok_or(DaemonError::SourceClosed)?;
        if self.watched.contains(path) {
            return Ok(());
        }
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        self.watched.insert(path.to_path_buf());
        tracing::debug!(path = %path.display(), "watching directory");
        Ok(())
    }

    fn close(&mut self) {
        let Some(mut watcher) = self.watcher.take() else {
            return;
        };
        for path in self.watched.drain() {
            if let Err(err) = watcher.unwatch(&path) {
                tracing::debug!(path = %path.display(), error = %err, "unwatch failed");
            }
        }
        // Dropping the watcher drops the event sender, which ends the stream.
        drop(watcher);
    }
}
