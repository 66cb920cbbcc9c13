//! Directory watching for external changes (sync tools, other devices).
//!
//! A `notify` watcher forwards record-file paths over a channel to a
//! dedicated worker thread, which debounces them per path and hands settled
//! paths to a [`Reconcile`] implementation (the note store).

pub mod debounce;
pub mod worker;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Sender};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info};

use crate::error::Result;
use crate::storage::is_record_file;

pub use debounce::Debouncer;
pub use worker::{spawn_worker, Reconcile, WorkerHandle};

/// A running directory watch. Dropping it stops the watch.
pub struct WatcherHandle {
    dir: PathBuf,
    os_watcher: Option<RecommendedWatcher>,
    worker: Option<WorkerHandle>,
}

/// Watch `dir` (non-recursively) and reconcile record files after `window` of quiet.
pub fn watch_directory(
    dir: &Path,
    window: Duration,
    reconciler: Arc<dyn Reconcile>,
) -> Result<WatcherHandle> {
    let (events_tx, events_rx) = unbounded::<PathBuf>();

    let mut os_watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        match result {
            Ok(event) => forward(event, &events_tx),
            Err(err) => error!(error = %err, "watch error"),
        }
    })?;
    os_watcher.watch(dir, RecursiveMode::NonRecursive)?;

    let worker = spawn_worker(reconciler, events_rx, window)?;
    info!(dir = %dir.display(), window_ms = window.as_millis() as u64, "watching notes directory");

    Ok(WatcherHandle {
        dir: dir.to_path_buf(),
        os_watcher: Some(os_watcher),
        worker: Some(worker),
    })
}

impl WatcherHandle {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Release the OS watch, then stop and join the worker.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the OS watcher also drops the event sender it captured.
        drop(self.os_watcher.take());
        if let Some(worker) = self.worker.take() {
            worker.stop();
            debug!(dir = %self.dir.display(), "stopped watching notes directory");
        }
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("dir", &self.dir)
            .field("running", &self.worker.is_some())
            .finish()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn forward(event: Event, events: &Sender<PathBuf>) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }
    for path in event.paths {
        if is_record_file(&path) {
            // The worker is gone only during shutdown.
            let _ = events.send(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind};

    #[test]
    fn test_forward_filters_paths_and_access_events() {
        let (tx, rx) = unbounded();

        let create = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/notes/abc123.json"))
            .add_path(PathBuf::from("/notes/.abc123.json.99.tmp"))
            .add_path(PathBuf::from("/notes/.sealnote-salt.json"));
        forward(create, &tx);

        let access = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/notes/def456.json"));
        forward(access, &tx);

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received, vec![PathBuf::from("/notes/abc123.json")]);
    }
}
