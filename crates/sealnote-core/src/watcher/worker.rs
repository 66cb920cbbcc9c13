//! The reconciliation worker thread.
//!
//! The worker owns a [`Debouncer`] and waits on two channels: incoming
//! changed paths and a shutdown signal. It sleeps until the next debounce
//! deadline, then hands each settled path to a [`Reconcile`] implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use tracing::{debug, error};

use super::debounce::Debouncer;
use crate::error::{Result, SealnoteError};

/// How long the worker blocks when nothing is pending.
const IDLE_WAIT: Duration = Duration::from_secs(60);

/// Applies one settled file change.
pub trait Reconcile: Send + Sync {
    fn reconcile(&self, path: &Path);
}

/// Running worker thread.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: Option<Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
}

/// Start a worker that debounces `events` by `window` and reconciles settled paths.
pub fn spawn_worker(
    reconciler: Arc<dyn Reconcile>,
    events: Receiver<PathBuf>,
    window: Duration,
) -> Result<WorkerHandle> {
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

    let join = thread::Builder::new()
        .name("sealnote-watcher".to_string())
        .spawn(move || run(reconciler.as_ref(), &events, &shutdown_rx, window))
        .map_err(|source| SealnoteError::Watch(format!("failed to spawn watcher thread: {source}")))?;

    Ok(WorkerHandle {
        shutdown: Some(shutdown_tx),
        join: Some(join),
    })
}

impl WorkerHandle {
    /// Signal the worker and wait for it. Pending debounced paths are dropped.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // A full or disconnected channel means the worker is already stopping.
            let _ = shutdown.try_send(());
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("watcher thread panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn run(
    reconciler: &dyn Reconcile,
    events: &Receiver<PathBuf>,
    shutdown: &Receiver<()>,
    window: Duration,
) {
    let mut debouncer = Debouncer::new(window);

    'outer: loop {
        let timeout = debouncer
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_WAIT);

        let stop = select! {
            recv(shutdown) -> _ => true,
            recv(events) -> message => match message {
                Ok(path) => {
                    debouncer.record(path, Instant::now());
                    false
                }
                Err(_) => true,
            },
            default(timeout) => false,
        };
        if stop {
            break;
        }

        for path in debouncer.take_expired(Instant::now()) {
            if shutdown_requested(shutdown) {
                break 'outer;
            }
            reconciler.reconcile(&path);
        }
    }

    let dropped = debouncer.clear();
    if dropped > 0 {
        debug!(dropped, "discarded pending changes on shutdown");
    }
}

fn shutdown_requested(shutdown: &Receiver<()>) -> bool {
    match shutdown.try_recv() {
        Ok(()) | Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<PathBuf>>,
    }

    impl Reconcile for Recorder {
        fn reconcile(&self, path: &Path) {
            self.seen.lock().push(path.to_path_buf());
        }
    }

    fn wait_for(recorder: &Recorder, count: usize) -> Vec<PathBuf> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let seen = recorder.seen.lock().clone();
            if seen.len() >= count || Instant::now() > deadline {
                return seen;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_burst_reconciles_each_path_once() {
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = unbounded();
        let worker = spawn_worker(recorder.clone(), rx, Duration::from_millis(50)).unwrap();

        for _ in 0..5 {
            tx.send(PathBuf::from("a.json")).unwrap();
        }
        tx.send(PathBuf::from("b.json")).unwrap();

        wait_for(&recorder, 2);
        // Give a duplicate firing a chance to show up.
        thread::sleep(Duration::from_millis(150));
        worker.stop();

        let mut seen = recorder.seen.lock().clone();

        seen.sort();
        assert_eq!(seen, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
    }

    #[test]
    fn test_stop_discards_pending_paths() {
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = unbounded();
        let worker = spawn_worker(recorder.clone(), rx, Duration::from_secs(30)).unwrap();

        tx.send(PathBuf::from("a.json")).unwrap();
        thread::sleep(Duration::from_millis(20));
        worker.stop();

        assert!(recorder.seen.lock().is_empty());
    }

    #[test]
    fn test_worker_exits_when_event_source_closes() {
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = unbounded::<PathBuf>();
        let worker = spawn_worker(recorder, rx, Duration::from_millis(10)).unwrap();

        drop(tx);
        // Joining must not hang once the sender is gone.
        worker.stop();
    }
}
