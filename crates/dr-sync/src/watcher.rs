//! Model root file watcher
//!
//! Raw notify events are collected on a debounce thread. Once the root has
//! been quiet for the debounce period, the changed paths are handed to the
//! callback as one batch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use dr_core::errors::{ExError, ExErrorKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches a model root until dropped
pub struct ModelWatcher {
    // Dropping the notify watcher closes the event channel, which ends the
    // debounce thread.
    watcher: Option<RecommendedWatcher>,
    processor_thread: Option<thread::JoinHandle<()>>,
}

impl ModelWatcher {
    /// Start watching `root` recursively.
    ///
    /// `on_change` runs on the debounce thread with the sorted set of
    /// changed model files; returning false stops the thread.
    ///
    /// # Errors
    ///
    /// `Io` if the platform watcher cannot be created or attached.
    pub fn start<F>(root: &Path, debounce: Duration, on_change: F) -> Result<Self, ExError>
    where
        F: FnMut(Vec<PathBuf>) -> bool + Send + 'static,
    {
        let (event_tx, event_rx) = channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        })
        .map_err(|e| watch_error(root, &e))?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| watch_error(root, &e))?;

        let processor_thread = thread::Builder::new()
            .name("dr-sync-watcher".to_string())
            .spawn(move || process_events(event_rx, debounce, on_change))
            .map_err(|e| {
                ExError::new(ExErrorKind::Io)
                    .with_op("start_watcher")
                    .with_message(e.to_string())
            })?;

        tracing::debug!(root = %root.display(), debounce_ms = debounce.as_millis() as u64, "watching model root");
        Ok(Self {
            watcher: Some(watcher),
            processor_thread: Some(processor_thread),
        })
    }

    /// Stop watching and wait for the debounce thread
    pub fn stop(&mut self) {
        self.watcher = None;
        if let Some(handle) = self.processor_thread.take() {
            if handle.join().is_err() {
                tracing::warn!("watcher thread panicked");
            }
        }
    }
}

impl Drop for ModelWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_error(root: &Path, err: &notify::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op("start_watcher")
        .with_location(root.display().to_string(), None)
        .with_message(err.to_string())
}

/// Manifest and category files; temp files from atomic writes are ignored
pub fn is_model_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "yaml")
}

fn relevant_paths(event: &Event) -> impl Iterator<Item = &PathBuf> {
    let interesting = !matches!(event.kind, EventKind::Access(_));
    event
        .paths
        .iter()
        .filter(move |p| interesting && is_model_file(p))
}

fn process_events<F>(
    event_rx: Receiver<notify::Result<Event>>,
    debounce: Duration,
    mut on_change: F,
) where
    F: FnMut(Vec<PathBuf>) -> bool,
{
    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
    loop {
        // Block until something happens, then keep collecting until quiet
        let next = if pending.is_empty() {
            event_rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            event_rx.recv_timeout(debounce)
        };
        match next {
            Ok(Ok(event)) => pending.extend(relevant_paths(&event).cloned()),
            Ok(Err(err)) => tracing::warn!(error = %err, "file watcher error"),
            Err(RecvTimeoutError::Timeout) => {
                let batch: Vec<PathBuf> = std::mem::take(&mut pending).into_iter().collect();
                tracing::debug!(files = batch.len(), "model files changed");
                if !on_change(batch) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
