// src/watch/watcher.rs

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::watch::event_handler::Dispatcher;

/// Handle for the filesystem watcher.
///
/// Keeps the debouncer alive; dropping the handle stops watching and ends
/// the event loop.
pub struct WatcherHandle {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    event_loop: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish_non_exhaustive()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

/// Watch the dispatcher's root recursively and feed every debounced batch
/// of changed paths into it.
pub fn spawn_watcher(debounce: Duration, mut dispatcher: Dispatcher) -> Result<WatcherHandle> {
    let root: PathBuf = dispatcher.root().to_path_buf();

    // Channel from the debouncer thread into the async world.
    let (batch_tx, mut batch_rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();

    let mut debouncer = new_debouncer(debounce, None, move |res: DebounceEventResult| match res {
        Ok(events) => {
            let paths: Vec<PathBuf> = events
                .into_iter()
                .filter(|e| !e.event.kind.is_access())
                .flat_map(|e| e.event.paths.clone())
                .collect();
            if !paths.is_empty() {
                // Receiver only goes away when the watcher is being dropped.
                let _ = batch_tx.send(paths);
            }
        }
        Err(errors) => {
            for err in errors {
                error!(error = %err, "file watch error");
            }
        }
    })
    .context("creating file watcher")?;

    debouncer
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", root.display()))?;

    info!(root = %root.display(), debounce_ms = debounce.as_millis() as u64, "file watcher started");

    let event_loop = tokio::spawn(async move {
        while let Some(paths) = batch_rx.recv().await {
            debug!(paths = paths.len(), "debounced batch received");
            dispatcher.handle_batch(&paths);
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _debouncer: debouncer,
        event_loop,
    })
}
