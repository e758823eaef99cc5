// src/watch/event_handler.rs

//! Turns debounced batches of changed paths into task runs and reloads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::{Task, TaskContext};
use crate::fs::FileSystem;
use crate::watch::cache::FileCache;
use crate::watch::flight::{Admission, Flight};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{WatchBinding, match_bindings};

/// Routes file changes to bound tasks.
///
/// Owned by the watcher loop; every triggered task gets its own driver
/// (a spawned tokio task) guarded by a [`Flight`].
#[derive(Debug)]
pub struct Dispatcher {
    root: PathBuf,
    bindings: Vec<WatchBinding>,
    flights: HashMap<String, Arc<Flight>>,
    cache: FileCache,
    fs: Arc<dyn FileSystem>,
    ctx: TaskContext,
}

impl Dispatcher {
    pub fn new(
        root: impl Into<PathBuf>,
        bindings: Vec<WatchBinding>,
        fs: Arc<dyn FileSystem>,
        ctx: TaskContext,
    ) -> Self {
        let root = root.into();
        let mut cache = FileCache::new();
        cache.prime(fs.as_ref(), &root, &bindings);

        Self {
            root,
            bindings,
            flights: HashMap::new(),
            cache,
            fs,
            ctx,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handle one debounced batch.
    ///
    /// Returns the handles of drivers started by this batch; triggers for a
    /// task that is already running are coalesced and start nothing.
    pub fn handle_batch(&mut self, paths: &[PathBuf]) -> Vec<JoinHandle<()>> {
        let mut rel_paths: Vec<String> = paths
            .iter()
            .filter_map(|path| {
                let rel = relative_str(&self.root, path);
                if rel.is_none() {
                    warn!(path = %path.display(), root = %self.root.display(), "could not relativize path");
                }
                rel
            })
            .collect();
        rel_paths.sort();
        rel_paths.dedup();

        let root = &self.root;
        let fs = self.fs.as_ref();
        let cache = &mut self.cache;
        let triggers = match_bindings(
            &self.bindings,
            rel_paths.iter().map(String::as_str),
            |rel| cache.refresh(fs, &root.join(rel)),
        );

        if triggers.is_empty() {
            debug!(paths = rel_paths.len(), "no binding matched");
            return Vec::new();
        }

        if triggers.reload_now {
            info!("reloading browsers");
            self.ctx.reload().notify_reload();
        }

        let mut started = Vec::new();
        for (task, reload) in triggers.tasks {
            let flight = Arc::clone(
                self.flights
                    .entry(task.name().to_string())
                    .or_insert_with(|| Arc::new(Flight::new())),
            );

            match flight.request(reload) {
                Admission::Start => {
                    debug!(task = %task.name(), "watch match -> triggering task");
                    started.push(tokio::spawn(drive(task, flight, self.ctx.clone())));
                }
                Admission::Coalesced => {
                    debug!(task = %task.name(), "task already running; rerun queued");
                }
            }
        }
        started
    }
}

/// Run `task` until no trigger is owed. Failures are reported and the
/// watcher keeps going.
async fn drive(task: Arc<Task>, flight: Arc<Flight>, ctx: TaskContext) {
    loop {
        let reload = flight.take_reload();
        match task.run(ctx.clone()).await {
            Ok(()) if reload => {
                info!(task = %task.name(), "reloading browsers");
                ctx.reload().notify_reload();
            }
            Ok(()) => {}
            Err(err) => {
                error!(
                    task = err.failing_task().unwrap_or(task.name()),
                    error = %err,
                    "watch-triggered run failed; still watching"
                );
            }
        }

        if !flight.finish() {
            break;
        }
        debug!(task = %task.name(), "running coalesced trigger");
    }
}
