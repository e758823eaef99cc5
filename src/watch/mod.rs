// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `[[watch]]` bindings (glob + excludes + target task/reload).
//! - Wiring up a debounced cross-platform watcher (`notify`).
//! - Single-flight re-triggering of bound tasks and optional content
//!   hashing to skip saves that did not change a file.

pub mod cache;
pub mod event_handler;
pub mod flight;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::{Completion, TaskContext};
use crate::errors::TaskError;
use crate::fs::FileSystem;

pub use event_handler::Dispatcher;
pub use flight::{Admission, Flight};
pub use patterns::{Triggers, WatchBinding, compile_glob, match_bindings, static_base};
pub use watcher::{WatcherHandle, spawn_watcher};

/// Body of a `watch` task: start watching `root` and never complete.
///
/// The watcher lives as long as the returned future, so it stops when the
/// run is shut down.
pub fn watch_task(
    root: PathBuf,
    bindings: Arc<Vec<WatchBinding>>,
    debounce: Duration,
    fs: Arc<dyn FileSystem>,
) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
    move |ctx: TaskContext| {
        let root = root.canonicalize().unwrap_or_else(|_| root.clone());
        let bindings = bindings.as_ref().clone();
        let fs = Arc::clone(&fs);

        Completion::future(async move {
            info!(bindings = bindings.len(), "watching for changes");
            let dispatcher = Dispatcher::new(root, bindings, fs, ctx);
            let _handle = spawn_watcher(debounce, dispatcher).map_err(TaskError::Other)?;
            std::future::pending::<()>().await;
            Ok(())
        })
    }
}
