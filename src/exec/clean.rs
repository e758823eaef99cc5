// src/exec/clean.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::{Completion, TaskContext};
use crate::errors::TaskError;
use crate::fs::FileSystem;

/// Remove `dir` and everything below it.
///
/// A missing directory is already clean. Any other failure (permissions, a
/// file held open) is reported as [`TaskError::Io`].
pub fn clean(fs: &dyn FileSystem, dir: &Path) -> Result<(), TaskError> {
    if !fs.exists(dir) {
        debug!(dir = %dir.display(), "nothing to clean");
        return Ok(());
    }

    fs.remove_dir_all(dir)
        .map_err(|err| TaskError::io(dir, err))?;
    info!(dir = %dir.display(), "cleaned");
    Ok(())
}

/// Body of a `clean` task.
pub fn clean_task(dir: PathBuf, fs: Arc<dyn FileSystem>) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
    move |_ctx: TaskContext| Completion::from_result(clean(fs.as_ref(), &dir))
}
