// src/errors.rs

//! Crate-wide error types.
//!
//! - [`AssetflowError`] covers everything that can go wrong around a run:
//!   config loading, registry lookups, and the final task failure.
//! - [`TaskError`] is what a task body reports. It travels through the
//!   sequencer unchanged except for the [`TaskError::Failed`] wrapper that
//!   records which leaf task produced it.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::TaskName;

#[derive(Error, Debug)]
pub enum AssetflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure reported by a task body or by the orchestrator while running it.
#[derive(Error, Debug)]
pub enum TaskError {
    /// A collaborator (style compiler, ...) rejected an input file.
    #[error("{collaborator} failed on {}: {message}", path.display())]
    Transform {
        collaborator: &'static str,
        path: PathBuf,
        message: String,
    },

    /// A shell command collaborator exited unsuccessfully.
    #[error("command `{cmd}` exited with status {code}")]
    Command { cmd: String, code: i32 },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dev server could not bind its listening address.
    #[error("dev server could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// A callback-style task dropped its completion token without finishing.
    #[error("completion token dropped before the task signalled completion")]
    Abandoned,

    #[error("task '{task}' failed: {source}")]
    Failed {
        task: TaskName,
        #[source]
        source: Box<TaskError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TaskError::Io {
            path: path.into(),
            source,
        }
    }

    /// Name of the innermost task that failed, if known.
    pub fn failing_task(&self) -> Option<&str> {
        match self {
            TaskError::Failed { task, .. } => Some(task),
            _ => None,
        }
    }

    /// Fatal errors abort a run even in development mode.
    pub fn is_fatal(&self) -> bool {
        match self {
            TaskError::Bind { .. } => true,
            TaskError::Failed { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetflowError>;
