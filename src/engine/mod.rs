// src/engine/mod.rs

//! Orchestration engine for assetflow.
//!
//! This module ties together:
//! - [`task`]: named units of work and the context threaded into them
//! - [`completion`]: the completion styles a task body may use, normalised
//!   into one future
//! - [`registry`]: name -> task lookup
//! - [`sequencer`]: `series` / `parallel` composites
//! - [`runtime`]: runs one top-level task, deciding what a failure means
//!   for the process (build vs. long-running dev session)

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

pub mod completion;
pub mod registry;
pub mod runtime;
pub mod sequencer;
pub mod task;

pub use completion::{Artifact, Completion, Done};
pub use registry::TaskRegistry;
pub use runtime::{RunOptions, Runtime};
pub use sequencer::{parallel, series};
pub use task::{Task, TaskBody, TaskContext};
