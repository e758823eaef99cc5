// src/engine/runtime.rs

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{error, info, warn};

use crate::engine::registry::TaskRegistry;
use crate::engine::task::{Task, TaskContext};
use crate::errors::Result;
use crate::types::Environment;

/// How a failure of the top-level task affects the process.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The task tree contains leaves that never finish (watcher, dev
    /// server). A non-fatal failure is reported and the process keeps
    /// serving until shutdown so the author can fix the file and save again.
    pub keep_alive: bool,

    /// Those never-finishing leaves with the environment they run under.
    /// Any of them the failed run never reached is started after the failure.
    pub long_running: Vec<(String, Environment)>,
}

/// Runs one top-level task from a [`TaskRegistry`].
pub struct Runtime {
    registry: TaskRegistry,
    context: TaskContext,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("tasks", &self.registry.len())
            .field("context", &self.context)
            .finish()
    }
}

impl Runtime {
    pub fn new(registry: TaskRegistry, context: TaskContext) -> Self {
        Self { registry, context }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Run `name` until it completes, fails, or `shutdown` resolves.
    ///
    /// - Unknown task names fail before anything runs.
    /// - Without `keep_alive`, the first failure is returned.
    /// - With `keep_alive`, non-fatal failures are logged, long-running leaves
    ///   the failure kept from starting are started, and the call waits for
    ///   `shutdown`. Fatal errors (e.g. the dev server failing to bind) are
    ///   returned immediately.
    pub async fn run<S>(&self, name: &str, options: RunOptions, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let task = self.registry.get(name)?;
        info!(task = %name, keep_alive = options.keep_alive, "assetflow runtime started");

        tokio::pin!(shutdown);

        let outcome = tokio::select! {
            res = task.run(self.context.clone()) => Some(res),
            _ = &mut shutdown => None,
        };

        match outcome {
            None => {
                info!("shutdown requested; stopping");
                Ok(())
            }
            Some(Ok(())) => {
                info!(task = %name, "run complete");
                Ok(())
            }
            Some(Err(err)) if err.is_fatal() || !options.keep_alive => Err(err.into()),
            Some(Err(err)) => {
                error!(
                    task = err.failing_task().unwrap_or(name),
                    error = %err,
                    "initial run failed; still watching, save a file to retry"
                );

                let mut revived: FuturesUnordered<_> = self
                    .unstarted(&options.long_running)?
                    .into_iter()
                    .map(|(task, ctx)| async move { task.run(ctx).await })
                    .collect();

                loop {
                    tokio::select! {
                        _ = &mut shutdown => break,
                        Some(res) = revived.next() => match res {
                            Ok(()) => {}
                            Err(err) if err.is_fatal() => return Err(err.into()),
                            Err(err) => warn!(error = %err, "long-running task stopped"),
                        },
                    }
                }
                info!("shutdown requested; stopping");
                Ok(())
            }
        }
    }

    /// Long-running leaves that were never started, ready to run.
    fn unstarted(&self, leaves: &[(String, Environment)]) -> Result<Vec<(Arc<Task>, TaskContext)>> {
        leaves
            .iter()
            .filter(|(leaf, _)| !self.context.has_started(leaf))
            .map(|(leaf, env)| {
                info!(task = %leaf, "starting task skipped by the failed run");
                Ok((self.registry.get(leaf)?, self.context.clone().with_environment(*env)))
            })
            .collect()
    }
}
