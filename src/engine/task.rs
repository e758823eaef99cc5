// src/engine/task.rs

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{debug, info};

use crate::engine::TaskName;
use crate::engine::completion::{Completion, TaskResult};
use crate::errors::TaskError;
use crate::server::ReloadHub;
use crate::types::Environment;

/// Signature of a task body.
pub type TaskBody = Arc<dyn Fn(TaskContext) -> Completion + Send + Sync>;

/// Values threaded into every task invocation.
///
/// A task receives its own copy and cannot change what its siblings or
/// parent observe. The environment is only ever replaced by a composite for
/// its subtree, before the subtree starts.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    env: Environment,
    reload: ReloadHub,
    started: Arc<Mutex<HashSet<TaskName>>>,
}

impl TaskContext {
    pub fn new(reload: ReloadHub) -> Self {
        Self {
            env: Environment::Development,
            reload,
            started: Arc::default(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.env
    }

    pub fn is_production(&self) -> bool {
        self.env.is_production()
    }

    /// Channel to connected browsers.
    pub fn reload(&self) -> &ReloadHub {
        &self.reload
    }

    /// True once a task named `name` was started with this context or a
    /// copy of it.
    pub fn has_started(&self, name: &str) -> bool {
        self.started
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(name)
    }

    pub(crate) fn mark_started(&self, name: &str) {
        self.started
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string());
    }

    pub(crate) fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }
}

/// A named unit of work.
///
/// Composites built by [`crate::engine::series`] / [`crate::engine::parallel`]
/// are tasks too, so groups nest freely.
#[derive(Clone)]
pub struct Task {
    name: TaskName,
    body: TaskBody,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Task {
    pub fn new<N, F>(name: N, body: F) -> Self
    where
        N: Into<TaskName>,
        F: Fn(TaskContext) -> Completion + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Make this task and everything below it observe `env`.
    pub fn with_environment(self, env: Environment) -> Self {
        let inner = self.body;
        Self {
            name: self.name,
            body: Arc::new(move |ctx: TaskContext| inner(ctx.with_environment(env))),
        }
    }

    /// Never let two runs of this task overlap: a run started while another
    /// is in progress waits for it to finish first.
    ///
    /// Applied to every task a `[[watch]]` binding targets, so a watch
    /// trigger arriving during a run started by a composite cannot write the
    /// same outputs concurrently.
    pub fn exclusive(self) -> Self {
        let inner = self.body;
        let lock = Arc::new(tokio::sync::Mutex::new(()));
        Self {
            name: self.name,
            body: Arc::new(move |ctx: TaskContext| {
                let inner = Arc::clone(&inner);
                let lock = Arc::clone(&lock);
                Completion::future(async move {
                    let _guard = lock.lock().await;
                    inner(ctx).into_future().await
                })
            }),
        }
    }

    /// Invoke the body and wait for its completion signal.
    ///
    /// Errors coming out of a leaf are wrapped in [`TaskError::Failed`] with
    /// this task's name; errors already wrapped by a descendant pass through
    /// untouched.
    pub async fn run(&self, ctx: TaskContext) -> TaskResult {
        info!(task = %self.name, env = %ctx.environment(), "Starting '{}'", self.name);
        ctx.mark_started(&self.name);
        let started = Instant::now();

        let result = (self.body)(ctx).into_future().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(task = %self.name, elapsed_ms, "Finished '{}' after {} ms", self.name, elapsed_ms);
                Ok(())
            }
            Err(err @ TaskError::Failed { .. }) => {
                debug!(task = %self.name, elapsed_ms, "aborted by failing child");
                Err(err)
            }
            Err(err) => Err(TaskError::Failed {
                task: self.name.clone(),
                source: Box::new(err),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn leaf_errors_carry_the_task_name() {
        let task = Task::new("styles", |_| Completion::from_result(Err(TaskError::Abandoned)));
        let err = task.run(TaskContext::default()).await.unwrap_err();
        assert_eq!(err.failing_task(), Some("styles"));
    }

    #[tokio::test]
    async fn environment_override_reaches_the_body() {
        let task = Task::new("reader", |ctx: TaskContext| {
            if ctx.is_production() {
                Completion::ok()
            } else {
                Completion::from_result(Err(TaskError::Abandoned))
            }
        })
        .with_environment(Environment::Production);

        assert!(task.run(TaskContext::default()).await.is_ok());
    }

    #[tokio::test]
    async fn started_tasks_are_visible_through_copies() {
        let ctx = TaskContext::default();
        let task = Task::new("watch", |_| Completion::ok());
        task.run(ctx.clone().with_environment(Environment::Production))
            .await
            .unwrap();
        assert!(ctx.has_started("watch"));
        assert!(!ctx.has_started("serve"));
    }

    #[tokio::test]
    async fn exclusive_runs_never_overlap() {
        let active = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let overlapped = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let (a, o) = (Arc::clone(&active), Arc::clone(&overlapped));
        let task = Arc::new(
            Task::new("styles", move |_| {
                let (a, o) = (Arc::clone(&a), Arc::clone(&o));
                Completion::future(async move {
                    use std::sync::atomic::Ordering::SeqCst;
                    if a.fetch_add(1, SeqCst) > 0 {
                        o.store(true, SeqCst);
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    a.fetch_sub(1, SeqCst);
                    Ok(())
                })
            })
            .exclusive(),
        );

        let runs: Vec<_> = (0..3)
            .map(|_| {
                let task = Arc::clone(&task);
                tokio::spawn(async move { task.run(TaskContext::default()).await })
            })
            .collect();
        for run in runs {
            run.await.unwrap().unwrap();
        }
        assert!(!overlapped.load(std::sync::atomic::Ordering::SeqCst));
    }
}
