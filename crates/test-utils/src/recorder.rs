use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use assetflow::engine::{Completion, TaskContext};
use assetflow::errors::TaskError;

/// Shared log of what fake task bodies did, in order.
///
/// Bodies push `"<name>"` when they run; delayed bodies push
/// `"<name>:start"` / `"<name>:end"`; environment readers push
/// `"<name>=<env>"`.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    /// Records its name and succeeds synchronously.
    pub fn ok(&self, name: &str) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
        let rec = self.clone();
        let name = name.to_string();
        move |_ctx| {
            rec.push(name.clone());
            Completion::ok()
        }
    }

    /// Records its name and fails.
    pub fn failing(&self, name: &str) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
        let rec = self.clone();
        let name = name.to_string();
        move |_ctx| {
            rec.push(name.clone());
            Completion::from_result(Err(TaskError::Other(anyhow!("{name} broke"))))
        }
    }

    /// Records start and end around a sleep.
    pub fn delayed(&self, name: &str, delay: Duration) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
        let rec = self.clone();
        let name = name.to_string();
        move |_ctx| {
            let rec = rec.clone();
            let name = name.clone();
            Completion::future(async move {
                rec.push(format!("{name}:start"));
                tokio::time::sleep(delay).await;
                rec.push(format!("{name}:end"));
                Ok(())
            })
        }
    }

    /// Like [`Recorder::delayed`] but fails after the sleep.
    pub fn delayed_failing(&self, name: &str, delay: Duration) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
        let rec = self.clone();
        let name = name.to_string();
        move |_ctx| {
            let rec = rec.clone();
            let name = name.clone();
            Completion::future(async move {
                rec.push(format!("{name}:start"));
                tokio::time::sleep(delay).await;
                rec.push(format!("{name}:end"));
                Err(TaskError::Other(anyhow!("{name} broke")))
            })
        }
    }

    /// Records the environment it observed.
    pub fn env_reader(&self, name: &str) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
        let rec = self.clone();
        let name = name.to_string();
        move |ctx: TaskContext| {
            rec.push(format!("{name}={}", ctx.environment()));
            Completion::ok()
        }
    }
}
