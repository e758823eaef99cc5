// src/engine/registry.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::engine::TaskName;
use crate::engine::completion::Completion;
use crate::engine::task::{Task, TaskContext};
use crate::errors::{AssetflowError, Result};

/// Name -> task lookup, filled once at startup.
#[derive(Debug, Default, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Arc<Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `body` under `name`.
    ///
    /// Fails with [`AssetflowError::DuplicateTask`] if the name is taken.
    pub fn register<N, F>(&mut self, name: N, body: F) -> Result<Arc<Task>>
    where
        N: Into<TaskName>,
        F: Fn(TaskContext) -> Completion + Send + Sync + 'static,
    {
        self.insert(Task::new(name, body))
    }

    /// Register an already-built task (typically a composite).
    pub fn insert(&mut self, task: Task) -> Result<Arc<Task>> {
        if self.tasks.contains_key(task.name()) {
            return Err(AssetflowError::DuplicateTask(task.name().to_string()));
        }

        debug!(task = %task.name(), "registered task");
        let task = Arc::new(task);
        self.tasks.insert(task.name().to_string(), Arc::clone(&task));
        Ok(task)
    }

    pub fn get(&self, name: &str) -> Result<Arc<Task>> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| AssetflowError::UnknownTask(name.to_string()))
    }

    /// Look up several names, failing on the first unknown one.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<Task>>> {
        names.iter().map(|n| self.get(n.as_ref())).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
