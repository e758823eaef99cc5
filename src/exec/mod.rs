// src/exec/mod.rs

//! Collaborator task kinds and registry construction.
//!
//! - [`command`] runs shell commands (bundlers, optimizers, archivers).
//! - [`styles`] compiles Sass/SCSS through `grass`.
//! - [`copy`] copies static resources.
//! - [`clean`] removes the output directory.
//! - [`sources`] resolves `src` globs to files.
//!
//! [`build_registry`] turns a validated config into a [`TaskRegistry`].

pub mod clean;
pub mod command;
pub mod copy;
pub mod sources;
pub mod styles;

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::{ConfigFile, TaskConfig};
use crate::dag::TaskGraph;
use crate::engine::{Task, TaskRegistry, parallel, series};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::server::serve_task;
use crate::watch::{WatchBinding, watch_task};

pub use clean::{clean, clean_task};
pub use command::{command_task, run_command};
pub use copy::{CopyJob, copy_task};
pub use styles::{StylesJob, styles_task};

/// Register every configured task, children before the composites and
/// watchers that use them.
///
/// `root` is the project root all relative paths in the config resolve
/// against.
pub fn build_registry(cfg: &ConfigFile, root: &Path, fs: Arc<dyn FileSystem>) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    let order = TaskGraph::from_config(cfg).registration_order()?;
    let bound: HashSet<&str> = cfg
        .watch_bindings()
        .iter()
        .filter_map(|binding| binding.task.as_deref())
        .collect();

    for name in order {
        let Some(task) = cfg.task(name) else {
            continue;
        };
        debug!(task = %name, kind = task.kind_name(), "building task");

        let built = match task {
            TaskConfig::Cmd { cmd } => Task::new(name, command_task(cmd.clone(), root.to_path_buf())),
            TaskConfig::Styles { src, dest, suffix } => {
                let job = StylesJob {
                    root: root.to_path_buf(),
                    src: src.clone(),
                    dest: dest.clone(),
                    suffix: suffix.clone(),
                };
                Task::new(name, styles_task(job, Arc::clone(&fs)))
            }
            TaskConfig::Copy { src, dest } => {
                let job = CopyJob {
                    root: root.to_path_buf(),
                    src: src.clone(),
                    dest: dest.clone(),
                };
                Task::new(name, copy_task(job, Arc::clone(&fs)))
            }
            TaskConfig::Clean { dir } => {
                let dir = root.join(dir.as_ref().unwrap_or(&cfg.settings().output));
                Task::new(name, clean_task(dir, Arc::clone(&fs)))
            }
            TaskConfig::Watch => {
                let bindings = cfg
                    .watch_bindings()
                    .iter()
                    .map(|binding| -> Result<WatchBinding> {
                        let target = binding
                            .task
                            .as_deref()
                            .map(|t| registry.get(t))
                            .transpose()?;
                        Ok(WatchBinding::compile(binding, target)?)
                    })
                    .collect::<Result<Vec<_>>>()?;
                let debounce = Duration::from_millis(cfg.settings().debounce_ms);
                Task::new(
                    name,
                    watch_task(root.to_path_buf(), Arc::new(bindings), debounce, Arc::clone(&fs)),
                )
            }
            TaskConfig::Serve { root: serve_root, port } => {
                let server = cfg.server();
                let addr = SocketAddr::new(server.host, port.unwrap_or(server.port));
                let dir = root.join(serve_root.as_ref().unwrap_or(&server.root));
                Task::new(name, serve_task(dir, addr))
            }
            TaskConfig::Series { tasks, env } => {
                let composite = series(name, registry.resolve(tasks)?);
                match env {
                    Some(env) => composite.with_environment(*env),
                    None => composite,
                }
            }
            TaskConfig::Parallel { tasks, env } => {
                let composite = parallel(name, registry.resolve(tasks)?);
                match env {
                    Some(env) => composite.with_environment(*env),
                    None => composite,
                }
            }
        };

        // Watch triggers and composites share one instance of a bound task.
        if bound.contains(name) {
            registry.insert(built.exclusive())?;
        } else {
            registry.insert(built)?;
        }
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_from_str;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn every_configured_task_is_registered() {
        let cfg = load_from_str(
            r#"
            [task.clean]
            kind = "clean"

            [task.styles]
            kind = "styles"
            src = ["assets/sass/*.scss"]
            dest = "assets/css"

            [task.watch]
            kind = "watch"

            [task.serve]
            kind = "serve"
            port = 0

            [task.default]
            kind = "parallel"
            tasks = ["styles", "watch", "serve"]

            [[watch]]
            pattern = "assets/sass/**/*.scss"
            task = "styles"
            "#,
        )
        .unwrap();

        let registry = build_registry(&cfg, Path::new("."), Arc::new(MockFileSystem::new())).unwrap();
        let mut names: Vec<&str> = registry.names().collect();
        names.sort();
        assert_eq!(names, vec!["clean", "default", "serve", "styles", "watch"]);
    }
}
