// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod server;
pub mod types;
pub mod watch;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, TaskConfig, load_and_validate};
use crate::dag::Plan;
use crate::engine::{RunOptions, Runtime, TaskContext};
use crate::errors::Result;
use crate::exec::build_registry;
use crate::fs::{FileSystem, RealFileSystem};
use crate::server::ReloadHub;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - plan expansion (and `--dry-run` output)
/// - registry construction
/// - the runtime, with Ctrl-C as the shutdown signal
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = project_root(&config_path, &cfg);

    let task = args
        .task
        .clone()
        .unwrap_or_else(|| cfg.settings().default_task.clone());

    if args.dry_run {
        let plan = Plan::expand(&cfg, &task)?;
        build_registry(&cfg, &root, Arc::new(RealFileSystem))?;
        println!("assetflow dry-run ({})", config_path.display());
        println!("  root: {}", root.display());
        println!();
        print!("{}", plan.render());
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    run_task(&cfg, &root, &task, Arc::new(RealFileSystem), shutdown_signal()).await
}

/// Run `task` from a validated config until it finishes, fails, or
/// `shutdown` resolves.
///
/// Runs whose plan contains a `watch` or `serve` leaf are development
/// sessions: a non-fatal failure is reported and the call waits for
/// `shutdown` instead of returning the error.
pub async fn run_task<S>(
    cfg: &ConfigFile,
    root: &Path,
    task: &str,
    fs: Arc<dyn FileSystem>,
    shutdown: S,
) -> Result<()>
where
    S: Future<Output = ()>,
{
    let plan = Plan::expand(cfg, task)?;
    let options = RunOptions {
        keep_alive: plan.is_long_running(),
        long_running: plan
            .long_running_leaves()
            .into_iter()
            .map(|leaf| (leaf.name().to_string(), leaf.environment()))
            .collect(),
    };
    info!(task = %task, root = %root.display(), leaves = ?plan.leaf_names(), "running");

    let registry = build_registry(cfg, root, fs)?;
    let hub = ReloadHub::serving(served_dir(cfg, &plan));
    let runtime = Runtime::new(registry, TaskContext::new(hub));
    runtime.run(task, options, shutdown).await
}

/// Document root of the plan's dev server, relative to the project root:
/// the first `serve` leaf's `root`, else `[server].root`.
pub fn served_dir(cfg: &ConfigFile, plan: &Plan) -> PathBuf {
    let serve_root = plan.long_running_leaves().into_iter().find_map(|leaf| match cfg.task(leaf.name()) {
        Some(TaskConfig::Serve { root, .. }) => Some(root.clone()),
        _ => None,
    });

    serve_root
        .flatten()
        .unwrap_or_else(|| cfg.server().root.clone())
}

/// Project root: `[config].root` resolved against the config file's
/// directory, or that directory itself.
///
/// A bare file name such as `Assetflow.toml` (parent = "") resolves against
/// the current working directory.
pub fn project_root(config_path: &Path, cfg: &ConfigFile) -> PathBuf {
    let base = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    match &cfg.settings().root {
        Some(root) => base.join(root),
        None => base,
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed the run simply
/// never receives a shutdown request.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
