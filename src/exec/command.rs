// src/exec/command.rs

//! Shell command collaborator (bundlers, image optimizers, archivers).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::engine::{Completion, TaskContext};
use crate::errors::TaskError;
use crate::types::Environment;

/// Body of a `cmd` task.
pub fn command_task(cmd: String, root: PathBuf) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
    move |ctx: TaskContext| {
        let cmd = cmd.clone();
        let root = root.clone();
        Completion::future(async move { run_command(&cmd, &root, ctx.environment()).await })
    }
}

/// Run `cmd` through the platform shell in `root`.
///
/// The environment is exported as `ASSETFLOW_ENV` and `NODE_ENV` so build
/// tools can pick their mode. Output is forwarded line by line to the log:
/// stdout at info, stderr at warn.
pub async fn run_command(cmd: &str, root: &Path, env: Environment) -> Result<(), TaskError> {
    info!(cmd = %cmd, env = %env, "starting command");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .current_dir(root)
        .env("ASSETFLOW_ENV", env.as_str())
        .env("NODE_ENV", env.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning `{cmd}` in {}", root.display()))?;

    let stdout = child.stdout.take().map(|stdout| {
        let label = cmd.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(cmd = %label, "{}", line);
            }
        })
    });

    let stderr = child.stderr.take().map(|stderr| {
        let label = cmd.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(cmd = %label, "{}", line);
            }
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for `{cmd}`"))?;

    // Drain remaining output before reporting.
    for reader in [stdout, stderr].into_iter().flatten() {
        let _ = reader.await;
    }

    let code = status.code().unwrap_or(-1);
    debug!(cmd = %cmd, exit_code = code, success = status.success(), "command exited");

    if status.success() {
        Ok(())
    } else {
        Err(TaskError::Command {
            cmd: cmd.to_string(),
            code,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_zero_exit_is_a_command_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_command("exit 3", dir.path(), Environment::Development)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Command { code: 3, .. }));
    }

    #[tokio::test]
    async fn environment_is_exported() {
        let dir = tempfile::tempdir().unwrap();
        run_command(
            "test \"$ASSETFLOW_ENV\" = production && test \"$NODE_ENV\" = production",
            dir.path(),
            Environment::Production,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn runs_in_project_root() {
        let dir = tempfile::tempdir().unwrap();
        run_command("echo hi > out.txt", dir.path(), Environment::Development)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("out.txt")).unwrap().trim(), "hi");
    }
}
