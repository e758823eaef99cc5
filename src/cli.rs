// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Run front-end asset pipeline tasks, watch sources and serve with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run (e.g. `build` or `dev`).
    ///
    /// Default: `[config].default_task` from the config file.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Assetflow.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the expanded task plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_name_is_positional() {
        let args = CliArgs::parse_from(["assetflow", "build", "--config", "site/Assetflow.toml"]);
        assert_eq!(args.task.as_deref(), Some("build"));
        assert_eq!(args.config, "site/Assetflow.toml");
        assert!(!args.dry_run);
    }

    #[test]
    fn task_defaults_to_none() {
        let args = CliArgs::parse_from(["assetflow", "--dry-run"]);
        assert!(args.task.is_none());
        assert!(args.dry_run);
    }
}
