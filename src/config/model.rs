// src/config/model.rs

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::Environment;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// output = "dist"
///
/// [server]
/// port = 3000
///
/// [task.styles]
/// kind = "styles"
/// src = ["assets/sass/*.{scss,sass}"]
/// dest = "assets/css"
///
/// [task.build]
/// kind = "series"
/// tasks = ["clean", "styles"]
/// env = "production"
///
/// [[watch]]
/// pattern = "assets/sass/**/*.{scss,sass}"
/// task = "styles"
/// ```
///
/// All sections except `[task.*]` are optional and have defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub server: ServerSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Watch bindings from `[[watch]]`.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on references being resolvable and the task graph being
/// acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    server: ServerSection,
    task: BTreeMap<String, TaskConfig>,
    watch: Vec<WatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            server: raw.server,
            task: raw.task,
            watch: raw.watch,
        }
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.config
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }

    pub fn watch_bindings(&self) -> &[WatchConfig] {
        &self.watch
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Project root, relative to the config file's directory.
    ///
    /// All source globs, destinations and watch patterns are relative to it.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Output root. Used as the default directory for `clean` tasks.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Debounce window for filesystem events, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Task run when no task name is given on the command line.
    #[serde(default = "default_task")]
    pub default_task: String,
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_task() -> String {
    "default".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            root: None,
            output: default_output(),
            debounce_ms: default_debounce_ms(),
            default_task: default_task(),
        }
    }
}

/// `[server]` section for the dev server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served over HTTP, relative to the project root.
    #[serde(default = "default_server_root")]
    pub root: PathBuf,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    3000
}

fn default_server_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root: default_server_root(),
        }
    }
}

/// `[task.<name>]` section, discriminated by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskConfig {
    /// Shell command collaborator (bundler, image optimizer, archiver, ...).
    Cmd { cmd: String },

    /// Sass/SCSS compilation through `grass`.
    Styles {
        src: Vec<String>,
        dest: PathBuf,
        #[serde(default = "default_suffix")]
        suffix: String,
    },

    /// Copy matching files to `dest`, keeping their path below the glob base.
    Copy { src: Vec<String>, dest: PathBuf },

    /// Recursively delete a directory (defaults to `[config].output`).
    Clean {
        #[serde(default)]
        dir: Option<PathBuf>,
    },

    /// Start the file watcher over every `[[watch]]` binding.
    Watch,

    /// Start the dev server; fields override `[server]`.
    Serve {
        #[serde(default)]
        root: Option<PathBuf>,
        #[serde(default)]
        port: Option<u16>,
    },

    /// Run `tasks` strictly in order.
    Series {
        tasks: Vec<String>,
        #[serde(default)]
        env: Option<Environment>,
    },

    /// Run `tasks` concurrently.
    Parallel {
        tasks: Vec<String>,
        #[serde(default)]
        env: Option<Environment>,
    },
}

fn default_suffix() -> String {
    ".min".to_string()
}

impl TaskConfig {
    /// Short label used in logs and dry-run output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TaskConfig::Cmd { .. } => "cmd",
            TaskConfig::Styles { .. } => "styles",
            TaskConfig::Copy { .. } => "copy",
            TaskConfig::Clean { .. } => "clean",
            TaskConfig::Watch => "watch",
            TaskConfig::Serve { .. } => "serve",
            TaskConfig::Series { .. } => "series",
            TaskConfig::Parallel { .. } => "parallel",
        }
    }

    /// Child task names for composites, empty for leaves.
    pub fn children(&self) -> &[String] {
        match self {
            TaskConfig::Series { tasks, .. } | TaskConfig::Parallel { tasks, .. } => tasks,
            _ => &[],
        }
    }

    /// Environment override declared on a composite.
    pub fn environment(&self) -> Option<Environment> {
        match self {
            TaskConfig::Series { env, .. } | TaskConfig::Parallel { env, .. } => *env,
            _ => None,
        }
    }

    /// Leaves that keep running until shutdown.
    pub fn is_long_running(&self) -> bool {
        matches!(self, TaskConfig::Watch | TaskConfig::Serve { .. })
    }

    /// Source globs of file-based collaborators.
    pub fn source_patterns(&self) -> &[String] {
        match self {
            TaskConfig::Styles { src, .. } | TaskConfig::Copy { src, .. } => src,
            _ => &[],
        }
    }
}

/// `[[watch]]` entry.
///
/// ```toml
/// [[watch]]
/// pattern = "assets/sass/components/*.{scss,sass}"
/// task = "styles"
/// reload = true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub pattern: String,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Task to run when a matching file changes.
    #[serde(default)]
    pub task: Option<String>,

    /// Send a full page reload (after `task` succeeds, if one is bound).
    #[serde(default)]
    pub reload: bool,

    /// Only fire when the file's content hash actually changed.
    #[serde(default)]
    pub use_hash: bool,
}
