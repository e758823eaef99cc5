#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use assetflow::config::{
    ConfigFile, ConfigSection, RawConfigFile, ServerSection, TaskConfig, WatchConfig,
};
use assetflow::errors::Result;
use assetflow::types::Environment;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                server: ServerSection::default(),
                task: BTreeMap::new(),
                watch: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_watch(mut self, binding: WatchConfig) -> Self {
        self.config.watch.push(binding);
        self
    }

    pub fn output(mut self, dir: &str) -> Self {
        self.config.config.output = PathBuf::from(dir);
        self
    }

    pub fn default_task(mut self, name: &str) -> Self {
        self.config.config.default_task = name.to_string();
        self
    }

    pub fn server_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Validate, returning the error instead of panicking.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthands for `TaskConfig` variants.
pub mod task {
    use super::*;

    fn names(tasks: &[&str]) -> Vec<String> {
        tasks.iter().map(|t| t.to_string()).collect()
    }

    pub fn cmd(cmd: &str) -> TaskConfig {
        TaskConfig::Cmd {
            cmd: cmd.to_string(),
        }
    }

    pub fn styles(src: &str, dest: &str) -> TaskConfig {
        TaskConfig::Styles {
            src: vec![src.to_string()],
            dest: PathBuf::from(dest),
            suffix: ".min".to_string(),
        }
    }

    pub fn copy(src: &str, dest: &str) -> TaskConfig {
        TaskConfig::Copy {
            src: vec![src.to_string()],
            dest: PathBuf::from(dest),
        }
    }

    pub fn clean() -> TaskConfig {
        TaskConfig::Clean { dir: None }
    }

    pub fn watch() -> TaskConfig {
        TaskConfig::Watch
    }

    pub fn serve() -> TaskConfig {
        TaskConfig::Serve {
            root: None,
            port: None,
        }
    }

    pub fn series(tasks: &[&str]) -> TaskConfig {
        TaskConfig::Series {
            tasks: names(tasks),
            env: None,
        }
    }

    pub fn parallel(tasks: &[&str]) -> TaskConfig {
        TaskConfig::Parallel {
            tasks: names(tasks),
            env: None,
        }
    }

    pub fn production_series(tasks: &[&str]) -> TaskConfig {
        TaskConfig::Series {
            tasks: names(tasks),
            env: Some(Environment::Production),
        }
    }
}

/// Builder for `[[watch]]` entries.
pub struct WatchBuilder {
    binding: WatchConfig,
}

impl WatchBuilder {
    pub fn new(pattern: &str) -> Self {
        Self {
            binding: WatchConfig {
                pattern: pattern.to_string(),
                exclude: Vec::new(),
                task: None,
                reload: false,
                use_hash: false,
            },
        }
    }

    pub fn task(mut self, name: &str) -> Self {
        self.binding.task = Some(name.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.binding.exclude.push(pattern.to_string());
        self
    }

    pub fn reload(mut self, val: bool) -> Self {
        self.binding.reload = val;
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.binding.use_hash = val;
        self
    }

    pub fn build(self) -> WatchConfig {
        self.binding
    }
}
