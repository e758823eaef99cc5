// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::dag::TaskGraph;
use crate::errors::{AssetflowError, Result};
use crate::watch::patterns::{compile_glob, static_base};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_references(cfg)?;
    validate_source_globs(cfg)?;
    validate_clean_targets(cfg)?;
    validate_watch_bindings(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(AssetflowError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.debounce_ms == 0 {
        return Err(AssetflowError::ConfigError(
            "[config].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.default_task.trim().is_empty() {
        return Err(AssetflowError::ConfigError(
            "[config].default_task must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_task_references(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if matches!(task, TaskConfig::Series { .. } | TaskConfig::Parallel { .. })
            && task.children().is_empty()
        {
            return Err(AssetflowError::ConfigError(format!(
                "{} task '{}' must list at least one task in `tasks`",
                task.kind_name(),
                name
            )));
        }

        for child in task.children() {
            if !cfg.task.contains_key(child) {
                return Err(AssetflowError::ConfigError(format!(
                    "task '{}' has unknown task '{}' in `tasks`",
                    name, child
                )));
            }
            if child == name {
                return Err(AssetflowError::ConfigError(format!(
                    "task '{}' cannot contain itself in `tasks`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_source_globs(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if matches!(task, TaskConfig::Styles { .. } | TaskConfig::Copy { .. })
            && task.source_patterns().is_empty()
        {
            return Err(AssetflowError::ConfigError(format!(
                "task '{}' must list at least one pattern in `src`",
                name
            )));
        }

        for pattern in task.source_patterns() {
            compile_glob(pattern).map_err(|err| {
                AssetflowError::ConfigError(format!(
                    "task '{}' has invalid glob '{}': {}",
                    name, pattern, err
                ))
            })?;
        }
    }
    Ok(())
}

/// Lexically normalize a root-relative path. `None` if it climbs above the
/// project root without coming back below it.
fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    let mut above = 0usize;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    above += 1;
                }
            }
            Component::Normal(part) => parts.push(part),
            Component::RootDir | Component::Prefix(_) => return Some(path.to_path_buf()),
        }
    }
    match (above, parts.is_empty()) {
        (0, _) => Some(parts.into_iter().collect()),
        (_, true) => None,
        // Outside the project; cannot contain its sources.
        (_, false) => Some(path.to_path_buf()),
    }
}

fn validate_clean_targets(cfg: &RawConfigFile) -> Result<()> {
    let source_bases: Vec<PathBuf> = cfg
        .task
        .values()
        .flat_map(|task| task.source_patterns())
        .filter_map(|pattern| normalize_relative(&static_base(pattern)))
        .collect();

    for (name, task) in cfg.task.iter() {
        let TaskConfig::Clean { dir } = task else {
            continue;
        };
        let dir = dir.as_ref().unwrap_or(&cfg.config.output);
        let refuse = |what: &str| {
            Err(AssetflowError::ConfigError(format!(
                "clean task '{}' would delete {} ('{}')",
                name,
                what,
                dir.display()
            )))
        };

        if dir.is_absolute() {
            continue;
        }
        match normalize_relative(dir) {
            None => return refuse("a parent of the project root"),
            Some(target) if target.as_os_str().is_empty() => return refuse("the project root"),
            Some(target) => {
                if source_bases.iter().any(|base| base.starts_with(&target)) {
                    return refuse("source files");
                }
            }
        }
    }
    Ok(())
}

fn validate_watch_bindings(cfg: &RawConfigFile) -> Result<()> {
    for (idx, binding) in cfg.watch.iter().enumerate() {
        let label = format!("[[watch]] #{} ('{}')", idx + 1, binding.pattern);

        for pattern in std::iter::once(&binding.pattern).chain(binding.exclude.iter()) {
            compile_glob(pattern).map_err(|err| {
                AssetflowError::ConfigError(format!("{label} has invalid glob '{pattern}': {err}"))
            })?;
        }

        match &binding.task {
            None if !binding.reload => {
                return Err(AssetflowError::ConfigError(format!(
                    "{label} needs a `task`, `reload = true`, or both"
                )));
            }
            None => {}
            Some(task) => match cfg.task.get(task) {
                None => {
                    return Err(AssetflowError::ConfigError(format!(
                        "{label} refers to unknown task '{task}'"
                    )));
                }
                Some(target) if target.is_long_running() => {
                    return Err(AssetflowError::ConfigError(format!(
                        "{label} cannot trigger long-running {} task '{task}'",
                        target.kind_name()
                    )));
                }
                Some(_) => {}
            },
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    TaskGraph::build(&cfg.task, &cfg.watch)
        .registration_order()
        .map(|_| ())
}
