// src/watch/patterns.rs

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::WatchConfig;
use crate::engine::Task;

/// Compile a single glob the way every pattern in the config is matched:
/// case-sensitive, `*`/`?` never cross a `/`, `**` spans directories and
/// `{a,b}` alternation is allowed.
pub fn compile_glob(pattern: &str) -> std::result::Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

/// Build a `GlobSet` from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = compile_glob(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Leading directory of a glob that contains no wildcard.
///
/// `assets/sass/**/*.scss` -> `assets/sass`, `*.css` -> `` and a plain file
/// path such as `assets/logo.png` -> `assets`.
pub fn static_base(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();
    let split_idx = components
        .iter()
        .position(|c| c.contains(['*', '?', '[', '{']))
        .unwrap_or(components.len().saturating_sub(1));

    components.iter().take(split_idx).collect()
}

/// A compiled `[[watch]]` entry.
#[derive(Clone)]
pub struct WatchBinding {
    pattern: String,
    include: GlobSet,
    exclude: Option<GlobSet>,
    target: Option<Arc<Task>>,
    reload: bool,
    use_hash: bool,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("pattern", &self.pattern)
            .field("target", &self.target.as_ref().map(|t| t.name()))
            .field("reload", &self.reload)
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn compile(cfg: &WatchConfig, target: Option<Arc<Task>>) -> Result<Self> {
        let include = build_globset(std::slice::from_ref(&cfg.pattern))
            .with_context(|| format!("building watch globset for '{}'", cfg.pattern))?;

        let exclude = if cfg.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&cfg.exclude)
                    .with_context(|| format!("building exclude globset for '{}'", cfg.pattern))?,
            )
        };

        Ok(Self {
            pattern: cfg.pattern.clone(),
            include,
            exclude,
            target,
            reload: cfg.reload,
            use_hash: cfg.use_hash,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn target(&self) -> Option<&Arc<Task>> {
        self.target.as_ref()
    }

    pub fn reload(&self) -> bool {
        self.reload
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// True if `rel_path` (relative to the project root, `/`-separated)
    /// matches the pattern and none of the excludes.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// What one debounced batch of changes asks for.
#[derive(Debug, Default)]
pub struct Triggers {
    /// Tasks to run, each once, in first-match order. The flag asks for a
    /// page reload after that run succeeds.
    pub tasks: Vec<(Arc<Task>, bool)>,
    /// A task-less reload binding matched.
    pub reload_now: bool,
}

impl Triggers {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && !self.reload_now
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|(t, _)| t.name()).collect()
    }
}

/// Resolve a batch of changed paths against every binding.
///
/// `content_changed` is asked at most once per path, and only for paths hit
/// by a `use_hash` binding.
pub fn match_bindings<'a, I, F>(bindings: &[WatchBinding], rel_paths: I, mut content_changed: F) -> Triggers
where
    I: IntoIterator<Item = &'a str>,
    F: FnMut(&str) -> bool,
{
    let mut triggers = Triggers::default();
    let mut slot_by_task: HashMap<String, usize> = HashMap::new();
    let mut changed: HashMap<&str, bool> = HashMap::new();

    for rel in rel_paths {
        for binding in bindings.iter().filter(|b| b.matches(rel)) {
            if binding.use_hash() && !*changed.entry(rel).or_insert_with(|| content_changed(rel)) {
                continue;
            }

            match binding.target() {
                None => triggers.reload_now |= binding.reload(),
                Some(task) => match slot_by_task.get(task.name()) {
                    Some(&idx) => triggers.tasks[idx].1 |= binding.reload(),
                    None => {
                        slot_by_task.insert(task.name().to_string(), triggers.tasks.len());
                        triggers.tasks.push((Arc::clone(task), binding.reload()));
                    }
                },
            }
        }
    }

    triggers
}
