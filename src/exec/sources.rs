// src/exec/sources.rs

//! Resolve `src` globs of file-based collaborators to concrete files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::fs::{FileSystem, walk_files};
use crate::watch::path_utils::{relative_str, to_slash};
use crate::watch::patterns::{compile_glob, static_base};

/// One matched input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as seen through the filesystem (project root joined).
    pub path: PathBuf,
    /// Path below the glob's static base; destinations mirror it.
    pub relative: PathBuf,
}

impl SourceFile {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Partials (`_name.scss`) are only ever imported.
    pub fn is_partial(&self) -> bool {
        self.file_name().is_some_and(|n| n.starts_with('_'))
    }
}

/// Files under `root` matching any of `patterns`, sorted by path.
///
/// A file matched by several patterns is reported once, relative to the
/// first pattern that matched it.
pub fn collect_sources(fs: &dyn FileSystem, root: &Path, patterns: &[String]) -> Result<Vec<SourceFile>> {
    let mut found: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for pattern in patterns {
        let matcher = compile_glob(pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();
        let base = root.join(static_base(pattern));

        let files = walk_files(fs, &base)
            .with_context(|| format!("listing files under {}", base.display()))?;

        for path in files {
            let Some(rel) = relative_str(root, &path) else {
                continue;
            };
            if !matcher.is_match(&rel) || found.contains_key(&path) {
                continue;
            }
            let relative = path.strip_prefix(&base).unwrap_or(&path).to_path_buf();
            found.insert(path, relative);
        }
    }

    Ok(found
        .into_iter()
        .map(|(path, relative)| SourceFile { path, relative })
        .collect())
}

/// `relative` with its extension replaced by `suffix` + `.ext`,
/// e.g. `pages/home.scss` -> `pages/home.min.css`.
pub fn renamed(relative: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    relative.with_file_name(format!("{stem}{suffix}.{ext}"))
}

/// Display form of `path` relative to `root` for logs and reload messages.
pub fn display_relative(root: &Path, path: &Path) -> String {
    relative_str(root, path).unwrap_or_else(|| to_slash(path))
}
