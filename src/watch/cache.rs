// src/watch/cache.rs

use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use blake3::{Hash, Hasher};
use tracing::{debug, warn};

use crate::fs::{FileSystem, walk_files};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchBinding;

/// Compute the blake3 hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> io::Result<Hash> {
    let mut hasher = Hasher::new();
    let mut file = fs.open_read(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Last seen content hash per file, for `use_hash` bindings.
///
/// Saving a file without editing it produces a filesystem event but the same
/// hash, so [`FileCache::refresh`] reports it as unchanged.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, Hash>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash every existing file under `root` matched by a `use_hash`
    /// binding, so the first real edit is compared against its on-disk state.
    pub fn prime(&mut self, fs: &dyn FileSystem, root: &Path, bindings: &[WatchBinding]) {
        let hashed: Vec<&WatchBinding> = bindings.iter().filter(|b| b.use_hash()).collect();
        if hashed.is_empty() {
            return;
        }

        let files = match walk_files(fs, root) {
            Ok(files) => files,
            Err(err) => {
                warn!(root = %root.display(), error = %err, "could not prime content hashes");
                return;
            }
        };

        for path in files {
            let Some(rel) = relative_str(root, &path) else {
                continue;
            };
            if !hashed.iter().any(|b| b.matches(&rel)) {
                continue;
            }
            if let Ok(hash) = compute_file_hash(fs, &path) {
                self.hashes.insert(path, hash);
            }
        }
        debug!(files = self.hashes.len(), "primed content hashes");
    }

    /// Re-hash `path` and report whether its content differs from the last
    /// time it was seen. Removal and unreadable files count as changed.
    pub fn refresh(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        match compute_file_hash(fs, path) {
            Ok(hash) => match self.hashes.insert(path.to_path_buf(), hash) {
                Some(previous) if previous == hash => {
                    debug!(path = %path.display(), "content unchanged");
                    false
                }
                _ => true,
            },
            Err(err) => {
                debug!(path = %path.display(), error = %err, "file gone or unreadable");
                self.hashes.remove(path);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn touch_without_edit_is_unchanged() {
        let fs = MockFileSystem::new();
        let path = Path::new("./assets/sass/main.scss");
        fs.add_file(path, "body { color: red; }");

        let mut cache = FileCache::new();
        assert!(cache.refresh(&fs, path), "first sighting counts as a change");
        assert!(!cache.refresh(&fs, path));

        fs.add_file(path, "body { color: blue; }");
        assert!(cache.refresh(&fs, path));
    }

    #[test]
    fn removal_counts_as_change() {
        let fs = MockFileSystem::new();
        let path = Path::new("./a.txt");
        fs.add_file(path, "x");

        let mut cache = FileCache::new();
        cache.refresh(&fs, path);
        fs.remove_dir_all(Path::new(".")).ok();
        assert!(cache.refresh(&fs, path));
        assert!(cache.is_empty());
    }
}
