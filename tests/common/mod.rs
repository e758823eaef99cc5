#![allow(dead_code, unused_imports)]

pub use assetflow_test_utils::builders;
pub use assetflow_test_utils::recorder::Recorder;
pub use assetflow_test_utils::{init_tracing, with_timeout};

use std::fs;
use std::path::Path;

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
