// tests/clean.rs

mod common;
use crate::common::{init_tracing, write_file};

use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;

use assetflow::engine::{Task, TaskContext};
use assetflow::errors::TaskError;
use assetflow::exec::{clean, clean_task};
use assetflow::fs::mock::MockFileSystem;
use assetflow::fs::RealFileSystem;

#[test]
fn missing_directory_is_already_clean() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("dist");

    clean(&RealFileSystem, &output).unwrap();
    assert!(!output.exists());
}

#[test]
fn existing_tree_is_removed() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "dist/css/main.min.css", "a{}");
    write_file(dir.path(), "dist/js/app.js", "");
    write_file(dir.path(), "assets/sass/main.scss", "a {}");

    clean(&RealFileSystem, &dir.path().join("dist")).unwrap();

    assert!(!dir.path().join("dist").exists());
    assert!(dir.path().join("assets/sass/main.scss").exists());
}

#[tokio::test]
async fn locked_file_fails_with_io_error() {
    init_tracing();
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file("./dist/app.js", "held open");
    fs.lock("./dist/app.js");

    let task = Task::new("clean", clean_task(Path::new("./dist").to_path_buf(), fs.clone()));
    let err = task.run(TaskContext::default()).await.unwrap_err();

    match err {
        TaskError::Failed { task, source } => {
            assert_eq!(task, "clean");
            match *source {
                TaskError::Io { path, source } => {
                    assert_eq!(path, Path::new("./dist"));
                    assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
                }
                other => panic!("expected Io, got {other:?}"),
            }
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(fs.contents("./dist/app.js").is_some());
}
