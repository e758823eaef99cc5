// tests/registry.rs

mod common;
use crate::common::{Recorder, init_tracing};

use assetflow::engine::{TaskContext, TaskRegistry};
use assetflow::errors::AssetflowError;

#[tokio::test]
async fn registered_body_runs_on_lookup() {
    init_tracing();
    let rec = Recorder::new();
    let mut registry = TaskRegistry::new();
    registry.register("styles", rec.ok("styles")).unwrap();

    let task = registry.get("styles").unwrap();
    task.run(TaskContext::default()).await.unwrap();

    assert_eq!(rec.events(), vec!["styles"]);
}

#[test]
fn duplicate_name_is_rejected() {
    let rec = Recorder::new();
    let mut registry = TaskRegistry::new();
    registry.register("clean", rec.ok("clean")).unwrap();

    match registry.register("clean", rec.ok("clean-again")) {
        Err(AssetflowError::DuplicateTask(name)) => assert_eq!(name, "clean"),
        other => panic!("expected DuplicateTask, got {other:?}"),
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn unknown_name_is_rejected() {
    let registry = TaskRegistry::new();
    match registry.get("deploy") {
        Err(AssetflowError::UnknownTask(name)) => assert_eq!(name, "deploy"),
        other => panic!("expected UnknownTask, got {other:?}"),
    }
}

#[test]
fn resolve_fails_on_first_unknown() {
    let rec = Recorder::new();
    let mut registry = TaskRegistry::new();
    registry.register("a", rec.ok("a")).unwrap();

    let err = registry.resolve(&["a", "b", "c"]).unwrap_err();
    assert!(matches!(err, AssetflowError::UnknownTask(name) if name == "b"));
    assert_eq!(registry.resolve(&["a"]).unwrap().len(), 1);
}
