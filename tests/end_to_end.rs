// tests/end_to_end.rs

mod common;
use crate::common::{init_tracing, with_timeout, write_file};

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use tokio::sync::oneshot;

use assetflow::cli::CliArgs;
use assetflow::config::{ConfigFile, load_and_validate};
use assetflow::errors::{AssetflowError, TaskError};
use assetflow::fs::RealFileSystem;
use assetflow::{project_root, run, run_task};

type TestResult = Result<(), Box<dyn Error>>;

const PROJECT: &str = r#"
[config]
output = "dist"
debounce_ms = 50

[task.clean]
kind = "clean"

[task.styles]
kind = "styles"
src = ["assets/sass/**/*.scss"]
dest = "dist/css"

[task.build]
kind = "series"
tasks = ["clean", "styles"]
env = "production"

[task.styles-dev]
kind = "series"
tasks = ["styles"]

[task.watch]
kind = "watch"

[task.default]
kind = "parallel"
tasks = ["styles", "watch"]

[task.dev]
kind = "series"
tasks = ["styles", "watch"]

[[watch]]
pattern = "assets/sass/**/*.scss"
task = "styles"
"#;

const MAIN_SCSS: &str = "@import \"variables\";\n\n.header {\n  padding: $gutter;\n  .logo { width: 10px; }\n}\n";
const VARIABLES_SCSS: &str = "$gutter: 12px;\n";

fn project(dir: &Path) -> (PathBuf, ConfigFile, PathBuf) {
    write_file(dir, "Assetflow.toml", PROJECT);
    write_file(dir, "assets/sass/main.scss", MAIN_SCSS);
    write_file(dir, "assets/sass/_variables.scss", VARIABLES_SCSS);

    let config_path = dir.join("Assetflow.toml");
    let cfg = load_and_validate(&config_path).unwrap();
    let root = project_root(&config_path, &cfg);
    (config_path, cfg, root)
}

fn css_outputs(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root.join("dist/css"))
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn build_writes_one_compressed_stylesheet() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (_, cfg, root) = project(dir.path());
    write_file(&root, "dist/stale.txt", "left over from last build");

    with_timeout(run_task(&cfg, &root, "build", Arc::new(RealFileSystem), std::future::pending())).await?;

    assert!(!root.join("dist/stale.txt").exists(), "clean ran first");
    assert_eq!(css_outputs(&root), vec!["main.min.css"]);

    let css = fs::read_to_string(root.join("dist/css/main.min.css"))?;
    assert!(css.contains(".header{padding:12px}"), "compressed output, got: {css}");
    assert!(!css.contains("\n  "), "no indentation in production output");
    Ok(())
}

#[tokio::test]
async fn development_output_is_expanded() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (_, cfg, root) = project(dir.path());

    with_timeout(run_task(&cfg, &root, "styles-dev", Arc::new(RealFileSystem), std::future::pending())).await?;

    let css = fs::read_to_string(root.join("dist/css/main.min.css"))?;
    assert!(css.contains(".header {\n  padding: 12px;\n}"), "got: {css}");
    Ok(())
}

#[tokio::test]
async fn build_failure_names_the_failing_task() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (_, cfg, root) = project(dir.path());
    write_file(&root, "assets/sass/main.scss", ".header { color: $undefined; }");

    let err = run_task(&cfg, &root, "build", Arc::new(RealFileSystem), std::future::pending())
        .await
        .unwrap_err();

    match &err {
        AssetflowError::Task(TaskError::Failed { task, source }) => {
            assert_eq!(task, "styles");
            assert!(matches!(**source, TaskError::Transform { collaborator: "sass", .. }));
        }
        other => panic!("expected task failure, got {other:?}"),
    }
    assert!(err.to_string().starts_with("task 'styles' failed:"));
    Ok(())
}

#[tokio::test]
async fn dev_session_survives_initial_failure() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (_, cfg, root) = project(dir.path());
    write_file(&root, "assets/sass/main.scss", ".header { color: $undefined; }");

    let shutdown = tokio::time::sleep(Duration::from_millis(300));
    with_timeout(run_task(&cfg, &root, "default", Arc::new(RealFileSystem), shutdown)).await?;
    Ok(())
}

#[tokio::test]
async fn series_dev_session_rebuilds_after_a_fix() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (_, cfg, root) = project(dir.path());
    write_file(&root, "assets/sass/main.scss", ".header { color: $undefined; }");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    // `styles` fails first, so the series never reaches `watch` by itself.
    let session = run_task(&cfg, &root, "dev", Arc::new(RealFileSystem), async move {
        let _ = stop_rx.await;
    });

    let fix = async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!root.join("dist/css/main.min.css").exists());
        write_file(&root, "assets/sass/main.scss", MAIN_SCSS);

        let out = root.join("dist/css/main.min.css");
        while !out.exists() {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        let _ = stop_tx.send(());
    };

    let (result, ()) = with_timeout(async { tokio::join!(session, fix) }).await;
    result?;

    let css = fs::read_to_string(root.join("dist/css/main.min.css"))?;
    assert!(css.contains("padding: 12px"), "got: {css}");
    Ok(())
}

#[tokio::test]
async fn saving_a_source_rebuilds_it() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (_, cfg, root) = project(dir.path());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let session = run_task(&cfg, &root, "default", Arc::new(RealFileSystem), async move {
        let _ = stop_rx.await;
    });

    let edit = async {
        // Initial build, then give the watcher time to start.
        tokio::time::sleep(Duration::from_millis(300)).await;
        fs::remove_file(root.join("dist/css/main.min.css")).unwrap();
        write_file(&root, "assets/sass/main.scss", ".footer { margin: 0; }\n");

        let out = root.join("dist/css/main.min.css");
        while !out.exists() {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        let _ = stop_tx.send(());
    };

    let (result, ()) = with_timeout(async { tokio::join!(session, edit) }).await;
    result?;

    let css = fs::read_to_string(root.join("dist/css/main.min.css"))?;
    assert!(css.contains(".footer"), "got: {css}");
    Ok(())
}

#[tokio::test]
async fn unknown_task_fails_before_running_anything() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (_, cfg, root) = project(dir.path());

    let err = run_task(&cfg, &root, "deploy", Arc::new(RealFileSystem), std::future::pending())
        .await
        .unwrap_err();
    assert!(matches!(err, AssetflowError::UnknownTask(name) if name == "deploy"));
    assert!(!root.join("dist").exists());
    Ok(())
}

#[tokio::test]
async fn dry_run_touches_nothing() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (config_path, _, root) = project(dir.path());

    run(CliArgs {
        task: Some("build".into()),
        config: config_path.to_string_lossy().into_owned(),
        log_level: None,
        dry_run: true,
    })
    .await?;

    assert!(!root.join("dist").exists());
    Ok(())
}

#[tokio::test]
async fn bind_failure_aborts_a_dev_session() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let taken = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = taken.local_addr()?.port();

    let cfg = assetflow::config::load_from_str(&format!(
        r#"
[server]
port = {port}

[task.serve]
kind = "serve"

[task.watch]
kind = "watch"

[task.dev]
kind = "parallel"
tasks = ["serve", "watch"]
"#
    ))?;

    let err = with_timeout(run_task(&cfg, dir.path(), "dev", Arc::new(RealFileSystem), std::future::pending()))
        .await
        .unwrap_err();
    assert!(matches!(err, AssetflowError::Task(ref e) if e.is_fatal()), "got: {err:?}");
    Ok(())
}
