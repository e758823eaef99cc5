// src/exec/copy.rs

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream;
use tracing::debug;

use crate::engine::{Artifact, Completion, TaskContext};
use crate::errors::TaskError;
use crate::exec::sources::collect_sources;
use crate::fs::FileSystem;

/// Resolved `copy` task settings.
#[derive(Debug, Clone)]
pub struct CopyJob {
    pub root: PathBuf,
    pub src: Vec<String>,
    pub dest: PathBuf,
}

/// Body of a `copy` task: each match lands at `dest/<path below glob base>`.
pub fn copy_task(job: CopyJob, fs: Arc<dyn FileSystem>) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
    let job = Arc::new(job);
    move |_ctx: TaskContext| {
        let sources = match collect_sources(fs.as_ref(), &job.root, &job.src) {
            Ok(sources) => sources,
            Err(err) => return Completion::from_result(Err(TaskError::Other(err))),
        };

        let out_dir = job.root.join(&job.dest);
        let fs = Arc::clone(&fs);
        let copied = sources.into_iter().map(move |source| -> Result<Artifact, TaskError> {
            let out = out_dir.join(&source.relative);
            fs.copy(&source.path, &out)
                .map_err(|err| TaskError::io(&source.path, err))?;
            debug!(src = %source.path.display(), out = %out.display(), "copied");
            Ok(Artifact::new(out))
        });

        Completion::stream(stream::iter(copied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[tokio::test]
    async fn keeps_layout_below_glob_base() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("./assets/img/logo.png", vec![1u8, 2, 3]);
        fs.add_file("./assets/img/icons/star.svg", "<svg/>");
        fs.add_file("./assets/img/notes.txt", "skip");

        let job = CopyJob {
            root: PathBuf::from("."),
            src: vec!["assets/img/**/*.{png,svg}".into()],
            dest: PathBuf::from("dist/img"),
        };
        copy_task(job, fs.clone())(TaskContext::default())
            .into_future()
            .await
            .unwrap();

        assert_eq!(fs.contents("./dist/img/logo.png"), Some(vec![1u8, 2, 3]));
        assert!(fs.contents("./dist/img/icons/star.svg").is_some());
        assert!(fs.contents("./dist/img/notes.txt").is_none());
    }
}
