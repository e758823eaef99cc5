// src/engine/completion.rs

//! Task completion styles.
//!
//! A task body signals completion in one of four ways:
//!
//! - [`Completion::Sync`]: the work already happened; here is the result.
//! - [`Completion::Callback`]: the body handed a [`Done`] token to someone
//!   who will call [`Done::finish`] later.
//! - [`Completion::Stream`]: the body returned a stream of produced
//!   artifacts; the task is done when the stream ends.
//! - [`Completion::Async`]: plain asynchronous work.
//!
//! [`Completion::into_future`] turns every style into the same future so the
//! sequencer only ever awaits one shape.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};
use tokio::sync::oneshot;
use tracing::debug;

use crate::errors::TaskError;

/// A file written by a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub type TaskResult = Result<(), TaskError>;

pub enum Completion {
    Sync(TaskResult),
    Callback(oneshot::Receiver<TaskResult>),
    Stream(BoxStream<'static, Result<Artifact, TaskError>>),
    Async(BoxFuture<'static, TaskResult>),
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self {
            Completion::Sync(_) => "Sync",
            Completion::Callback(_) => "Callback",
            Completion::Stream(_) => "Stream",
            Completion::Async(_) => "Async",
        };
        f.debug_tuple("Completion").field(&style).finish()
    }
}

impl Completion {
    pub fn ok() -> Self {
        Completion::Sync(Ok(()))
    }

    pub fn from_result(result: TaskResult) -> Self {
        Completion::Sync(result)
    }

    /// Callback style: `start` receives the token and must eventually call
    /// [`Done::finish`] (directly or from spawned work).
    pub fn callback<F>(start: F) -> Self
    where
        F: FnOnce(Done),
    {
        let (tx, rx) = oneshot::channel();
        start(Done { tx });
        Completion::Callback(rx)
    }

    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Artifact, TaskError>> + Send + 'static,
    {
        Completion::Stream(stream.boxed())
    }

    pub fn future<F>(fut: F) -> Self
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        Completion::Async(fut.boxed())
    }

    /// Normalise into a single future resolving when the task is done.
    pub fn into_future(self) -> BoxFuture<'static, TaskResult> {
        match self {
            Completion::Sync(result) => futures::future::ready(result).boxed(),
            Completion::Callback(rx) => async move {
                match rx.await {
                    Ok(result) => result,
                    Err(_) => Err(TaskError::Abandoned),
                }
            }
            .boxed(),
            Completion::Stream(mut stream) => async move {
                let mut produced = 0usize;
                while let Some(item) = stream.next().await {
                    let artifact = item?;
                    produced += 1;
                    debug!(path = %artifact.path.display(), "artifact written");
                }
                debug!(produced, "stream drained");
                Ok(())
            }
            .boxed(),
            Completion::Async(fut) => fut,
        }
    }
}

/// Completion token for callback-style tasks.
///
/// Dropping it without calling [`Done::finish`] fails the task with
/// [`TaskError::Abandoned`].
#[derive(Debug)]
pub struct Done {
    tx: oneshot::Sender<TaskResult>,
}

impl Done {
    pub fn finish(self, result: TaskResult) {
        // The receiver only disappears if the run itself was dropped.
        let _ = self.tx.send(result);
    }

    pub fn ok(self) {
        self.finish(Ok(()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn callback_dropped_token_is_abandoned() {
        let completion = Completion::callback(|done| drop(done));
        let err = completion.into_future().await.unwrap_err();
        assert!(matches!(err, TaskError::Abandoned));
    }

    #[tokio::test]
    async fn callback_finished_from_spawned_work() {
        let completion = Completion::callback(|done| {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                done.ok();
            });
        });
        assert!(completion.into_future().await.is_ok());
    }

    #[tokio::test]
    async fn stream_fails_on_first_error_item() {
        let items = vec![
            Ok(Artifact::new("a.css")),
            Err(TaskError::Abandoned),
            Ok(Artifact::new("b.css")),
        ];
        let completion = Completion::stream(futures::stream::iter(items));
        assert!(completion.into_future().await.is_err());
    }

    #[tokio::test]
    async fn empty_stream_succeeds() {
        let completion = Completion::stream(futures::stream::empty::<Result<Artifact, TaskError>>());
        assert!(completion.into_future().await.is_ok());
    }
}
