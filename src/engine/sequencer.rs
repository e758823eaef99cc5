// src/engine/sequencer.rs

//! `series` / `parallel` composition.
//!
//! Both return an ordinary [`Task`], so composites nest.
//!
//! - `series`: children run strictly one after another. The first failure
//!   ends the composite; later children are never invoked.
//! - `parallel`: every child is spawned onto the event loop at once. The
//!   composite completes when all children completed, or fails with the
//!   first failure observed. Siblings that are still running are left
//!   alone (their handles are detached, not aborted).

use std::sync::Arc;

use anyhow::anyhow;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, warn};

use crate::engine::TaskName;
use crate::engine::completion::Completion;
use crate::engine::task::Task;
use crate::errors::TaskError;

pub fn series(name: impl Into<TaskName>, children: Vec<Arc<Task>>) -> Task {
    let name = name.into();
    let label = name.clone();
    let children = Arc::new(children);

    Task::new(name, move |ctx| {
        let children = Arc::clone(&children);
        let label = label.clone();

        Completion::future(async move {
            for (idx, child) in children.iter().enumerate() {
                debug!(series = %label, step = idx + 1, of = children.len(), child = %child.name(), "series step");
                child.run(ctx.clone()).await?;
            }
            Ok(())
        })
    })
}

pub fn parallel(name: impl Into<TaskName>, children: Vec<Arc<Task>>) -> Task {
    let name = name.into();
    let label = name.clone();
    let children = Arc::new(children);

    Task::new(name, move |ctx| {
        let children = Arc::clone(&children);
        let label = label.clone();

        Completion::future(async move {
            let mut running: FuturesUnordered<_> = children
                .iter()
                .map(|child| {
                    // Spawned children count as started even before first poll.
                    ctx.mark_started(child.name());
                    let child = Arc::clone(child);
                    let ctx = ctx.clone();
                    tokio::spawn(async move { child.run(ctx).await })
                })
                .collect();

            debug!(parallel = %label, started = running.len(), "parallel children spawned");

            while let Some(joined) = running.next().await {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        if !running.is_empty() {
                            warn!(
                                parallel = %label,
                                still_running = running.len(),
                                "child failed; leaving running siblings to finish"
                            );
                        }
                        return Err(err);
                    }
                    Err(join_err) => {
                        return Err(TaskError::Other(anyhow!(
                            "child of '{label}' panicked or was aborted: {join_err}"
                        )));
                    }
                }
            }
            Ok(())
        })
    })
}
