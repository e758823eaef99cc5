// tests/sequencer_props.rs

mod common;
use crate::common::Recorder;

use std::sync::Arc;

use assetflow::engine::{Task, TaskContext, parallel, series};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn series_runs_exactly_the_prefix_up_to_the_failure(n in 1usize..8, fail_at in 0usize..8) {
        let fail_at = fail_at % n;
        let rec = Recorder::new();
        let children: Vec<Arc<Task>> = (0..n)
            .map(|i| {
                let name = format!("t{i}");
                if i == fail_at {
                    Arc::new(Task::new(name.clone(), rec.failing(&name)))
                } else {
                    Arc::new(Task::new(name.clone(), rec.ok(&name)))
                }
            })
            .collect();

        let result = runtime().block_on(series("build", children).run(TaskContext::default()));
        let err = result.unwrap_err();
        let expected_task = format!("t{fail_at}");
        prop_assert_eq!(err.failing_task(), Some(expected_task.as_str()));

        let expected: Vec<String> = (0..=fail_at).map(|i| format!("t{i}")).collect();
        prop_assert_eq!(rec.events(), expected);
    }

    #[test]
    fn parallel_runs_every_child(n in 1usize..10) {
        let rec = Recorder::new();
        let children: Vec<Arc<Task>> = (0..n)
            .map(|i| {
                let name = format!("t{i}");
                Arc::new(Task::new(name.clone(), rec.ok(&name)))
            })
            .collect();

        runtime().block_on(parallel("assets", children).run(TaskContext::default())).unwrap();

        let mut events = rec.events();
        events.sort();
        let mut expected: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
        expected.sort();
        prop_assert_eq!(events, expected);
    }
}
