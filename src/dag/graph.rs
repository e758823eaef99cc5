// src/dag/graph.rs

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::{ConfigFile, TaskConfig, WatchConfig};
use crate::errors::{AssetflowError, Result};

/// Who-uses-whom graph over task names.
///
/// Edge direction: parent -> child. For
///
/// ```toml
/// [task.build]
/// kind = "series"
/// tasks = ["styles"]
/// ```
///
/// there is an edge `build -> styles`. A `watch` task gets an edge to every
/// task bound in `[[watch]]`, since it needs those tasks to exist.
#[derive(Debug, Clone)]
pub struct TaskGraph<'a> {
    graph: DiGraphMap<&'a str, ()>,
}

impl<'a> TaskGraph<'a> {
    pub fn build(tasks: &'a BTreeMap<String, TaskConfig>, watch: &'a [WatchConfig]) -> Self {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in tasks.keys() {
            graph.add_node(name.as_str());
        }

        for (name, task) in tasks.iter() {
            for child in task.children() {
                graph.add_edge(name.as_str(), child.as_str(), ());
            }
            if matches!(task, TaskConfig::Watch) {
                for target in watch.iter().filter_map(|b| b.task.as_deref()) {
                    graph.add_edge(name.as_str(), target, ());
                }
            }
        }

        Self { graph }
    }

    pub fn from_config(cfg: &'a ConfigFile) -> Self {
        Self::build(cfg.tasks(), cfg.watch_bindings())
    }

    /// Task names ordered so that every task comes after everything it
    /// uses. Fails with [`AssetflowError::DagCycle`] if there is a cycle.
    pub fn registration_order(&self) -> Result<Vec<&'a str>> {
        match toposort(&self.graph, None) {
            Ok(mut order) => {
                order.reverse();
                Ok(order)
            }
            Err(cycle) => Err(AssetflowError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Tasks that directly use `name`.
    pub fn parents_of(&self, name: &'a str) -> Vec<&'a str> {
        self.graph
            .neighbors_directed(name, Direction::Incoming)
            .collect()
    }

    /// Tasks nothing else uses: the natural entry points.
    pub fn roots(&self) -> Vec<&'a str> {
        self.graph
            .nodes()
            .filter(|n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_from_str;

    #[test]
    fn children_register_before_parents() {
        let cfg = load_from_str(
            r#"
            [task.clean]
            kind = "clean"

            [task.styles]
            kind = "styles"
            src = ["assets/sass/*.scss"]
            dest = "assets/css"

            [task.build]
            kind = "series"
            tasks = ["clean", "styles"]

            [task.default]
            kind = "parallel"
            tasks = ["build"]
            "#,
        )
        .unwrap();

        let graph = TaskGraph::from_config(&cfg);
        let order = graph.registration_order().unwrap();
        let pos = |n: &str| order.iter().position(|x| *x == n).unwrap();

        assert!(pos("clean") < pos("build"));
        assert!(pos("styles") < pos("build"));
        assert!(pos("build") < pos("default"));
        assert_eq!(graph.roots(), vec!["default"]);
        assert_eq!(graph.parents_of("styles"), vec!["build"]);
    }
}
