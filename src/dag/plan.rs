// src/dag/plan.rs

//! Static expansion of a top-level task into its composition tree.
//!
//! Used for `--dry-run` output and to decide, before anything runs, whether
//! the run is a one-shot build or a long-lived development session.

use std::fmt::Write as _;

use crate::config::{ConfigFile, TaskConfig};
use crate::errors::{AssetflowError, Result};
use crate::types::Environment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    Series,
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanNode {
    Leaf {
        name: String,
        kind: &'static str,
        env: Environment,
        long_running: bool,
    },
    Group {
        name: String,
        composition: Composition,
        env: Environment,
        children: Vec<PlanNode>,
    },
}

impl PlanNode {
    pub fn name(&self) -> &str {
        match self {
            PlanNode::Leaf { name, .. } | PlanNode::Group { name, .. } => name,
        }
    }

    pub fn environment(&self) -> Environment {
        match self {
            PlanNode::Leaf { env, .. } | PlanNode::Group { env, .. } => *env,
        }
    }
}

/// The expanded tree below one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    root: PlanNode,
}

impl Plan {
    /// Expand `name` against a validated config.
    ///
    /// Fails with [`AssetflowError::UnknownTask`] if `name` is not defined.
    pub fn expand(cfg: &ConfigFile, name: &str) -> Result<Self> {
        let root = expand_node(cfg, name, Environment::default())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &PlanNode {
        &self.root
    }

    /// Leaf tasks in the order they are started: series children in order,
    /// parallel children in declaration order.
    pub fn leaves(&self) -> Vec<&PlanNode> {
        let mut out = Vec::new();
        collect_leaves(&self.root, &mut out);
        out
    }

    pub fn leaf_names(&self) -> Vec<&str> {
        self.leaves().into_iter().map(PlanNode::name).collect()
    }

    /// `watch` and `serve` leaves, in start order.
    pub fn long_running_leaves(&self) -> Vec<&PlanNode> {
        self.leaves()
            .into_iter()
            .filter(|leaf| matches!(leaf, PlanNode::Leaf { long_running: true, .. }))
            .collect()
    }

    /// True if a `watch` or `serve` leaf is reachable, which makes the run a
    /// development session that outlives task failures.
    pub fn is_long_running(&self) -> bool {
        !self.long_running_leaves().is_empty()
    }

    /// Indented tree for `--dry-run`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_node(&self.root, 0, &mut out);
        let _ = writeln!(out, "leaf order: {}", self.leaf_names().join(" -> "));
        out
    }
}

fn expand_node(cfg: &ConfigFile, name: &str, inherited: Environment) -> Result<PlanNode> {
    let task = cfg
        .task(name)
        .ok_or_else(|| AssetflowError::UnknownTask(name.to_string()))?;
    let env = task.environment().unwrap_or(inherited);

    let composition = match task {
        TaskConfig::Series { .. } => Composition::Series,
        TaskConfig::Parallel { .. } => Composition::Parallel,
        leaf => {
            return Ok(PlanNode::Leaf {
                name: name.to_string(),
                kind: leaf.kind_name(),
                env,
                long_running: leaf.is_long_running(),
            });
        }
    };

    let children = task
        .children()
        .iter()
        .map(|child| expand_node(cfg, child, env))
        .collect::<Result<Vec<_>>>()?;

    Ok(PlanNode::Group {
        name: name.to_string(),
        composition,
        env,
        children,
    })
}

fn collect_leaves<'a>(node: &'a PlanNode, out: &mut Vec<&'a PlanNode>) {
    match node {
        PlanNode::Leaf { .. } => out.push(node),
        PlanNode::Group { children, .. } => {
            for child in children {
                collect_leaves(child, out);
            }
        }
    }
}

fn render_node(node: &PlanNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        PlanNode::Leaf { name, kind, env, .. } => {
            let _ = writeln!(out, "{indent}{name} ({kind}, {env})");
        }
        PlanNode::Group {
            name,
            composition,
            env,
            children,
        } => {
            let label = match composition {
                Composition::Series => "series",
                Composition::Parallel => "parallel",
            };
            let _ = writeln!(out, "{indent}{name} [{label}, {env}]");
            for child in children {
                render_node(child, depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_from_str;

    const CONFIG: &str = r#"
        [task.clean]
        kind = "clean"

        [task.styles]
        kind = "styles"
        src = ["assets/sass/*.scss"]
        dest = "assets/css"

        [task.scripts]
        kind = "cmd"
        cmd = "true"

        [task.assets]
        kind = "parallel"
        tasks = ["styles", "scripts"]

        [task.build]
        kind = "series"
        tasks = ["clean", "assets"]
        env = "production"

        [task.watch]
        kind = "watch"

        [task.default]
        kind = "series"
        tasks = ["assets", "watch"]
    "#;

    #[test]
    fn environment_flows_down_the_tree() {
        let cfg = load_from_str(CONFIG).unwrap();
        let plan = Plan::expand(&cfg, "build").unwrap();

        assert_eq!(plan.leaf_names(), vec!["clean", "styles", "scripts"]);
        assert!(plan.leaves().iter().all(|l| l.environment() == Environment::Production));
        assert!(!plan.is_long_running());
    }

    #[test]
    fn watch_leaf_makes_the_plan_long_running() {
        let cfg = load_from_str(CONFIG).unwrap();
        let plan = Plan::expand(&cfg, "default").unwrap();

        assert!(plan.is_long_running());
        let long_running: Vec<&str> = plan.long_running_leaves().into_iter().map(PlanNode::name).collect();
        assert_eq!(long_running, vec!["watch"]);
        assert!(plan.leaves().iter().all(|l| l.environment() == Environment::Development));
    }

    #[test]
    fn unknown_task_is_rejected() {
        let cfg = load_from_str(CONFIG).unwrap();
        let err = Plan::expand(&cfg, "deploy").unwrap_err();
        assert!(matches!(err, AssetflowError::UnknownTask(name) if name == "deploy"));
    }

    #[test]
    fn render_lists_tree_and_leaf_order() {
        let cfg = load_from_str(CONFIG).unwrap();
        let rendered = Plan::expand(&cfg, "build").unwrap().render();

        assert!(rendered.starts_with("build [series, production]\n  clean (clean, production)\n"));
        assert!(rendered.contains("    styles (styles, production)\n"));
        assert!(rendered.ends_with("leaf order: clean -> styles -> scripts\n"));
    }
}
