// src/dag/mod.rs

//! Task composition graph.
//!
//! - [`graph`] holds the parent -> child graph over task names and gives the
//!   order in which tasks can be registered.
//! - [`plan`] expands one task into its series/parallel tree.

pub mod graph;
pub mod plan;

pub use graph::TaskGraph;
pub use plan::{Composition, Plan, PlanNode};
