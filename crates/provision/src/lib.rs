//! # Provision
//!
//! A framework for declarative resource-graph provisioning.
//!
//! Declare typed resource nodes whose attributes may reference other nodes'
//! generated outputs, derive the dependency graph from those references,
//! order it topologically, and converge every node through a pluggable
//! provider: reuse what already exists, create what doesn't, retry what
//! fails transiently, and tear everything down in exact reverse order.
//!
//! ## Core Concepts
//!
//! - **ResourceNode**: one provisionable unit (kind, id, attributes, region)
//! - **StackBuilder / Graph**: declarations plus the reference-derived edges
//! - **Plan**: a topologically valid creation order (reversed for teardown)
//! - **Provider**: the external resource API behind a trait seam
//! - **OutputRegistry**: write-once store of generated identifiers
//!
//! ## Example
//!
//! ```ignore
//! use provision::{
//!     apply, plan, ApplyOptions, AttrValue, NodeKind, NoProgress,
//!     ResourceNode, StackBuilder,
//! };
//!
//! let mut stack = StackBuilder::new();
//! stack.declare(ResourceNode::new(NodeKind::Table, "ContactsTable")
//!     .attr("partition_key", AttrValue::literal("pk")))?;
//! stack.declare(ResourceNode::new(NodeKind::Function, "CreateContact")
//!     .attr("env.TABLE_NAME", AttrValue::reference("ContactsTable", "name")))?;
//!
//! let mut graph = stack.build()?;
//! let order = plan(&graph)?;
//! let report = apply(&mut graph, &order, &provider, &ApplyOptions::default(), &mut NoProgress)?;
//! println!("{}", report.registry.get("ContactsTable", "name")?);
//! ```
//!
//! The engine never talks to a terminal or a logger; progress is surfaced
//! through [`ProgressCallback`] and retries through the observer passed to
//! [`retry::with_retry`], so callers decide how runs are rendered.

pub mod context;
pub mod error;
pub mod graph;
pub mod node;
pub mod planner;
pub mod provider;
pub mod provisioner;
pub mod registry;
pub mod retry;

// Re-export main types at crate root
pub use context::{ApplyOptions, NoProgress, ProgressCallback};
pub use error::{Error, ErrorCategory, Result};
pub use graph::{Graph, StackBuilder};
pub use node::{AttrValue, NodeKind, NodeState, ResourceNode};
pub use planner::{Plan, plan};
pub use provider::{DeleteOutcome, Outputs, Provider, ResourceSpec};
pub use provisioner::{
    ApplyReport, DestroyReport, NodeFailure, Outcome, RunSummary, apply, destroy,
};
pub use registry::OutputRegistry;
pub use retry::{RetryConfig, with_retry, with_retry_simple};
