//! Provider abstraction for the external resource API.
//!
//! The [`Provider`] trait is the seam between the engine and whatever
//! actually materializes resources, allowing for a local state-file
//! implementation, mocks for testing, and real cloud backends.

use crate::error::Result;
use crate::node::NodeKind;
use std::collections::BTreeMap;

/// Generated identifiers and values of one provisioned resource.
pub type Outputs = BTreeMap<String, String>;

/// A node with every attribute reference resolved to a literal, ready to be
/// handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Logical id of the node
    pub id: String,
    /// Resource kind
    pub kind: NodeKind,
    /// Region override, when the resource must not follow the provider default
    pub region: Option<String>,
    /// Fully resolved configuration values
    pub attributes: BTreeMap<String, String>,
}

/// Result of a delete operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The resource existed and was removed
    Deleted,
    /// Nothing to do; treated as success for idempotent teardown
    NotFound,
}

/// External resource API.
///
/// Implementations must be safe to call from multiple provisioning worker
/// threads. Failures are reported as [`crate::Error::Transient`] (retried
/// with backoff) or [`crate::Error::Terminal`] (aborts the plan).
pub trait Provider: Send + Sync {
    /// Look up an existing resource equivalent to `spec`.
    ///
    /// Returns the recorded outputs only when the resource exists with
    /// matching attributes, so re-apply can converge without side effects.
    fn lookup(&self, spec: &ResourceSpec) -> Result<Option<Outputs>>;

    /// Create the resource described by `spec` and return its outputs.
    fn create(&self, spec: &ResourceSpec) -> Result<Outputs>;

    /// Tear down a resource, tolerating "already absent".
    fn delete(&self, kind: NodeKind, id: &str, region: Option<&str>) -> Result<DeleteOutcome>;
}
