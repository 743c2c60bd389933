//! Resource node declarations.
//!
//! A [`ResourceNode`] is the typed description of one provisionable unit:
//! a kind, a stable logical id, configuration attributes, and an optional
//! region override. Attributes that need another node's generated value are
//! tagged as [`AttrValue::Ref`] at declaration time; edges are derived from
//! those tags, never from a runtime object graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kinds of provisionable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// DNS hosted zone
    Zone,
    /// TLS certificate
    Certificate,
    /// Key-value table
    Table,
    /// Compute function
    Function,
    /// HTTP gateway
    Gateway,
    /// Storage bucket
    Bucket,
    /// CDN distribution
    Distribution,
    /// DNS alias record
    AliasRecord,
    /// Asset upload + cache invalidation step
    Deployment,
}

impl NodeKind {
    /// Stable string form, used for display and for provider state keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Zone => "zone",
            NodeKind::Certificate => "certificate",
            NodeKind::Table => "table",
            NodeKind::Function => "function",
            NodeKind::Gateway => "gateway",
            NodeKind::Bucket => "bucket",
            NodeKind::Distribution => "distribution",
            NodeKind::AliasRecord => "alias_record",
            NodeKind::Deployment => "deployment",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared attribute value: a literal, or a reference to another node's
/// output that is resolved at apply time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// A plain configuration value
    Literal(String),
    /// Another node's generated output, resolved once that node is Ready
    Ref {
        /// Logical id of the referenced node
        node: String,
        /// Output key to read from the referenced node
        output: String,
    },
}

impl AttrValue {
    /// Build a literal value.
    pub fn literal(value: impl Into<String>) -> Self {
        AttrValue::Literal(value.into())
    }

    /// Build a reference to `node`'s output `output`.
    pub fn reference(node: impl Into<String>, output: impl Into<String>) -> Self {
        AttrValue::Ref {
            node: node.into(),
            output: output.into(),
        }
    }

    /// The referenced `(node, output)` pair, if this is a reference.
    pub fn as_reference(&self) -> Option<(&str, &str)> {
        match self {
            AttrValue::Ref { node, output } => Some((node.as_str(), output.as_str())),
            AttrValue::Literal(_) => None,
        }
    }

    /// Whether this value is a reference.
    pub fn is_reference(&self) -> bool {
        matches!(self, AttrValue::Ref { .. })
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Literal(value) => f.write_str(value),
            AttrValue::Ref { node, output } => write!(f, "${{{node}.{output}}}"),
        }
    }
}

/// Lifecycle state of a node within one provisioning run.
///
/// Transitions are Pending -> Provisioning -> {Ready | Failed} for apply and
/// Ready -> Destroying -> Destroyed for teardown; no transition skips the
/// in-flight state. Failed is terminal for the run; a later apply starts the
/// node over from Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Declared, not yet touched by the provisioner
    Pending,
    /// Creation in flight
    Provisioning,
    /// Provisioned, outputs recorded
    Ready,
    /// Creation failed after retries
    Failed,
    /// Teardown in flight
    Destroying,
    /// Torn down (or confirmed already absent)
    Destroyed,
}

impl NodeState {
    /// Whether the node's outputs are available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeState::Pending => "pending",
            NodeState::Provisioning => "provisioning",
            NodeState::Ready => "ready",
            NodeState::Failed => "failed",
            NodeState::Destroying => "destroying",
            NodeState::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}

/// One declared provisionable resource.
#[derive(Debug, Clone)]
pub struct ResourceNode {
    /// Stable logical name, unique within a stack
    pub id: String,
    /// Resource kind
    pub kind: NodeKind,
    /// Declared configuration, literal or reference
    pub attributes: BTreeMap<String, AttrValue>,
    /// Explicit region constraint, when the resource must not follow the
    /// stack's primary region
    pub region: Option<String>,
    /// Lifecycle state, mutated only by the provisioner
    pub state: NodeState,
    /// Generated identifiers, populated on Ready
    pub outputs: BTreeMap<String, String>,
}

impl ResourceNode {
    /// Declare a node of the given kind and logical id.
    pub fn new(kind: NodeKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            attributes: BTreeMap::new(),
            region: None,
            state: NodeState::Pending,
            outputs: BTreeMap::new(),
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Pin the node to a region other than the stack's primary one.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Iterate the `(node, output)` pairs this node references.
    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.values().filter_map(AttrValue::as_reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_skip_literals() {
        let node = ResourceNode::new(NodeKind::Function, "CreateContact")
            .attr("handler", AttrValue::literal("create-contact"))
            .attr("table", AttrValue::reference("ContactsTable", "arn"))
            .attr("env.TABLE_NAME", AttrValue::reference("ContactsTable", "name"));

        let refs: Vec<_> = node.references().collect();
        assert_eq!(
            refs,
            vec![("ContactsTable", "name"), ("ContactsTable", "arn")]
        );
    }

    #[test]
    fn ref_display_is_symbolic() {
        let value = AttrValue::reference("Zone", "id");
        assert_eq!(value.to_string(), "${Zone.id}");
        assert_eq!(AttrValue::literal("pk").to_string(), "pk");
    }
}
