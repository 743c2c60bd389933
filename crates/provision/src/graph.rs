//! Stack builder and dependency graph.
//!
//! [`StackBuilder`] collects node declarations and rejects duplicate ids.
//! [`StackBuilder::build`] scans every node's attributes for references and
//! records the induced edge set; edges are recomputed from references each
//! time a graph is built, never persisted.

use crate::error::{Error, Result};
use crate::node::ResourceNode;
use std::collections::HashMap;

/// Collects resource declarations before the graph is built.
#[derive(Debug, Default)]
pub struct StackBuilder {
    nodes: Vec<ResourceNode>,
}

impl StackBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node.
    ///
    /// Fails with [`Error::DuplicateId`] if the logical id was already
    /// declared, before any provisioning call is made.
    pub fn declare(&mut self, node: ResourceNode) -> Result<()> {
        if self.nodes.iter().any(|n| n.id == node.id) {
            return Err(Error::DuplicateId { id: node.id });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Number of declared nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been declared yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Derive the edge set and produce a [`Graph`].
    ///
    /// Fails with [`Error::UnknownReference`] if any attribute references a
    /// node that was never declared.
    pub fn build(self) -> Result<Graph> {
        let index: HashMap<String, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let mut deps: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];

        for (i, node) in self.nodes.iter().enumerate() {
            for (target, _output) in node.references() {
                let Some(&t) = index.get(target) else {
                    return Err(Error::UnknownReference {
                        node: node.id.clone(),
                        target: target.to_string(),
                    });
                };
                if !deps[i].contains(&t) {
                    deps[i].push(t);
                    dependents[t].push(i);
                }
            }
        }

        Ok(Graph {
            nodes: self.nodes,
            index,
            deps,
            dependents,
        })
    }
}

/// The dependency graph over a declared stack.
///
/// Nodes keep their declaration order; `deps` and `dependents` hold
/// deduplicated index lists derived from attribute references.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<ResourceNode>,
    index: HashMap<String, usize>,
    deps: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl Graph {
    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    /// The node at a plan index.
    pub fn node(&self, idx: usize) -> &ResourceNode {
        &self.nodes[idx]
    }

    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut ResourceNode {
        &mut self.nodes[idx]
    }

    /// Look up a node index by logical id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Look up a node by logical id.
    pub fn get(&self, id: &str) -> Option<&ResourceNode> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Indices of the nodes `idx` references.
    pub fn deps_of(&self, idx: usize) -> &[usize] {
        &self.deps[idx]
    }

    /// Indices of the nodes that reference `idx`.
    pub fn dependents_of(&self, idx: usize) -> &[usize] {
        &self.dependents[idx]
    }
}
