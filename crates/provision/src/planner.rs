//! Topological planner.
//!
//! Orders nodes so that every node appears after everything it references,
//! using a depth-first traversal with three-color marking. A back-edge to an
//! in-progress node is a cycle and fails the whole plan; nothing partial is
//! ever returned. Roots and edges are visited in declaration order, so plans
//! are reproducible across runs.

use crate::error::{Error, Result};
use crate::graph::Graph;

/// A topologically valid creation order over all nodes of a graph.
#[derive(Debug, Clone)]
pub struct Plan {
    order: Vec<usize>,
}

impl Plan {
    /// Node indices in creation order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Number of planned nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node ids in creation order.
    pub fn ids<'g>(&self, graph: &'g Graph) -> Vec<&'g str> {
        self.order.iter().map(|&i| graph.node(i).id.as_str()).collect()
    }

    /// The same total order reversed, used for teardown.
    pub fn reversed(&self) -> Plan {
        let mut order = self.order.clone();
        order.reverse();
        Plan { order }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Compute a creation order for `graph`.
///
/// Fails with [`Error::Cycle`] naming the offending node chain if the
/// reference graph is not acyclic.
pub fn plan(graph: &Graph) -> Result<Plan> {
    let n = graph.node_count();
    let mut marks = vec![Mark::Unvisited; n];
    let mut order = Vec::with_capacity(n);
    let mut trail = Vec::new();

    for root in 0..n {
        visit(graph, root, &mut marks, &mut order, &mut trail)?;
    }

    Ok(Plan { order })
}

fn visit(
    graph: &Graph,
    idx: usize,
    marks: &mut [Mark],
    order: &mut Vec<usize>,
    trail: &mut Vec<usize>,
) -> Result<()> {
    match marks[idx] {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            // Back-edge: the chain from the first occurrence on the trail
            // back to this node is the cycle.
            let start = trail.iter().position(|&i| i == idx).unwrap_or(0);
            let mut chain: Vec<String> = trail[start..]
                .iter()
                .map(|&i| graph.node(i).id.clone())
                .collect();
            chain.push(graph.node(idx).id.clone());
            return Err(Error::Cycle { chain });
        }
        Mark::Unvisited => {}
    }

    marks[idx] = Mark::InProgress;
    trail.push(idx);
    for &dep in graph.deps_of(idx) {
        visit(graph, dep, marks, order, trail)?;
    }
    trail.pop();
    marks[idx] = Mark::Done;
    order.push(idx);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StackBuilder;
    use crate::node::{AttrValue, NodeKind, ResourceNode};

    fn chain_graph() -> Graph {
        // z <- t is independent; f -> t, g -> f, a -> {g, z}
        let mut stack = StackBuilder::new();
        stack
            .declare(ResourceNode::new(NodeKind::Zone, "z"))
            .unwrap();
        stack
            .declare(ResourceNode::new(NodeKind::Table, "t"))
            .unwrap();
        stack
            .declare(
                ResourceNode::new(NodeKind::Function, "f")
                    .attr("table", AttrValue::reference("t", "name")),
            )
            .unwrap();
        stack
            .declare(
                ResourceNode::new(NodeKind::Gateway, "g")
                    .attr("function", AttrValue::reference("f", "arn")),
            )
            .unwrap();
        stack
            .declare(
                ResourceNode::new(NodeKind::AliasRecord, "a")
                    .attr("target", AttrValue::reference("g", "domain"))
                    .attr("zone", AttrValue::reference("z", "id")),
            )
            .unwrap();
        stack.build().unwrap()
    }

    #[test]
    fn every_node_follows_its_references() {
        let graph = chain_graph();
        let plan = plan(&graph).unwrap();
        let position = |id: &str| {
            let idx = graph.index_of(id).unwrap();
            plan.order().iter().position(|&i| i == idx).unwrap()
        };

        for (node, dep) in [("f", "t"), ("g", "f"), ("a", "g"), ("a", "z")] {
            assert!(position(node) > position(dep), "{node} must follow {dep}");
        }
        assert_eq!(plan.len(), graph.node_count());
    }

    #[test]
    fn plan_is_deterministic_and_declaration_ordered() {
        let graph = chain_graph();
        let ids = plan(&graph).unwrap().ids(&graph);
        assert_eq!(ids, vec!["z", "t", "f", "g", "a"]);
    }

    #[test]
    fn reversed_plan_is_exactly_backwards() {
        let graph = chain_graph();
        let forward = plan(&graph).unwrap();
        let mut expected: Vec<usize> = forward.order().to_vec();
        expected.reverse();
        assert_eq!(forward.reversed().order(), expected.as_slice());
    }

    #[test]
    fn cycle_fails_with_the_offending_chain() {
        let mut stack = StackBuilder::new();
        stack
            .declare(
                ResourceNode::new(NodeKind::Function, "a")
                    .attr("peer", AttrValue::reference("b", "arn")),
            )
            .unwrap();
        stack
            .declare(
                ResourceNode::new(NodeKind::Function, "b")
                    .attr("peer", AttrValue::reference("a", "arn")),
            )
            .unwrap();
        let graph = stack.build().unwrap();

        let err = plan(&graph).unwrap_err();
        match err {
            Error::Cycle { chain } => {
                assert_eq!(chain.first(), chain.last());
                assert!(chain.len() >= 3);
            }
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut stack = StackBuilder::new();
        stack
            .declare(
                ResourceNode::new(NodeKind::Function, "a")
                    .attr("own", AttrValue::reference("a", "arn")),
            )
            .unwrap();
        let graph = stack.build().unwrap();
        assert!(matches!(plan(&graph), Err(Error::Cycle { .. })));
    }
}
