//! Provisioning executor.
//!
//! Walks a plan in order, resolves each node's references against the
//! output registry, converges the node through the provider (idempotent
//! lookup before create), and records generated outputs for dependents.
//! Transient provider failures are retried with bounded backoff; on
//! exhaustion the node fails, every remaining node is skipped, and
//! already-Ready nodes stay provisioned so a later run resumes from the
//! first non-Ready node. Teardown mirrors apply in reverse order.

use crate::context::{ApplyOptions, ProgressCallback};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::node::{NodeKind, NodeState};
use crate::planner::Plan;
use crate::provider::{DeleteOutcome, Outputs, Provider, ResourceSpec};
use crate::registry::OutputRegistry;
use crate::retry::{RetryConfig, with_retry};
use rayon::prelude::*;

/// Final outcome of one node within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The provider created the resource
    Created,
    /// An equivalent resource already existed; its outputs were reused
    Reused,
    /// The resource was torn down
    Destroyed,
    /// Teardown found nothing to remove
    AlreadyAbsent,
    /// The node was not attempted
    Skipped {
        /// Why the node was skipped
        reason: String,
    },
    /// The node failed after exhausting its retry budget
    Failed {
        /// Rendered error
        error: String,
    },
}

impl Outcome {
    /// Whether this outcome is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Counts of per-node outcomes for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Resources created by the provider
    pub created: usize,
    /// Resources found already converged
    pub reused: usize,
    /// Resources torn down
    pub destroyed: usize,
    /// Resources already absent at teardown
    pub absent: usize,
    /// Nodes not attempted (dry run or aborted plan)
    pub skipped: usize,
    /// Nodes that failed
    pub failed: usize,
}

impl RunSummary {
    /// Fold one outcome into the summary.
    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Reused => self.reused += 1,
            Outcome::Destroyed => self.destroyed += 1,
            Outcome::AlreadyAbsent => self.absent += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Total nodes accounted for.
    pub fn total(&self) -> usize {
        self.created + self.reused + self.destroyed + self.absent + self.skipped + self.failed
    }

    /// Whether the run completed without failures.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// The first failing node of a run.
#[derive(Debug)]
pub struct NodeFailure {
    /// Logical id
    pub node: String,
    /// Resource kind
    pub kind: NodeKind,
    /// The error that exhausted the node
    pub error: Error,
}

/// Result of an apply run.
#[derive(Debug)]
pub struct ApplyReport {
    /// Per-node outcome counts
    pub summary: RunSummary,
    /// Per-node outcomes in plan order
    pub outcomes: Vec<(String, Outcome)>,
    /// Outputs of every node that reached Ready
    pub registry: OutputRegistry,
    /// First failure, if the plan aborted
    pub failure: Option<NodeFailure>,
}

/// Result of a destroy run.
#[derive(Debug)]
pub struct DestroyReport {
    /// Per-node outcome counts
    pub summary: RunSummary,
    /// Per-node outcomes in teardown order
    pub outcomes: Vec<(String, Outcome)>,
    /// First failure, if the teardown aborted
    pub failure: Option<NodeFailure>,
}

/// Apply a plan against a provider.
///
/// Nodes are processed strictly in plan order when `opts.jobs == 1`;
/// with more jobs, nodes of equal dependency depth may run concurrently
/// (see [`crate::context::ApplyOptions`]). Either way a node is never
/// provisioned before everything it references is Ready.
pub fn apply(
    graph: &mut Graph,
    plan: &Plan,
    provider: &dyn Provider,
    opts: &ApplyOptions,
    progress: &mut dyn ProgressCallback,
) -> Result<ApplyReport> {
    let mut report = ApplyReport {
        summary: RunSummary::default(),
        outcomes: Vec::with_capacity(plan.len()),
        registry: OutputRegistry::new(),
        failure: None,
    };

    progress.on_run_start(plan.len(), false);

    if opts.dry_run {
        for &idx in plan.order() {
            let id = graph.node(idx).id.clone();
            let outcome = Outcome::Skipped {
                reason: format!("dry run: would ensure {} {}", graph.node(idx).kind, id),
            };
            finish_node(&mut report.summary, &mut report.outcomes, progress, &id, outcome);
        }
        progress.on_run_complete();
        return Ok(report);
    }

    if opts.jobs > 1 {
        apply_waves(graph, plan, provider, opts, progress, &mut report)?;
    } else {
        apply_sequential(graph, plan, provider, opts, progress, &mut report)?;
    }

    progress.on_run_complete();
    Ok(report)
}

fn apply_sequential(
    graph: &mut Graph,
    plan: &Plan,
    provider: &dyn Provider,
    opts: &ApplyOptions,
    progress: &mut dyn ProgressCallback,
    report: &mut ApplyReport,
) -> Result<()> {
    for &idx in plan.order() {
        let id = graph.node(idx).id.clone();
        if report.failure.is_some() {
            let outcome = Outcome::Skipped {
                reason: "aborted after earlier failure".into(),
            };
            finish_node(&mut report.summary, &mut report.outcomes, progress, &id, outcome);
            continue;
        }

        progress.on_node_start(&id, graph.node(idx).kind);
        graph.node_mut(idx).state = NodeState::Provisioning;

        let spec = resolve_spec(graph, idx, &report.registry)?;
        let result = ensure(provider, &spec, &opts.retry, |attempt, max, _err, delay| {
            progress.on_node_retry(&id, attempt, max, delay);
        });

        let outcome = commit_apply(graph, idx, result, report)?;
        finish_node(&mut report.summary, &mut report.outcomes, progress, &id, outcome);
    }
    Ok(())
}

fn apply_waves(
    graph: &mut Graph,
    plan: &Plan,
    provider: &dyn Provider,
    opts: &ApplyOptions,
    progress: &mut dyn ProgressCallback,
    report: &mut ApplyReport,
) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()
        .map_err(|e| Error::terminal(format!("failed to build worker pool: {e}")))?;

    for wave in wave_partition(graph, plan) {
        if report.failure.is_some() {
            for idx in wave {
                let id = graph.node(idx).id.clone();
                let outcome = Outcome::Skipped {
                    reason: "aborted after earlier failure".into(),
                };
                finish_node(&mut report.summary, &mut report.outcomes, progress, &id, outcome);
            }
            continue;
        }

        // Resolution happens before the wave runs; every dependency is
        // already Ready, so a miss is an ordering defect.
        let mut specs = Vec::with_capacity(wave.len());
        for &idx in &wave {
            let id = graph.node(idx).id.clone();
            progress.on_node_start(&id, graph.node(idx).kind);
            graph.node_mut(idx).state = NodeState::Provisioning;
            specs.push((idx, resolve_spec(graph, idx, &report.registry)?));
        }

        let results: Vec<(usize, Result<(bool, Outputs)>)> = pool.install(|| {
            specs
                .par_iter()
                .map(|(idx, spec)| {
                    (*idx, ensure(provider, spec, &opts.retry, |_, _, _, _| {}))
                })
                .collect()
        });

        // Registry writes and state transitions are committed here, on the
        // coordinating thread, in wave order.
        for (idx, result) in results {
            let id = graph.node(idx).id.clone();
            let outcome = commit_apply(graph, idx, result, report)?;
            finish_node(&mut report.summary, &mut report.outcomes, progress, &id, outcome);
        }
    }
    Ok(())
}

/// Converge one node: reuse an equivalent existing resource, else create.
fn ensure(
    provider: &dyn Provider,
    spec: &ResourceSpec,
    retry: &RetryConfig,
    mut on_retry: impl FnMut(u32, u32, &Error, std::time::Duration),
) -> Result<(bool, Outputs)> {
    if let Some(outputs) = with_retry(retry, || provider.lookup(spec), &mut on_retry)? {
        return Ok((true, outputs));
    }
    let outputs = with_retry(retry, || provider.create(spec), &mut on_retry)?;
    Ok((false, outputs))
}

fn resolve_spec(graph: &Graph, idx: usize, registry: &OutputRegistry) -> Result<ResourceSpec> {
    let node = graph.node(idx);
    Ok(ResourceSpec {
        id: node.id.clone(),
        kind: node.kind,
        region: node.region.clone(),
        attributes: registry.resolve(node)?,
    })
}

fn commit_apply(
    graph: &mut Graph,
    idx: usize,
    result: Result<(bool, Outputs)>,
    report: &mut ApplyReport,
) -> Result<Outcome> {
    match result {
        Ok((reused, outputs)) => {
            let id = graph.node(idx).id.clone();
            report.registry.record(&id, &outputs)?;
            let node = graph.node_mut(idx);
            node.outputs = outputs;
            node.state = NodeState::Ready;
            Ok(if reused { Outcome::Reused } else { Outcome::Created })
        }
        Err(error) => {
            let node = graph.node_mut(idx);
            node.state = NodeState::Failed;
            let rendered = error.to_string();
            if report.failure.is_none() {
                report.failure = Some(NodeFailure {
                    node: node.id.clone(),
                    kind: node.kind,
                    error,
                });
            }
            Ok(Outcome::Failed { error: rendered })
        }
    }
}

/// Tear down a plan in the given (reversed) order.
///
/// Each node is removed only after every node that references it is already
/// Destroyed; a violation fails fast with [`Error::DestroyOrdering`] instead
/// of orphaning a reference. "Already absent" counts as success.
pub fn destroy(
    graph: &mut Graph,
    teardown: &Plan,
    provider: &dyn Provider,
    opts: &ApplyOptions,
    progress: &mut dyn ProgressCallback,
) -> Result<DestroyReport> {
    let mut report = DestroyReport {
        summary: RunSummary::default(),
        outcomes: Vec::with_capacity(teardown.len()),
        failure: None,
    };

    progress.on_run_start(teardown.len(), true);

    for &idx in teardown.order() {
        let id = graph.node(idx).id.clone();

        if report.failure.is_some() {
            let outcome = Outcome::Skipped {
                reason: "aborted after earlier failure".into(),
            };
            finish_node(&mut report.summary, &mut report.outcomes, progress, &id, outcome);
            continue;
        }

        if opts.dry_run {
            let outcome = Outcome::Skipped {
                reason: format!("dry run: would remove {} {}", graph.node(idx).kind, id),
            };
            finish_node(&mut report.summary, &mut report.outcomes, progress, &id, outcome);
            continue;
        }

        for &dependent in graph.dependents_of(idx) {
            if graph.node(dependent).state != NodeState::Destroyed {
                return Err(Error::DestroyOrdering {
                    node: id,
                    dependent: graph.node(dependent).id.clone(),
                });
            }
        }

        progress.on_node_start(&id, graph.node(idx).kind);
        graph.node_mut(idx).state = NodeState::Destroying;

        let kind = graph.node(idx).kind;
        let region = graph.node(idx).region.clone();
        let result = with_retry(
            &opts.retry,
            || provider.delete(kind, &id, region.as_deref()),
            |attempt, max, _err, delay| progress.on_node_retry(&id, attempt, max, delay),
        );

        let outcome = match result {
            Ok(DeleteOutcome::Deleted) => {
                graph.node_mut(idx).state = NodeState::Destroyed;
                Outcome::Destroyed
            }
            Ok(DeleteOutcome::NotFound) => {
                graph.node_mut(idx).state = NodeState::Destroyed;
                Outcome::AlreadyAbsent
            }
            Err(error) => {
                graph.node_mut(idx).state = NodeState::Failed;
                let rendered = error.to_string();
                report.failure = Some(NodeFailure {
                    node: id.clone(),
                    kind,
                    error,
                });
                Outcome::Failed { error: rendered }
            }
        };
        finish_node(&mut report.summary, &mut report.outcomes, progress, &id, outcome);
    }

    progress.on_run_complete();
    Ok(report)
}

/// Group plan indices by dependency depth, preserving plan order inside
/// each wave. Nodes of one wave reference only earlier waves.
fn wave_partition(graph: &Graph, plan: &Plan) -> Vec<Vec<usize>> {
    let mut depth = vec![0usize; graph.node_count()];
    let mut waves: Vec<Vec<usize>> = Vec::new();
    for &idx in plan.order() {
        let d = graph
            .deps_of(idx)
            .iter()
            .map(|&dep| depth[dep] + 1)
            .max()
            .unwrap_or(0);
        depth[idx] = d;
        if waves.len() <= d {
            waves.resize_with(d + 1, Vec::new);
        }
        waves[d].push(idx);
    }
    waves
}

fn finish_node(
    summary: &mut RunSummary,
    outcomes: &mut Vec<(String, Outcome)>,
    progress: &mut dyn ProgressCallback,
    id: &str,
    outcome: Outcome,
) {
    progress.on_node_complete(id, &outcome);
    summary.add(&outcome);
    outcomes.push((id.to_string(), outcome));
}
