//! Sync-wave leveling.
//!
//! Kahn-style: a resource whose dependencies are all resolved joins the next
//! ready set. Wave 0 is every resource without dependencies; wave `n + 1` is
//! every resource whose last dependency resolved in wave `n`. The result is
//! the minimal wave per resource: `1 + max(wave of its dependencies)`, or 0.
//!
//! Ready sets are processed in sorted-id order so logs and cycle reports are
//! reproducible.

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use super::build::DependencyGraph;
use super::cycles::find_all_cycles;
use crate::error::{Error, Result};

/// Assign a wave to every node of `graph`.
///
/// # Errors
///
/// Returns [`Error::DependencyCycle`] naming every cycle when some
/// resources can never become ready.
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn compute_waves(graph: &DependencyGraph) -> Result<BTreeMap<String, usize>> {
    let g = &graph.graph;

    // Unresolved outgoing dependency edges per node, indexed by NodeIndex.
    let mut pending: Vec<usize> = g
        .node_indices()
        .map(|idx| g.neighbors_directed(idx, Direction::Outgoing).count())
        .collect();

    let mut ready: Vec<NodeIndex> = g
        .node_indices()
        .filter(|idx| pending[idx.index()] == 0)
        .collect();
    sort_by_id(graph, &mut ready);

    let mut waves: BTreeMap<String, usize> = BTreeMap::new();
    let mut current_wave = 0usize;

    while !ready.is_empty() {
        debug!(wave = current_wave, size = ready.len(), "wave resolved");
        let mut next: Vec<NodeIndex> = Vec::new();

        for &node in &ready {
            waves.insert(g[node].clone(), current_wave);
            for dependent in g.neighbors_directed(node, Direction::Incoming) {
                let count = &mut pending[dependent.index()];
                *count -= 1;
                if *count == 0 {
                    next.push(dependent);
                }
            }
        }

        sort_by_id(graph, &mut next);
        ready = next;
        current_wave += 1;
    }

    if waves.len() < g.node_count() {
        return Err(Error::DependencyCycle {
            cycles: find_all_cycles(g),
        });
    }

    Ok(waves)
}

fn sort_by_id(graph: &DependencyGraph, nodes: &mut [NodeIndex]) {
    nodes.sort_unstable_by(|a, b| graph.graph[*a].cmp(&graph.graph[*b]));
}
