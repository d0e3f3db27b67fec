//! Naming the cycles that block wave assignment.
//!
//! # Edge Direction
//!
//! Same as [`super::build`]: `A → B` means A depends on B. A cycle is
//! reported as a path `[s, …, t]` where `s` is the smallest id of its
//! strongly connected component and `t → s` closes the loop.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// Find every cycle currently present in `graph`.
///
/// Returns one path per cyclic strongly connected component, sorted.
/// Self-loops are reported as a one-element path.
#[must_use]
pub fn find_all_cycles(graph: &DiGraph<String, ()>) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || component.first().is_some_and(|node| has_self_loop(graph, *node))
        })
        .filter_map(|component| {
            let start = component
                .iter()
                .copied()
                .min_by(|a, b| graph[*a].cmp(&graph[*b]))?;
            let members: HashSet<NodeIndex> = component.into_iter().collect();
            Some(cycle_path(graph, start, &members))
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

#[must_use]
fn has_self_loop(graph: &DiGraph<String, ()>, node: NodeIndex) -> bool {
    graph.find_edge(node, node).is_some()
}

/// BFS inside one component from `start` until an edge leads back to it.
fn cycle_path(
    graph: &DiGraph<String, ()>,
    start: NodeIndex,
    members: &HashSet<NodeIndex>,
) -> Vec<String> {
    let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);
    let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        let mut next_nodes: Vec<NodeIndex> = graph.neighbors(current).collect();
        next_nodes.sort_unstable_by(|a, b| graph[*a].cmp(&graph[*b]));

        for next in next_nodes {
            if next == start {
                return reconstruct_path(graph, start, current, &parent);
            }
            if members.contains(&next) && visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    // Unreachable for a genuine SCC; fall back to the sorted member list.
    let mut ids: Vec<String> = members.iter().map(|idx| graph[*idx].clone()).collect();
    ids.sort_unstable();
    ids
}

fn reconstruct_path(
    graph: &DiGraph<String, ()>,
    start: NodeIndex,
    end: NodeIndex,
    parent: &HashMap<NodeIndex, NodeIndex>,
) -> Vec<String> {
    // Parent links run end → … → start.
    let mut chain: Vec<NodeIndex> = vec![end];
    let mut cursor = end;
    while cursor != start {
        match parent.get(&cursor) {
            Some(prev) => {
                cursor = *prev;
                chain.push(cursor);
            }
            None => break,
        }
    }
    chain.reverse();
    chain.into_iter().map(|idx| graph[idx].clone()).collect()
}
