//! Dependency graph construction from discovered manifests.
//!
//! # Edge Direction
//!
//! An edge `A → B` means "A **depends on** B": B must land in a strictly
//! earlier wave than A. Edges come from the comma-separated
//! `argocd-dependency-cmp/depends-on` annotation on A.
//!
//! ## Resolution
//!
//! Each reference is matched against every indexed [`ResourceKey`]:
//!
//! - one match adds an edge,
//! - no match is reported to the [`DiagnosticSink`] and skipped,
//! - several matches abort with [`Error::AmbiguousDependency`].

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_yaml::Value;
use tracing::instrument;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Error, Result};
use crate::manifest::{DEPENDS_ON_ANNOTATION, Document, ResourceKey};

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// Directed dependency graph over one run's resources.
///
/// Every indexed resource is a node, whether or not it has edges.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Nodes are resource ids; `A → B` means A depends on B.
    pub graph: DiGraph<String, ()>,
    /// Resource id → petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    /// Keys in document order, one per input document.
    keys: Vec<ResourceKey>,
}

impl DependencyGraph {
    /// Index `documents` and resolve their dependency annotations.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateResource`] if two documents share an id.
    /// - [`Error::InvalidAnnotation`] if a depends-on value is not a string.
    /// - [`Error::AmbiguousDependency`] if a reference matches several
    ///   resources.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn build<S>(documents: &[Document], sink: &mut S) -> Result<Self>
    where
        S: DiagnosticSink + ?Sized,
    {
        let keys: Vec<ResourceKey> = documents.iter().map(ResourceKey::from_document).collect();

        let mut graph = DiGraph::<String, ()>::with_capacity(keys.len(), 0);
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(keys.len());

        for key in &keys {
            if node_map.contains_key(key.id()) {
                return Err(Error::DuplicateResource {
                    id: key.id().to_string(),
                });
            }
            let idx = graph.add_node(key.id().to_string());
            node_map.insert(key.id().to_string(), idx);
        }

        for (doc, key) in documents.iter().zip(&keys) {
            let from = node_map[key.id()];
            for reference in dependency_references(doc, key)? {
                let matches: Vec<&ResourceKey> =
                    keys.iter().filter(|candidate| candidate.matches(&reference)).collect();

                match matches.as_slice() {
                    [] => sink.report(Diagnostic::UnresolvedDependency {
                        from: key.id().to_string(),
                        reference,
                    }),
                    [target] => {
                        let to = node_map[target.id()];
                        // Avoid duplicate edges (petgraph allows them by default).
                        if !graph.contains_edge(from, to) {
                            graph.add_edge(from, to, ());
                        }
                    }
                    several => {
                        return Err(Error::AmbiguousDependency {
                            from: key.id().to_string(),
                            reference,
                            matches: several.iter().map(|k| k.id().to_string()).collect(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            graph,
            node_map,
            keys,
        })
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Keys in the same order as the documents the graph was built from.
    #[must_use]
    pub fn keys(&self) -> &[ResourceKey] {
        &self.keys
    }

    /// Sorted ids that `id` depends on. Empty for unknown ids.
    #[must_use]
    pub fn dependencies(&self, id: &str) -> Vec<&str> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    /// Sorted ids that depend on `id`. Empty for unknown ids.
    #[must_use]
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    fn neighbor_ids(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(idx) = self.node_index(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Split the depends-on annotation into trimmed, non-empty references.
fn dependency_references(doc: &Document, key: &ResourceKey) -> Result<Vec<String>> {
    match doc.annotation(DEPENDS_ON_ANNOTATION) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(raw)) => Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()),
        Some(_) => Err(Error::InvalidAnnotation {
            id: key.id().to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
