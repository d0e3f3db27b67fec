//! Index → graph → waves → annotate, over one discovered document list.

use std::collections::BTreeMap;

use tracing::instrument;

use crate::annotate::annotate;
use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::graph::{DependencyGraph, compute_waves};
use crate::manifest::Document;

/// Outcome of a successful scheduling pass.
#[derive(Debug)]
pub struct Schedule {
    /// Input documents, in input order, each carrying its sync-wave.
    pub documents: Vec<Document>,
    /// Resource id → wave.
    pub waves: BTreeMap<String, usize>,
}

impl Schedule {
    /// Highest wave assigned, `None` for an empty run.
    #[must_use]
    pub fn max_wave(&self) -> Option<usize> {
        self.waves.values().copied().max()
    }
}

/// Compute and write sync waves for `documents`.
///
/// Nothing is annotated unless every stage before annotation succeeds.
///
/// # Errors
///
/// Propagates graph construction errors (duplicates, ambiguous references,
/// bad annotations), cycle errors, and annotation errors.
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn schedule<S>(mut documents: Vec<Document>, sink: &mut S) -> Result<Schedule>
where
    S: DiagnosticSink + ?Sized,
{
    let graph = DependencyGraph::build(&documents, sink)?;
    let waves = compute_waves(&graph)?;

    for (doc, key) in documents.iter_mut().zip(graph.keys()) {
        let wave = waves.get(key.id()).copied().unwrap_or_default();
        annotate(doc, key, wave, sink)?;
    }

    Ok(Schedule { documents, waves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::error::Error;
    use crate::manifest::{SYNC_WAVE_ANNOTATION, parse_stream};
    use serde_yaml::Value;

    fn wave_of(doc: &Document) -> Option<&str> {
        doc.annotation(SYNC_WAVE_ANNOTATION).and_then(Value::as_str)
    }

    #[test]
    fn annotates_in_input_order() {
        let documents = parse_stream(
            concat!(
                "kind: Deployment\nmetadata:\n  name: app\n  annotations:\n",
                "    argocd-dependency-cmp/depends-on: Service:db\n---\n",
                "kind: Service\nmetadata:\n  name: db\n",
            ),
            "test",
        )
        .expect("valid yaml");
        let mut sink: Vec<Diagnostic> = Vec::new();

        let scheduled = schedule(documents, &mut sink).expect("schedule");

        assert_eq!(wave_of(&scheduled.documents[0]), Some("1"));
        assert_eq!(wave_of(&scheduled.documents[1]), Some("0"));
        assert_eq!(scheduled.max_wave(), Some(1));
        assert_eq!(
            sink,
            vec![Diagnostic::WaveAssigned {
                id: "v1:Deployment:app".to_string(),
                wave: 1,
            }]
        );
    }

    #[test]
    fn unresolved_dependency_still_schedules_everything() {
        let documents = parse_stream(
            concat!(
                "kind: Deployment\nmetadata:\n  name: app\n  annotations:\n",
                "    argocd-dependency-cmp/depends-on: Service:ghost\n---\n",
                "kind: Service\nmetadata:\n  name: db\n",
            ),
            "test",
        )
        .expect("valid yaml");
        let mut sink: Vec<Diagnostic> = Vec::new();

        let scheduled = schedule(documents, &mut sink).expect("schedule");

        assert!(scheduled.documents.iter().all(|d| wave_of(d) == Some("0")));
        assert_eq!(sink.len(), 1);
        assert!(sink[0].is_warning());
    }

    #[test]
    fn cycle_aborts_before_any_annotation() {
        let documents = parse_stream(
            concat!(
                "kind: A\nmetadata:\n  name: a\n  annotations:\n",
                "    argocd-dependency-cmp/depends-on: B:b\n---\n",
                "kind: B\nmetadata:\n  name: b\n  annotations:\n",
                "    argocd-dependency-cmp/depends-on: A:a\n",
            ),
            "test",
        )
        .expect("valid yaml");
        let mut sink: Vec<Diagnostic> = Vec::new();

        let err = schedule(documents, &mut sink).expect_err("cycle");
        assert!(matches!(err, Error::DependencyCycle { .. }));
        assert!(sink.is_empty());
    }

    #[test]
    fn empty_input_is_an_empty_schedule() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let scheduled = schedule(Vec::new(), &mut sink).expect("schedule");
        assert!(scheduled.documents.is_empty());
        assert_eq!(scheduled.max_wave(), None);
    }
}
