use std::collections::BTreeMap;

use depwave_core::manifest::{SYNC_WAVE_ANNOTATION, parse_stream};
use depwave_core::{Diagnostic, Document, Error, schedule};
use proptest::prelude::*;
use serde_yaml::Value;

const MAX_NODES: usize = 12;

/// Row `i` lists, for every `j < i`, whether node `i` depends on node `j`.
/// Edges only point to lower indices, so every generated graph is acyclic.
fn arb_dag() -> impl Strategy<Value = Vec<Vec<bool>>> {
    (1..=MAX_NODES).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<bool>(), MAX_NODES), n)
    })
}

fn id(i: usize) -> String {
    format!("v1:ConfigMap:n{i}")
}

fn deps_of(adjacency: &[Vec<bool>], i: usize) -> Vec<usize> {
    (0..i).filter(|&j| adjacency[i][j]).collect()
}

fn render(adjacency: &[Vec<bool>], extra: &[(usize, usize)], reversed: bool) -> Vec<Document> {
    let mut order: Vec<usize> = (0..adjacency.len()).collect();
    if reversed {
        order.reverse();
    }

    let mut yaml = String::new();
    for i in order {
        let mut refs: Vec<String> = deps_of(adjacency, i)
            .into_iter()
            .map(|j| format!("ConfigMap:n{j}"))
            .collect();
        refs.extend(
            extra
                .iter()
                .filter(|(from, _)| *from == i)
                .map(|(_, to)| format!("ConfigMap:n{to}")),
        );

        yaml.push_str(&format!("---\nkind: ConfigMap\nmetadata:\n  name: n{i}\n"));
        if !refs.is_empty() {
            yaml.push_str(&format!(
                "  annotations:\n    argocd-dependency-cmp/depends-on: \"{}\"\n",
                refs.join(", ")
            ));
        }
    }
    parse_stream(&yaml, "generated").expect("generated yaml parses")
}

/// Longest-path levels computed directly from the adjacency rows.
fn expected_waves(adjacency: &[Vec<bool>]) -> BTreeMap<String, usize> {
    let mut levels: Vec<usize> = Vec::with_capacity(adjacency.len());
    for i in 0..adjacency.len() {
        let level = deps_of(adjacency, i)
            .into_iter()
            .map(|j| levels[j] + 1)
            .max()
            .unwrap_or(0);
        levels.push(level);
    }
    levels
        .into_iter()
        .enumerate()
        .map(|(i, level)| (id(i), level))
        .collect()
}

fn annotated_wave(doc: &Document) -> Option<usize> {
    doc.annotation(SYNC_WAVE_ANNOTATION)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn waves_are_longest_dependency_chains(adjacency in arb_dag(), reversed in any::<bool>()) {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let scheduled = schedule(render(&adjacency, &[], reversed), &mut sink)
            .expect("acyclic input schedules");

        prop_assert_eq!(&scheduled.waves, &expected_waves(&adjacency));
        prop_assert!(sink.iter().all(|d| !d.is_warning()));

        for i in 0..adjacency.len() {
            for j in deps_of(&adjacency, i) {
                prop_assert!(scheduled.waves[&id(i)] > scheduled.waves[&id(j)]);
            }
        }
    }

    #[test]
    fn every_document_carries_its_wave(adjacency in arb_dag()) {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let scheduled = schedule(render(&adjacency, &[], false), &mut sink)
            .expect("acyclic input schedules");

        prop_assert_eq!(scheduled.documents.len(), adjacency.len());
        for (i, doc) in scheduled.documents.iter().enumerate() {
            prop_assert_eq!(annotated_wave(doc), Some(scheduled.waves[&id(i)]));
        }

        let reported = sink
            .iter()
            .filter(|d| matches!(d, Diagnostic::WaveAssigned { .. }))
            .count();
        let nonzero = scheduled.waves.values().filter(|&&w| w > 0).count();
        prop_assert_eq!(reported, nonzero);
    }

    #[test]
    fn input_order_does_not_change_waves(adjacency in arb_dag()) {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let forward = schedule(render(&adjacency, &[], false), &mut sink).expect("schedules");
        let backward = schedule(render(&adjacency, &[], true), &mut sink).expect("schedules");
        prop_assert_eq!(forward.waves, backward.waves);
    }

    #[test]
    fn closing_a_path_is_always_a_cycle(adjacency in arb_dag(), pick in any::<prop::sample::Index>()) {
        prop_assume!(adjacency.len() >= 2);
        let mut adjacency = adjacency;
        let last = adjacency.len() - 1;
        let target = pick.index(last);
        adjacency[last][target] = true;

        let mut sink: Vec<Diagnostic> = Vec::new();
        let err = schedule(render(&adjacency, &[(target, last)], false), &mut sink)
            .expect_err("back edge closes a cycle");

        match err {
            Error::DependencyCycle { cycles } => {
                prop_assert!(!cycles.is_empty());
                prop_assert!(cycles.iter().any(|c| c.contains(&id(last)) && c.contains(&id(target))));
            }
            other => prop_assert!(false, "unexpected error: {}", other),
        }
        let any_wave = sink.iter().any(|d| matches!(d, Diagnostic::WaveAssigned { .. }));
        prop_assert!(!any_wave);
    }
}
