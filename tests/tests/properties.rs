//! Property tests over random mutation scripts.

use proptest::prelude::*;
use retrace_journal::{EditRecorder, ObjectRegistry};
use retrace_tests::prelude::*;
use retrace_tests::script::{arb_script, arb_structural_script};
use retrace_transaction::{EditTransaction, NormalizingEdit};

fn schema_graph() -> (MemoryGraph, Schema) {
    let mut graph = MemoryGraph::new();
    let schema = Schema::install(&mut graph).expect("schema installs on an empty graph");
    (graph, schema)
}

fn record(graph: &mut MemoryGraph, schema: &Schema, script: &[Mutation]) -> EditLog {
    let mut tx = EditTransaction::recording(graph);
    for mutation in script {
        mutation.apply(&mut tx, schema).unwrap();
    }
    tx.commit().unwrap().into_log()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn prop_execute_reproduces_and_undo_restores(script in arb_script(48)) {
        let (mut graph, schema) = schema_graph();
        let prior = graph.clone();
        let before = GraphSnapshot::capture(&graph);

        let log = record(&mut graph, &schema, &script);
        let after = GraphSnapshot::capture(&graph);

        // Replay on an untouched copy
        let mut replica = prior.clone();
        log.execute(&mut replica).unwrap();
        prop_assert_eq!(GraphSnapshot::capture(&replica), after.clone());

        // Undo on the graph that recorded it, then redo
        log.undo(&mut graph).unwrap();
        prop_assert_eq!(GraphSnapshot::capture(&graph), before.clone());
        log.execute(&mut graph).unwrap();
        prop_assert_eq!(GraphSnapshot::capture(&graph), after);
    }

    #[test]
    fn prop_serialization_preserves_behavior(script in arb_script(48)) {
        let (mut graph, schema) = schema_graph();
        let prior = graph.clone();
        let log = record(&mut graph, &schema, &script);
        let after = GraphSnapshot::capture(&graph);

        let bytes = log.to_bytes().unwrap();
        let reloaded = EditLog::from_bytes_with(&bytes, &ObjectRegistry::new()).unwrap();

        prop_assert_eq!(reloaded.words(), log.words());
        prop_assert_eq!(reloaded.final_registers(), log.final_registers());
        prop_assert_eq!(reloaded.to_bytes().unwrap(), bytes);

        let mut replica = prior.clone();
        reloaded.execute(&mut replica).unwrap();
        prop_assert_eq!(GraphSnapshot::capture(&replica), after);
        reloaded.undo(&mut replica).unwrap();
        prop_assert_eq!(GraphSnapshot::capture(&replica), GraphSnapshot::capture(&prior));
    }

    #[test]
    fn prop_normalized_log_replays_like_the_raw_log(script in arb_structural_script(48)) {
        let (mut raw_graph, schema) = schema_graph();
        let prior = raw_graph.clone();
        let mut normalized_graph = prior.clone();

        let raw = record(&mut raw_graph, &schema, &script);

        let mut tx = EditTransaction::new(
            &mut normalized_graph,
            NormalizingEdit::new(EditRecorder::new()),
        );
        for mutation in &script {
            mutation.apply(&mut tx, &schema).unwrap();
        }
        let normalized = tx.commit().unwrap().into_inner().into_log();

        let after = GraphSnapshot::capture(&raw_graph);
        prop_assert_eq!(GraphSnapshot::capture(&normalized_graph), after.clone());
        prop_assert!(
            normalized.stats().unwrap().applications <= raw.stats().unwrap().applications
        );

        let mut replica = prior.clone();
        normalized.execute(&mut replica).unwrap();
        prop_assert_eq!(GraphSnapshot::capture(&replica), after);
        normalized.undo(&mut replica).unwrap();
        prop_assert_eq!(GraphSnapshot::capture(&replica), GraphSnapshot::capture(&prior));
    }
}

#[test]
fn test_structural_strategy_only_yields_structural_mutations() {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    let mut runner = TestRunner::deterministic();
    for _ in 0..64 {
        let script = arb_structural_script(16)
            .new_tree(&mut runner)
            .unwrap()
            .current();
        assert!(script.iter().all(Mutation::is_structural));
    }
}
