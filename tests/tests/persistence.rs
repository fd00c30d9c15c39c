//! Persisted edit logs: byte layout stability and reload behavior.

use pretty_assertions::assert_eq;
use retrace_core::{GraphRead, GraphWrite, VertexId};
use retrace_journal::{EditError, EditRecorder, ObjectRegistry};
use retrace_tests::prelude::*;
use retrace_transaction::EditTransaction;
use std::sync::Arc;

fn populated() -> (MemoryGraph, Schema) {
    let mut graph = MemoryGraph::new();
    let schema = Schema::install(&mut graph).unwrap();
    for _ in 0..3 {
        graph.add_vertex().unwrap();
    }
    (graph, schema)
}

fn record_mixed(graph: &mut MemoryGraph, schema: &Schema) -> EditLog {
    let mut tx = EditTransaction::recording(graph);
    let a = VertexId(0);
    let b = VertexId(1);
    let t = tx.add_transaction(a, b, false).unwrap();
    tx.set_int(schema.count, a.into(), 300_000).unwrap();
    tx.set_double(schema.weight, b.into(), f64::NAN).unwrap();
    tx.set_boolean(schema.flag, a.into(), true).unwrap();
    tx.set_char(schema.initial, b.into(), 'ß').unwrap();
    tx.set_object(schema.name, a.into(), Value::from("ada")).unwrap();
    tx.set_object(schema.kind, t.into(), Value::from("peer")).unwrap();
    tx.set_primary_key(ElementType::Vertex, &[schema.name]).unwrap();
    tx.set_attribute_index_type(schema.name, IndexType::Ordered).unwrap();
    tx.remove_vertex(VertexId(2)).unwrap();
    tx.commit().unwrap().into_log()
}

// ========== TEST: Byte Round Trip ==========

#[test]
fn test_reloaded_log_behaves_like_the_original() {
    // GIVEN a log recorded over a populated graph
    let (mut graph, schema) = populated();
    let prior = graph.clone();
    let log = record_mixed(&mut graph, &schema);
    let expected = GraphSnapshot::capture(&graph);

    // WHEN it is written out and read back
    let bytes = log.to_bytes().unwrap();
    let reloaded = EditLog::from_bytes(&bytes).unwrap();

    // THEN it replays to the same graph and undoes back to the prior one
    let mut replica = prior.clone();
    reloaded.execute(&mut replica).unwrap();
    assert_eq!(GraphSnapshot::capture(&replica), expected);
    reloaded.undo(&mut replica).unwrap();
    assert_eq!(
        GraphSnapshot::capture(&replica),
        GraphSnapshot::capture(&prior)
    );

    // AND writing it again yields the same bytes
    assert_eq!(reloaded.to_bytes().unwrap(), bytes);
    assert_eq!(reloaded.words(), log.words());
    assert_eq!(reloaded.final_registers(), log.final_registers());
}

#[test]
fn test_encoded_size_covers_the_instruction_stream() {
    // GIVEN
    let (mut graph, schema) = populated();
    let log = record_mixed(&mut graph, &schema);

    // WHEN
    let stats = log.stats().unwrap();
    let bytes = log.to_bytes().unwrap();

    // THEN the objects section comes on top of the counted size
    assert_eq!(stats.words, log.words().len());
    assert!(bytes.len() > stats.encoded_size);
    assert!(stats.bytes_per_edit() > 0.0);
}

// ========== TEST: Registered Operations ==========

mod relabel {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("relabel")
            .registry(registry())
            .step(
                "schema",
                |tx| {
                    let name = tx.add_attribute(AttributeSpec::new(
                        ElementType::Vertex,
                        "string",
                        "name",
                    ))?;
                    let v = tx.add_vertex()?;
                    tx.set_object(name, v.into(), Value::from("draft"))
                },
                |a| a.vertices(1),
            )
            .step(
                "relabel",
                |tx| {
                    let name = attribute(tx, ElementType::Vertex, "name")?;
                    let v = vertex(tx, 0)?;
                    tx.execute_graph_operation(Arc::new(Relabel::new(name, v, "draft", "final")))
                },
                |a| {
                    a.kind(Operation::ExecuteGraphOperation, 1)
                        .vertex_value("name", VertexId(0), SnapshotValue::Object("final".into()))
                },
            )
    }

    #[test]
    fn test_registered_operation_survives_reload() {
        scenario().run().unwrap();
    }
}

#[test]
fn test_unregistered_operation_is_rejected_on_load() {
    // GIVEN a log embedding a relabel operation
    let mut graph = MemoryGraph::new();
    let name = graph
        .add_attribute(AttributeSpec::new(ElementType::Vertex, "string", "name"))
        .unwrap();
    let v = graph.add_vertex().unwrap();
    let mut tx = EditTransaction::recording(&mut graph);
    tx.execute_graph_operation(Arc::new(Relabel::new(name, v, Value::Null, "x")))
        .unwrap();
    let bytes = tx.commit().unwrap().into_log().to_bytes().unwrap();

    // WHEN it is loaded without a reader for the operation
    let result = EditLog::from_bytes(&bytes);

    // THEN
    assert!(matches!(
        result,
        Err(EditError::UnknownObjectType { ref name }) if name == "relabel"
    ));
    assert!(EditLog::from_bytes_with(&bytes, &registry()).is_ok());
}

// ========== TEST: Nested Logs ==========

#[test]
fn test_nested_log_round_trips_through_the_parent() {
    // GIVEN a child log recorded and rolled back
    let (mut graph, schema) = populated();
    let child = {
        let mut tx = EditTransaction::recording(&mut graph);
        tx.set_int(schema.count, VertexId(1).into(), 7).unwrap();
        tx.add_vertex().unwrap();
        tx.rollback().unwrap()
    };
    let prior = graph.clone();

    // WHEN a parent embeds it next to its own edits
    let mut tx = EditTransaction::recording(&mut graph);
    tx.add_child(Arc::new(child)).unwrap();
    tx.set_boolean(schema.flag, VertexId(0).into(), true).unwrap();
    let parent = tx.commit().unwrap().into_log();
    let expected = GraphSnapshot::capture(&graph);
    assert_eq!(graph.vertex_count(), 4);

    // THEN the reloaded parent replays the child too
    let reloaded = EditLog::from_bytes_with(&parent.to_bytes().unwrap(), &ObjectRegistry::new())
        .unwrap();
    let mut replica = prior.clone();
    reloaded.execute(&mut replica).unwrap();
    assert_eq!(GraphSnapshot::capture(&replica), expected);
    assert_eq!(replica.get_int(schema.count, VertexId(1).into()).unwrap(), 7);

    reloaded.undo(&mut replica).unwrap();
    assert_eq!(
        GraphSnapshot::capture(&replica),
        GraphSnapshot::capture(&prior)
    );
}

#[test]
fn test_recorder_and_reload_agree_on_objects() {
    // GIVEN
    let (mut graph, schema) = populated();
    let mut tx = EditTransaction::new(&mut graph, EditRecorder::new());
    for n in 0..3 {
        tx.set_object(schema.name, VertexId(n).into(), Value::from("same"))
            .unwrap();
    }
    let log = tx.commit().unwrap().into_log();

    // WHEN
    let reloaded = EditLog::from_bytes(&log.to_bytes().unwrap()).unwrap();

    // THEN the shared string is still stored once
    assert_eq!(log.objects().len(), 2);
    assert_eq!(reloaded.objects().len(), 2);
}
