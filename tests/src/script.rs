//! Random mutation scripts for property tests.
//!
//! A script is a list of mutations whose targets are picked by position
//! among the live elements at the time the mutation runs, so every
//! generated script is valid against any graph.
//!
//! Default values never change in a script: a stored value equal to the
//! default reads as unset, so undo cannot tell it apart once the default
//! moves.

use proptest::prelude::*;
use retrace_core::{ElementType, GraphRead, IndexType, Value};
use retrace_graph::MemoryGraph;
use retrace_journal::EditSink;
use retrace_transaction::{EditTransaction, TransactionResult};

use crate::fixture::Schema;

#[derive(Debug, Clone)]
pub enum Mutation {
    AddVertex,
    RemoveVertex(usize),
    AddTransaction {
        source: usize,
        destination: usize,
        directed: bool,
    },
    RemoveTransaction(usize),
    SetSource {
        transaction: usize,
        vertex: usize,
    },
    SetDestination {
        transaction: usize,
        vertex: usize,
    },
    SetCount {
        vertex: usize,
        value: i32,
    },
    SetWeight {
        vertex: usize,
        value: f64,
    },
    SetFlag {
        vertex: usize,
        value: bool,
    },
    SetInitial {
        vertex: usize,
        value: char,
    },
    SetName {
        vertex: usize,
        value: Option<String>,
    },
    SetKind {
        transaction: usize,
        value: String,
    },
    RenameCount(String),
    IndexName(IndexType),
    KeyOnName(bool),
}

fn pick<T: Copy>(items: &[T], n: usize) -> Option<T> {
    items.get(n.checked_rem(items.len())?).copied()
}

impl Mutation {
    /// Apply the mutation through a transaction. Mutations whose targets
    /// do not exist yet are skipped.
    pub fn apply<S: EditSink>(
        &self,
        tx: &mut EditTransaction<'_, MemoryGraph, S>,
        schema: &Schema,
    ) -> TransactionResult<()> {
        let vertices = tx.graph().vertices();
        let transactions = tx.graph().transactions();

        match self {
            Mutation::AddVertex => tx.add_vertex().map(|_| ()),
            Mutation::RemoveVertex(n) => match pick(&vertices, *n) {
                Some(v) => tx.remove_vertex(v),
                None => Ok(()),
            },
            Mutation::AddTransaction {
                source,
                destination,
                directed,
            } => match (pick(&vertices, *source), pick(&vertices, *destination)) {
                (Some(s), Some(d)) => tx.add_transaction(s, d, *directed).map(|_| ()),
                _ => Ok(()),
            },
            Mutation::RemoveTransaction(n) => match pick(&transactions, *n) {
                Some(t) => tx.remove_transaction(t),
                None => Ok(()),
            },
            Mutation::SetSource {
                transaction,
                vertex,
            } => match (pick(&transactions, *transaction), pick(&vertices, *vertex)) {
                (Some(t), Some(v)) => tx.set_transaction_source_vertex(t, v),
                _ => Ok(()),
            },
            Mutation::SetDestination {
                transaction,
                vertex,
            } => match (pick(&transactions, *transaction), pick(&vertices, *vertex)) {
                (Some(t), Some(v)) => tx.set_transaction_destination_vertex(t, v),
                _ => Ok(()),
            },
            Mutation::SetCount { vertex, value } => match pick(&vertices, *vertex) {
                Some(v) => tx.set_int(schema.count, v.into(), *value),
                None => Ok(()),
            },
            Mutation::SetWeight { vertex, value } => match pick(&vertices, *vertex) {
                Some(v) => tx.set_double(schema.weight, v.into(), *value),
                None => Ok(()),
            },
            Mutation::SetFlag { vertex, value } => match pick(&vertices, *vertex) {
                Some(v) => tx.set_boolean(schema.flag, v.into(), *value),
                None => Ok(()),
            },
            Mutation::SetInitial { vertex, value } => match pick(&vertices, *vertex) {
                Some(v) => tx.set_char(schema.initial, v.into(), *value),
                None => Ok(()),
            },
            Mutation::SetName { vertex, value } => match pick(&vertices, *vertex) {
                Some(v) => tx.set_object(schema.name, v.into(), Value::from(value.clone())),
                None => Ok(()),
            },
            Mutation::SetKind { transaction, value } => match pick(&transactions, *transaction) {
                Some(t) => tx.set_object(schema.kind, t.into(), Value::from(value.as_str())),
                None => Ok(()),
            },
            Mutation::RenameCount(label) => tx.update_attribute_name(schema.count, label.as_str()),
            Mutation::IndexName(index_type) => tx.set_attribute_index_type(schema.name, *index_type),
            Mutation::KeyOnName(on) => {
                let keys = if *on { vec![schema.name] } else { Vec::new() };
                tx.set_primary_key(ElementType::Vertex, &keys)
            }
        }
    }

    /// True for mutations that only touch vertices and transactions.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::AddVertex
                | Mutation::RemoveVertex(_)
                | Mutation::AddTransaction { .. }
                | Mutation::RemoveTransaction(_)
                | Mutation::SetSource { .. }
        )
    }
}

// ==================== Strategies ====================

pub fn arb_structural_mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        4 => Just(Mutation::AddVertex),
        1 => any::<usize>().prop_map(Mutation::RemoveVertex),
        3 => (any::<usize>(), any::<usize>(), any::<bool>()).prop_map(
            |(source, destination, directed)| Mutation::AddTransaction {
                source,
                destination,
                directed,
            }
        ),
        1 => any::<usize>().prop_map(Mutation::RemoveTransaction),
        2 => (any::<usize>(), any::<usize>())
            .prop_map(|(transaction, vertex)| Mutation::SetSource { transaction, vertex }),
    ]
}

fn arb_index_type() -> impl Strategy<Value = IndexType> {
    prop::sample::select(IndexType::ALL.to_vec())
}

pub fn arb_value_mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        (any::<usize>(), any::<usize>())
            .prop_map(|(transaction, vertex)| Mutation::SetDestination { transaction, vertex }),
        (any::<usize>(), any::<i32>())
            .prop_map(|(vertex, value)| Mutation::SetCount { vertex, value }),
        (any::<usize>(), any::<f64>())
            .prop_map(|(vertex, value)| Mutation::SetWeight { vertex, value }),
        (any::<usize>(), any::<bool>())
            .prop_map(|(vertex, value)| Mutation::SetFlag { vertex, value }),
        (any::<usize>(), any::<char>())
            .prop_map(|(vertex, value)| Mutation::SetInitial { vertex, value }),
        (any::<usize>(), proptest::option::of("[a-z]{0,6}"))
            .prop_map(|(vertex, value)| Mutation::SetName { vertex, value }),
        (any::<usize>(), "[a-z]{1,6}")
            .prop_map(|(transaction, value)| Mutation::SetKind { transaction, value }),
        "[a-z]{1,8}".prop_map(Mutation::RenameCount),
        arb_index_type().prop_map(Mutation::IndexName),
        any::<bool>().prop_map(Mutation::KeyOnName),
    ]
}

pub fn arb_mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        3 => arb_structural_mutation(),
        2 => arb_value_mutation(),
    ]
}

/// A script of up to `max` mutations of any kind.
pub fn arb_script(max: usize) -> impl Strategy<Value = Vec<Mutation>> {
    prop::collection::vec(arb_mutation(), 0..max)
}

/// A script of up to `max` structural mutations.
pub fn arb_structural_script(max: usize) -> impl Strategy<Value = Vec<Mutation>> {
    prop::collection::vec(arb_structural_mutation(), 0..max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_wraps_and_handles_empty() {
        assert_eq!(pick::<u32>(&[], 3), None);
        assert_eq!(pick(&[10, 20, 30], 4), Some(20));
    }
}
