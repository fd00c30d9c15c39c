//! Comparable captures of a graph's observable state.

use crate::column::Cell;
use crate::graph::TransactionRecord;
use crate::MemoryGraph;
use retrace_core::{
    AttributeId, AttributeSpec, ElementId, ElementType, GraphRead, IndexType, TransactionId,
    Value, VertexId,
};
use std::collections::BTreeMap;

/// A stored value with floats captured as raw bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(u32),
    Double(u64),
    Boolean(bool),
    Char(char),
    Object(Value),
}

impl From<&Cell> for SnapshotValue {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Byte(v) => SnapshotValue::Byte(*v),
            Cell::Short(v) => SnapshotValue::Short(*v),
            Cell::Int(v) => SnapshotValue::Int(*v),
            Cell::Long(v) => SnapshotValue::Long(*v),
            Cell::Float(v) => SnapshotValue::Float(v.to_bits()),
            Cell::Double(v) => SnapshotValue::Double(v.to_bits()),
            Cell::Boolean(v) => SnapshotValue::Boolean(*v),
            Cell::Char(v) => SnapshotValue::Char(*v),
            Cell::Object(v) => SnapshotValue::Object(v.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSnapshot {
    pub spec: AttributeSpec,
    pub index_type: IndexType,
    /// Non-default values by element.
    pub values: BTreeMap<ElementId, SnapshotValue>,
}

/// Everything a caller can observe about a [`MemoryGraph`].
///
/// Id allocator state is deliberately left out: two graphs compare equal
/// when every read through the capability would agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSnapshot {
    pub vertices: Vec<VertexId>,
    pub transactions: BTreeMap<TransactionId, TransactionRecord>,
    pub attributes: BTreeMap<AttributeId, AttributeSnapshot>,
    pub primary_keys: BTreeMap<ElementType, Vec<AttributeId>>,
}

impl GraphSnapshot {
    pub fn capture(graph: &MemoryGraph) -> Self {
        let transactions = graph
            .transactions()
            .into_iter()
            .filter_map(|t| graph.transaction(t).map(|record| (t, *record)))
            .collect();

        let attributes = graph
            .columns()
            .map(|column| {
                let values = column
                    .elements()
                    .filter(|element| !column.is_default(*element))
                    .map(|element| (element, SnapshotValue::from(column.get(element))))
                    .collect();
                (
                    column.id,
                    AttributeSnapshot {
                        spec: column.spec.clone(),
                        index_type: column.index_type,
                        values,
                    },
                )
            })
            .collect();

        let primary_keys = ElementType::ALL
            .into_iter()
            .map(|element_type| (element_type, graph.primary_key(element_type)))
            .filter(|(_, keys)| !keys.is_empty())
            .collect();

        Self {
            vertices: graph.vertices(),
            transactions,
            attributes,
            primary_keys,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.transactions.is_empty() && self.attributes.is_empty()
    }
}
