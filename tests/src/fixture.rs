//! Shared graph fixtures and a composite operation for persistence tests.

use retrace_core::{
    AttributeId, AttributeSpec, ElementId, ElementType, GraphError, GraphOperation, GraphRead,
    GraphResult, GraphWrite, TransactionId, Value, VertexId,
};
use retrace_journal::{wire, EditResult, ObjectRegistry};
use retrace_transaction::TransactionResult;
use std::io;
use std::sync::Arc;

use crate::scenario::RecordingTransaction;

/// The `n`th live vertex in id order.
pub fn vertex(tx: &RecordingTransaction<'_>, n: usize) -> TransactionResult<VertexId> {
    tx.graph()
        .vertices()
        .get(n)
        .copied()
        .ok_or_else(|| GraphError::invalid_operation(format!("no vertex #{}", n)).into())
}

/// The `n`th live transaction in id order.
pub fn transaction(tx: &RecordingTransaction<'_>, n: usize) -> TransactionResult<TransactionId> {
    tx.graph()
        .transactions()
        .get(n)
        .copied()
        .ok_or_else(|| GraphError::invalid_operation(format!("no transaction #{}", n)).into())
}

/// Attribute by element type and label.
pub fn attribute(
    tx: &RecordingTransaction<'_>,
    element_type: ElementType,
    label: &str,
) -> TransactionResult<AttributeId> {
    tx.graph()
        .find_attribute(element_type, label)
        .ok_or_else(|| {
            GraphError::invalid_operation(format!("no {} attribute '{}'", element_type, label))
                .into()
        })
}

// ==================== Schema ====================

/// Attributes used by generated mutation scripts.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub count: AttributeId,
    pub weight: AttributeId,
    pub flag: AttributeId,
    pub initial: AttributeId,
    pub name: AttributeId,
    pub kind: AttributeId,
}

impl Schema {
    /// Create the schema directly on a graph, outside any recording.
    pub fn install(graph: &mut dyn GraphWrite) -> GraphResult<Self> {
        Ok(Self {
            count: graph.add_attribute(AttributeSpec::new(ElementType::Vertex, "int", "count"))?,
            weight: graph.add_attribute(
                AttributeSpec::new(ElementType::Vertex, "double", "weight").with_default(1.0),
            )?,
            flag: graph.add_attribute(AttributeSpec::new(ElementType::Vertex, "boolean", "flag"))?,
            initial: graph.add_attribute(AttributeSpec::new(ElementType::Vertex, "char", "initial"))?,
            name: graph.add_attribute(AttributeSpec::new(ElementType::Vertex, "string", "name"))?,
            kind: graph.add_attribute(
                AttributeSpec::new(ElementType::Transaction, "string", "kind")
                    .with_default("plain"),
            )?,
        })
    }
}

// ==================== Relabel ====================

pub const RELABEL_TYPE: &str = "relabel";

/// Replaces one object value with another, as a single opaque operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Relabel {
    pub attribute: AttributeId,
    pub element: ElementId,
    pub from: Value,
    pub to: Value,
}

impl Relabel {
    pub fn new(
        attribute: AttributeId,
        element: impl Into<ElementId>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Self {
            attribute,
            element: element.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn read(input: &mut dyn io::Read) -> EditResult<Arc<dyn GraphOperation>> {
        let attribute = AttributeId(wire::read_i32(input)? as u32);
        let element = ElementId(wire::read_i32(input)? as u32);
        let from = wire::read_value(input)?;
        let to = wire::read_value(input)?;
        Ok(Arc::new(Self {
            attribute,
            element,
            from,
            to,
        }))
    }
}

impl GraphOperation for Relabel {
    fn execute(&self, graph: &mut dyn GraphWrite) -> GraphResult<()> {
        graph.set_object(self.attribute, self.element, self.to.clone())
    }

    fn undo(&self, graph: &mut dyn GraphWrite) -> GraphResult<()> {
        graph.set_object(self.attribute, self.element, self.from.clone())
    }

    fn type_name(&self) -> &str {
        RELABEL_TYPE
    }

    fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()> {
        wire::write_i32(out, self.attribute.raw() as i32)?;
        wire::write_i32(out, self.element.raw() as i32)?;
        wire::write_value(out, &self.from)?;
        wire::write_value(out, &self.to)
    }
}

/// The default registry plus a reader for [`Relabel`].
pub fn registry() -> ObjectRegistry {
    ObjectRegistry::new().with_operation(RELABEL_TYPE, Relabel::read)
}
