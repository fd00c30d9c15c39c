//! The seams between recorders, logs and the graphs they replay against.

use crate::error::EditResult;
use retrace_core::{
    AttributeId, AttributeSpec, ElementId, ElementType, GraphOperation, GraphWrite, IndexType,
    TransactionId, Value, VertexId,
};
use std::fmt;
use std::io;
use std::sync::Arc;

/// A recorded edit that can be replayed forward and backward.
///
/// Edits are embedded in one another with [`EditSink::add_child`], so
/// they are shared behind `Arc` and must be thread safe.
pub trait GraphEdit: Send + Sync + fmt::Debug {
    fn execute(&self, graph: &mut dyn GraphWrite) -> EditResult<()>;

    fn undo(&self, graph: &mut dyn GraphWrite) -> EditResult<()>;

    /// Name the edit is registered under for persistence.
    fn type_name(&self) -> &str;

    /// Write the edit payload. The type header is written by the caller.
    fn write_to(&self, out: &mut dyn io::Write) -> EditResult<()>;
}

/// Receives one call per elementary graph mutation, with the values needed
/// to replay it in both directions.
pub trait EditSink {
    fn set_primary_key(
        &mut self,
        element_type: ElementType,
        old_keys: &[AttributeId],
        new_keys: &[AttributeId],
    ) -> EditResult<()>;

    fn add_vertex(&mut self, vertex: VertexId) -> EditResult<()>;

    fn remove_vertex(&mut self, vertex: VertexId) -> EditResult<()>;

    fn add_transaction(
        &mut self,
        source: VertexId,
        destination: VertexId,
        directed: bool,
        transaction: TransactionId,
    ) -> EditResult<()>;

    fn remove_transaction(
        &mut self,
        source: VertexId,
        destination: VertexId,
        directed: bool,
        transaction: TransactionId,
    ) -> EditResult<()>;

    /// `reversed` is set when the graph swapped the endpoints of an
    /// undirected transaction to keep its source below its destination.
    fn set_transaction_source_vertex(
        &mut self,
        transaction: TransactionId,
        old_source: VertexId,
        new_source: VertexId,
        reversed: bool,
    ) -> EditResult<()>;

    fn set_transaction_destination_vertex(
        &mut self,
        transaction: TransactionId,
        old_destination: VertexId,
        new_destination: VertexId,
        reversed: bool,
    ) -> EditResult<()>;

    fn add_attribute(&mut self, spec: &AttributeSpec, attribute: AttributeId) -> EditResult<()>;

    fn remove_attribute(&mut self, spec: &AttributeSpec, attribute: AttributeId)
        -> EditResult<()>;

    fn update_attribute_name(
        &mut self,
        attribute: AttributeId,
        old_name: &str,
        new_name: &str,
    ) -> EditResult<()>;

    fn update_attribute_description(
        &mut self,
        attribute: AttributeId,
        old_description: &str,
        new_description: &str,
    ) -> EditResult<()>;

    fn update_attribute_default_value(
        &mut self,
        attribute: AttributeId,
        old_default: &Value,
        new_default: &Value,
    ) -> EditResult<()>;

    fn set_byte_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: i8,
        new_value: i8,
    ) -> EditResult<()>;

    fn set_short_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: i16,
        new_value: i16,
    ) -> EditResult<()>;

    fn set_int_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: i32,
        new_value: i32,
    ) -> EditResult<()>;

    fn set_long_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: i64,
        new_value: i64,
    ) -> EditResult<()>;

    fn set_float_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: f32,
        new_value: f32,
    ) -> EditResult<()>;

    fn set_double_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: f64,
        new_value: f64,
    ) -> EditResult<()>;

    fn set_boolean_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: bool,
        new_value: bool,
    ) -> EditResult<()>;

    fn set_char_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: char,
        new_value: char,
    ) -> EditResult<()>;

    fn set_object_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: &Value,
        new_value: &Value,
    ) -> EditResult<()>;

    fn set_attribute_index_type(
        &mut self,
        attribute: AttributeId,
        old_type: IndexType,
        new_type: IndexType,
    ) -> EditResult<()>;

    /// Embed a nested edit, replayed in place.
    fn add_child(&mut self, child: Arc<dyn GraphEdit>) -> EditResult<()>;

    /// Embed a composite operation, replayed in place.
    fn execute_graph_operation(&mut self, operation: Arc<dyn GraphOperation>) -> EditResult<()>;

    /// End recording. No further calls are accepted.
    fn finish(&mut self) -> EditResult<()>;
}
