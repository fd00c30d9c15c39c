//! The mutation capability a graph exposes to the edit journal.
//!
//! `GraphRead` covers everything a recorder needs to observe prior state,
//! `GraphWrite` every elementary mutation a journal can replay. Both are
//! object safe so replay can run against `&mut dyn GraphWrite`.

use crate::{
    AttributeId, AttributeSpec, ElementId, ElementType, GraphResult, IndexType, TransactionId,
    Value, VertexId,
};
use std::fmt;
use std::io;

/// Read access to a graph.
pub trait GraphRead {
    // ==================== Structure ====================

    fn vertices(&self) -> Vec<VertexId>;

    fn transactions(&self) -> Vec<TransactionId>;

    fn has_vertex(&self, vertex: VertexId) -> bool;

    fn has_transaction(&self, transaction: TransactionId) -> bool;

    fn transaction_source(&self, transaction: TransactionId) -> GraphResult<VertexId>;

    fn transaction_destination(&self, transaction: TransactionId) -> GraphResult<VertexId>;

    fn transaction_directed(&self, transaction: TransactionId) -> GraphResult<bool>;

    /// Transactions with the vertex at either endpoint, in id order.
    fn vertex_transactions(&self, vertex: VertexId) -> GraphResult<Vec<TransactionId>>;

    // ==================== Schema ====================

    fn attributes(&self) -> Vec<AttributeId>;

    fn attribute(&self, attribute: AttributeId) -> GraphResult<&AttributeSpec>;

    fn attribute_index_type(&self, attribute: AttributeId) -> GraphResult<IndexType>;

    fn primary_key(&self, element_type: ElementType) -> Vec<AttributeId>;

    // ==================== Values ====================

    /// True when the element has no value stored, or the stored value
    /// equals the attribute default.
    fn is_default_value(&self, attribute: AttributeId, element: ElementId) -> GraphResult<bool>;

    fn get_byte(&self, attribute: AttributeId, element: ElementId) -> GraphResult<i8>;

    fn get_short(&self, attribute: AttributeId, element: ElementId) -> GraphResult<i16>;

    fn get_int(&self, attribute: AttributeId, element: ElementId) -> GraphResult<i32>;

    fn get_long(&self, attribute: AttributeId, element: ElementId) -> GraphResult<i64>;

    fn get_float(&self, attribute: AttributeId, element: ElementId) -> GraphResult<f32>;

    fn get_double(&self, attribute: AttributeId, element: ElementId) -> GraphResult<f64>;

    fn get_boolean(&self, attribute: AttributeId, element: ElementId) -> GraphResult<bool>;

    fn get_char(&self, attribute: AttributeId, element: ElementId) -> GraphResult<char>;

    fn get_object(&self, attribute: AttributeId, element: ElementId) -> GraphResult<Value>;
}

/// Write access to a graph.
///
/// Implementations validate every call; a rejected mutation leaves the
/// graph unchanged.
pub trait GraphWrite: GraphRead {
    // ==================== Structure ====================

    fn add_vertex(&mut self) -> GraphResult<VertexId>;

    fn remove_vertex(&mut self, vertex: VertexId) -> GraphResult<()>;

    fn add_transaction(
        &mut self,
        source: VertexId,
        destination: VertexId,
        directed: bool,
    ) -> GraphResult<TransactionId>;

    fn remove_transaction(&mut self, transaction: TransactionId) -> GraphResult<()>;

    /// Move the source endpoint. Undirected transactions keep
    /// `source <= destination` by swapping their endpoints.
    fn set_transaction_source(
        &mut self,
        transaction: TransactionId,
        source: VertexId,
    ) -> GraphResult<()>;

    /// Move the destination endpoint, with the same swap rule as
    /// [`GraphWrite::set_transaction_source`].
    fn set_transaction_destination(
        &mut self,
        transaction: TransactionId,
        destination: VertexId,
    ) -> GraphResult<()>;

    // ==================== Schema ====================

    fn add_attribute(&mut self, spec: AttributeSpec) -> GraphResult<AttributeId>;

    fn remove_attribute(&mut self, attribute: AttributeId) -> GraphResult<()>;

    fn update_attribute_name(&mut self, attribute: AttributeId, name: String) -> GraphResult<()>;

    fn update_attribute_description(
        &mut self,
        attribute: AttributeId,
        description: String,
    ) -> GraphResult<()>;

    fn update_attribute_default(&mut self, attribute: AttributeId, default: Value)
        -> GraphResult<()>;

    fn set_attribute_index_type(
        &mut self,
        attribute: AttributeId,
        index_type: IndexType,
    ) -> GraphResult<()>;

    fn set_primary_key(
        &mut self,
        element_type: ElementType,
        keys: &[AttributeId],
    ) -> GraphResult<()>;

    // ==================== Values ====================

    fn set_byte(&mut self, attribute: AttributeId, element: ElementId, value: i8)
        -> GraphResult<()>;

    fn set_short(&mut self, attribute: AttributeId, element: ElementId, value: i16)
        -> GraphResult<()>;

    fn set_int(&mut self, attribute: AttributeId, element: ElementId, value: i32)
        -> GraphResult<()>;

    fn set_long(&mut self, attribute: AttributeId, element: ElementId, value: i64)
        -> GraphResult<()>;

    fn set_float(&mut self, attribute: AttributeId, element: ElementId, value: f32)
        -> GraphResult<()>;

    fn set_double(&mut self, attribute: AttributeId, element: ElementId, value: f64)
        -> GraphResult<()>;

    fn set_boolean(&mut self, attribute: AttributeId, element: ElementId, value: bool)
        -> GraphResult<()>;

    fn set_char(&mut self, attribute: AttributeId, element: ElementId, value: char)
        -> GraphResult<()>;

    fn set_object(&mut self, attribute: AttributeId, element: ElementId, value: Value)
        -> GraphResult<()>;
}

/// An opaque composite operation that knows how to apply and reverse
/// itself against a graph.
pub trait GraphOperation: Send + Sync + fmt::Debug {
    fn execute(&self, graph: &mut dyn GraphWrite) -> GraphResult<()>;

    fn undo(&self, graph: &mut dyn GraphWrite) -> GraphResult<()>;

    /// Number of elementary changes this operation stands for.
    fn size(&self) -> usize {
        1
    }

    /// Name the operation is registered under for persistence.
    fn type_name(&self) -> &str;

    /// Write the operation payload. The type header is written by the caller.
    fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()>;
}
