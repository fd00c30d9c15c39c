//! Graph transactions that record every mutation they apply.

use retrace_core::{
    AttributeId, AttributeSpec, ElementId, ElementType, GraphError, GraphOperation, GraphWrite,
    IndexType, NativeType, TransactionId, Value, VertexId,
};
use retrace_journal::{EditLog, EditRecorder, EditResult, EditSink, GraphEdit};
use std::sync::Arc;
use tracing::debug;

use crate::error::{TransactionError, TransactionResult};

/// Transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Mutations are applied and recorded.
    Active,
    /// A recording failed after its mutation was applied.
    Failed,
}

/// Applies mutations to a graph and records each one, with the prior
/// state read from the graph, into an [`EditSink`].
///
/// A mutation the graph rejects is not recorded and leaves the
/// transaction usable. A recording the sink rejects leaves the graph ahead
/// of the edit, so the transaction refuses any further call.
pub struct EditTransaction<'g, G: GraphWrite, S: EditSink> {
    graph: &'g mut G,
    sink: S,
    state: TransactionState,
}

macro_rules! typed_setter {
    ($(#[$meta:meta])* $name:ident, $get:ident, $set:ident, $record:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $name(
            &mut self,
            attribute: AttributeId,
            element: ElementId,
            value: $ty,
        ) -> TransactionResult<()> {
            self.ensure_active()?;
            let old = self.graph.$get(attribute, element)?;
            self.graph.$set(attribute, element, value)?;
            self.record(|sink| sink.$record(attribute, element, old, value))
        }
    };
}

impl<'g, G: GraphWrite> EditTransaction<'g, G, EditRecorder> {
    /// Start a transaction recording into a fresh edit log.
    pub fn recording(graph: &'g mut G) -> Self {
        Self::new(graph, EditRecorder::new())
    }

    /// Finish the log and undo it, returning the graph to the state it had
    /// when the transaction began.
    pub fn rollback(mut self) -> TransactionResult<EditLog> {
        self.ensure_active()?;
        self.sink.finish()?;
        let log = self.sink.into_log();
        log.undo(&mut *self.graph)?;
        debug!(words = log.words().len(), "edit transaction rolled back");
        Ok(log)
    }
}

impl<'g, G: GraphWrite, S: EditSink> EditTransaction<'g, G, S> {
    pub fn new(graph: &'g mut G, sink: S) -> Self {
        Self {
            graph,
            sink,
            state: TransactionState::Active,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn graph(&self) -> &G {
        &*self.graph
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Finish the sink and hand it back.
    pub fn commit(mut self) -> TransactionResult<S> {
        self.ensure_active()?;
        self.sink.finish()?;
        debug!("edit transaction committed");
        Ok(self.sink)
    }

    fn ensure_active(&self) -> TransactionResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Failed => Err(TransactionError::Closed),
        }
    }

    fn record<F>(&mut self, record: F) -> TransactionResult<()>
    where
        F: FnOnce(&mut S) -> EditResult<()>,
    {
        record(&mut self.sink).map_err(|e| {
            self.state = TransactionState::Failed;
            TransactionError::Edit(e)
        })
    }

    // ========== Structure ==========

    pub fn add_vertex(&mut self) -> TransactionResult<VertexId> {
        self.ensure_active()?;
        let vertex = self.graph.add_vertex()?;
        self.record(|sink| sink.add_vertex(vertex))?;
        Ok(vertex)
    }

    /// Remove a vertex, first removing its transactions and resetting its
    /// values so that undo restores them.
    pub fn remove_vertex(&mut self, vertex: VertexId) -> TransactionResult<()> {
        self.ensure_active()?;
        if !self.graph.has_vertex(vertex) {
            return Err(GraphError::VertexNotFound(vertex).into());
        }
        let mut incident = self.graph.vertex_transactions(vertex)?;
        incident.dedup();
        for transaction in incident {
            self.remove_transaction(transaction)?;
        }
        self.reset_values(ElementType::Vertex, vertex.into())?;
        self.graph.remove_vertex(vertex)?;
        self.record(|sink| sink.remove_vertex(vertex))
    }

    pub fn add_transaction(
        &mut self,
        source: VertexId,
        destination: VertexId,
        directed: bool,
    ) -> TransactionResult<TransactionId> {
        self.ensure_active()?;
        let transaction = self.graph.add_transaction(source, destination, directed)?;
        self.record(|sink| sink.add_transaction(source, destination, directed, transaction))?;
        Ok(transaction)
    }

    pub fn remove_transaction(&mut self, transaction: TransactionId) -> TransactionResult<()> {
        self.ensure_active()?;
        let source = self.graph.transaction_source(transaction)?;
        let destination = self.graph.transaction_destination(transaction)?;
        let directed = self.graph.transaction_directed(transaction)?;
        self.reset_values(ElementType::Transaction, transaction.into())?;
        self.graph.remove_transaction(transaction)?;
        self.record(|sink| sink.remove_transaction(source, destination, directed, transaction))
    }

    pub fn set_transaction_source_vertex(
        &mut self,
        transaction: TransactionId,
        source: VertexId,
    ) -> TransactionResult<()> {
        self.ensure_active()?;
        let old_source = self.graph.transaction_source(transaction)?;
        let old_destination = self.graph.transaction_destination(transaction)?;
        let directed = self.graph.transaction_directed(transaction)?;
        self.graph.set_transaction_source(transaction, source)?;
        let reversed = !directed && source > old_destination;
        self.record(|sink| {
            sink.set_transaction_source_vertex(transaction, old_source, source, reversed)
        })
    }

    pub fn set_transaction_destination_vertex(
        &mut self,
        transaction: TransactionId,
        destination: VertexId,
    ) -> TransactionResult<()> {
        self.ensure_active()?;
        let old_source = self.graph.transaction_source(transaction)?;
        let old_destination = self.graph.transaction_destination(transaction)?;
        let directed = self.graph.transaction_directed(transaction)?;
        self.graph.set_transaction_destination(transaction, destination)?;
        let reversed = !directed && old_source > destination;
        self.record(|sink| {
            sink.set_transaction_destination_vertex(
                transaction,
                old_destination,
                destination,
                reversed,
            )
        })
    }

    // ========== Schema ==========

    pub fn add_attribute(&mut self, spec: AttributeSpec) -> TransactionResult<AttributeId> {
        self.ensure_active()?;
        let attribute = self.graph.add_attribute(spec.clone())?;
        self.record(|sink| sink.add_attribute(&spec, attribute))?;
        Ok(attribute)
    }

    /// Remove an attribute after resetting its values, its index type and
    /// its place in the primary key, each recorded.
    pub fn remove_attribute(&mut self, attribute: AttributeId) -> TransactionResult<()> {
        self.ensure_active()?;
        let element_type = self.graph.attribute(attribute)?.element_type;
        for element in self.elements(element_type) {
            self.reset_value(attribute, element)?;
        }
        if self.graph.attribute_index_type(attribute)? != IndexType::None {
            self.set_attribute_index_type(attribute, IndexType::None)?;
        }
        let keys = self.graph.primary_key(element_type);
        if keys.contains(&attribute) {
            let remaining: Vec<AttributeId> =
                keys.into_iter().filter(|key| *key != attribute).collect();
            self.set_primary_key(element_type, &remaining)?;
        }
        let spec = self.graph.attribute(attribute)?.clone();
        self.graph.remove_attribute(attribute)?;
        self.record(|sink| sink.remove_attribute(&spec, attribute))
    }

    pub fn update_attribute_name(
        &mut self,
        attribute: AttributeId,
        name: impl Into<String>,
    ) -> TransactionResult<()> {
        self.ensure_active()?;
        let name = name.into();
        let old = self.graph.attribute(attribute)?.label.clone();
        self.graph.update_attribute_name(attribute, name.clone())?;
        self.record(|sink| sink.update_attribute_name(attribute, &old, &name))
    }

    pub fn update_attribute_description(
        &mut self,
        attribute: AttributeId,
        description: impl Into<String>,
    ) -> TransactionResult<()> {
        self.ensure_active()?;
        let description = description.into();
        let old = self.graph.attribute(attribute)?.description.clone();
        self.graph
            .update_attribute_description(attribute, description.clone())?;
        self.record(|sink| sink.update_attribute_description(attribute, &old, &description))
    }

    pub fn update_attribute_default_value(
        &mut self,
        attribute: AttributeId,
        default: Value,
    ) -> TransactionResult<()> {
        self.ensure_active()?;
        let old = self.graph.attribute(attribute)?.default_value.clone();
        self.graph
            .update_attribute_default(attribute, default.clone())?;
        self.record(|sink| sink.update_attribute_default_value(attribute, &old, &default))
    }

    pub fn set_attribute_index_type(
        &mut self,
        attribute: AttributeId,
        index_type: IndexType,
    ) -> TransactionResult<()> {
        self.ensure_active()?;
        let old = self.graph.attribute_index_type(attribute)?;
        self.graph.set_attribute_index_type(attribute, index_type)?;
        self.record(|sink| sink.set_attribute_index_type(attribute, old, index_type))
    }

    pub fn set_primary_key(
        &mut self,
        element_type: ElementType,
        keys: &[AttributeId],
    ) -> TransactionResult<()> {
        self.ensure_active()?;
        let old = self.graph.primary_key(element_type);
        self.graph.set_primary_key(element_type, keys)?;
        self.record(|sink| sink.set_primary_key(element_type, &old, keys))
    }

    // ========== Values ==========

    typed_setter!(set_byte, get_byte, set_byte, set_byte_value, i8);
    typed_setter!(set_short, get_short, set_short, set_short_value, i16);
    typed_setter!(set_int, get_int, set_int, set_int_value, i32);
    typed_setter!(set_long, get_long, set_long, set_long_value, i64);
    typed_setter!(set_float, get_float, set_float, set_float_value, f32);
    typed_setter!(set_double, get_double, set_double, set_double_value, f64);
    typed_setter!(set_boolean, get_boolean, set_boolean, set_boolean_value, bool);
    typed_setter!(set_char, get_char, set_char, set_char_value, char);

    pub fn set_object(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        value: Value,
    ) -> TransactionResult<()> {
        self.ensure_active()?;
        let old = self.graph.get_object(attribute, element)?;
        self.graph.set_object(attribute, element, value.clone())?;
        self.record(|sink| sink.set_object_value(attribute, element, &old, &value))
    }

    /// Set a value through the setter matching the attribute's native type.
    pub fn set_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        value: Value,
    ) -> TransactionResult<()> {
        let native = self.graph.attribute(attribute)?.native_type();
        let mismatch = |value: &Value| -> TransactionError {
            GraphError::type_mismatch(attribute, native.name(), value.type_name()).into()
        };
        match native {
            NativeType::Byte => {
                let v = value.as_int().and_then(|i| i8::try_from(i).ok());
                self.set_byte(attribute, element, v.ok_or_else(|| mismatch(&value))?)
            }
            NativeType::Short => {
                let v = value.as_int().and_then(|i| i16::try_from(i).ok());
                self.set_short(attribute, element, v.ok_or_else(|| mismatch(&value))?)
            }
            NativeType::Int => {
                let v = value.as_int().and_then(|i| i32::try_from(i).ok());
                self.set_int(attribute, element, v.ok_or_else(|| mismatch(&value))?)
            }
            NativeType::Long => {
                let v = value.as_int();
                self.set_long(attribute, element, v.ok_or_else(|| mismatch(&value))?)
            }
            NativeType::Float => {
                let v = value.as_float().map(|f| f as f32);
                self.set_float(attribute, element, v.ok_or_else(|| mismatch(&value))?)
            }
            NativeType::Double => {
                let v = value.as_float();
                self.set_double(attribute, element, v.ok_or_else(|| mismatch(&value))?)
            }
            NativeType::Boolean => {
                let v = value.as_bool();
                self.set_boolean(attribute, element, v.ok_or_else(|| mismatch(&value))?)
            }
            NativeType::Char => {
                let mut chars = value.as_str().map(str::chars);
                let v = match chars.as_mut().map(|c| (c.next(), c.next())) {
                    Some((Some(c), None)) => Some(c),
                    _ => None,
                };
                self.set_char(attribute, element, v.ok_or_else(|| mismatch(&value))?)
            }
            NativeType::Object => self.set_object(attribute, element, value),
        }
    }

    fn reset_value(&mut self, attribute: AttributeId, element: ElementId) -> TransactionResult<()> {
        if self.graph.is_default_value(attribute, element)? {
            return Ok(());
        }
        let spec = self.graph.attribute(attribute)?;
        let native = spec.native_type();
        let default = spec.default_value.clone();
        match native {
            NativeType::Byte => self.set_byte(attribute, element, default.coerce_int() as i8),
            NativeType::Short => self.set_short(attribute, element, default.coerce_int() as i16),
            NativeType::Int => self.set_int(attribute, element, default.coerce_int() as i32),
            NativeType::Long => self.set_long(attribute, element, default.coerce_int()),
            NativeType::Float => {
                self.set_float(attribute, element, default.coerce_float() as f32)
            }
            NativeType::Double => self.set_double(attribute, element, default.coerce_float()),
            NativeType::Boolean => self.set_boolean(attribute, element, default.coerce_bool()),
            NativeType::Char => self.set_char(attribute, element, default.coerce_char()),
            NativeType::Object => self.set_object(attribute, element, default),
        }
    }

    fn reset_values(&mut self, element_type: ElementType, element: ElementId) -> TransactionResult<()> {
        let attributes: Vec<AttributeId> = self
            .graph
            .attributes()
            .into_iter()
            .filter(|attribute| {
                self.graph
                    .attribute(*attribute)
                    .map(|spec| spec.element_type == element_type)
                    .unwrap_or(false)
            })
            .collect();
        for attribute in attributes {
            self.reset_value(attribute, element)?;
        }
        Ok(())
    }

    /// Live rows for attributes of the given element type.
    fn elements(&self, element_type: ElementType) -> Vec<ElementId> {
        match element_type {
            ElementType::Vertex => self.graph.vertices().into_iter().map(Into::into).collect(),
            ElementType::Transaction => self
                .graph
                .transactions()
                .into_iter()
                .map(Into::into)
                .collect(),
            ElementType::Graph | ElementType::Meta => vec![ElementId::new(0)],
            ElementType::Link | ElementType::Edge => Vec::new(),
        }
    }

    // ========== Nested ==========

    /// Execute a finished edit against the graph and embed it.
    pub fn add_child(&mut self, child: Arc<dyn GraphEdit>) -> TransactionResult<()> {
        self.ensure_active()?;
        child.execute(&mut *self.graph)?;
        self.record(|sink| sink.add_child(child))
    }

    /// Execute a composite operation against the graph and embed it.
    pub fn execute_graph_operation(
        &mut self,
        operation: Arc<dyn GraphOperation>,
    ) -> TransactionResult<()> {
        self.ensure_active()?;
        operation.execute(&mut *self.graph)?;
        self.record(|sink| sink.execute_graph_operation(operation))
    }
}
