//! In-memory graph storage implementing the mutation capability.

use crate::column::{Cell, Column};
use crate::index::{AdjacencyIndex, IdAllocator};
use retrace_core::{
    AttributeId, AttributeSpec, ElementId, ElementType, GraphError, GraphRead, GraphResult,
    GraphWrite, IndexType, TransactionId, Value, VertexId, MAX_ID,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Endpoints and direction of a stored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionRecord {
    pub source: VertexId,
    pub destination: VertexId,
    pub directed: bool,
}

/// The in-memory graph storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    /// Live vertices
    vertices: BTreeSet<VertexId>,
    /// Live transactions
    transactions: BTreeMap<TransactionId, TransactionRecord>,
    /// Attribute columns
    columns: BTreeMap<AttributeId, Column>,
    /// Primary key per element type
    primary_keys: HashMap<ElementType, Vec<AttributeId>>,
    vertex_ids: IdAllocator,
    transaction_ids: IdAllocator,
    attribute_ids: IdAllocator,
    /// Adjacency index
    adjacency: AdjacencyIndex,
}

impl MemoryGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.columns.len()
    }

    pub fn transaction(&self, transaction: TransactionId) -> Option<&TransactionRecord> {
        self.transactions.get(&transaction)
    }

    pub(crate) fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.values()
    }

    /// Find an attribute by element type and label.
    pub fn find_attribute(&self, element_type: ElementType, label: &str) -> Option<AttributeId> {
        self.columns
            .values()
            .find(|c| c.spec.element_type == element_type && c.spec.label == label)
            .map(|c| c.id)
    }

    fn check_vertex(&self, vertex: VertexId) -> GraphResult<()> {
        if self.vertices.contains(&vertex) {
            Ok(())
        } else {
            Err(GraphError::VertexNotFound(vertex))
        }
    }

    fn record(&self, transaction: TransactionId) -> GraphResult<&TransactionRecord> {
        self.transactions
            .get(&transaction)
            .ok_or(GraphError::TransactionNotFound(transaction))
    }

    fn column(&self, attribute: AttributeId) -> GraphResult<&Column> {
        self.columns
            .get(&attribute)
            .ok_or(GraphError::AttributeNotFound(attribute))
    }

    fn element_exists(&self, element_type: ElementType, element: ElementId) -> bool {
        match element_type {
            ElementType::Vertex => self.vertices.contains(&VertexId(element.0)),
            ElementType::Transaction => self.transactions.contains_key(&TransactionId(element.0)),
            ElementType::Graph | ElementType::Meta => element.0 == 0,
            ElementType::Link | ElementType::Edge => false,
        }
    }

    fn cell(&self, attribute: AttributeId, element: ElementId) -> GraphResult<&Cell> {
        let column = self.column(attribute)?;
        if !self.element_exists(column.spec.element_type, element) {
            return Err(GraphError::ElementNotFound { attribute, element });
        }
        Ok(column.get(element))
    }

    fn store(&mut self, attribute: AttributeId, element: ElementId, cell: Cell) -> GraphResult<()> {
        let element_type = self.column(attribute)?.spec.element_type;
        if !self.element_exists(element_type, element) {
            return Err(GraphError::ElementNotFound { attribute, element });
        }
        match self.columns.get_mut(&attribute) {
            Some(column) => column.set(element, cell),
            None => Err(GraphError::AttributeNotFound(attribute)),
        }
    }

    fn clear_values(&mut self, element_type: ElementType, element: ElementId) {
        for column in self.columns.values_mut() {
            if column.spec.element_type == element_type {
                column.clear(element);
            }
        }
    }

    fn column_mut(&mut self, attribute: AttributeId) -> GraphResult<&mut Column> {
        self.columns
            .get_mut(&attribute)
            .ok_or(GraphError::AttributeNotFound(attribute))
    }

    fn allocate(alloc: &mut IdAllocator) -> GraphResult<u32> {
        let id = alloc.alloc();
        if id > MAX_ID {
            alloc.release(id);
            return Err(GraphError::invalid_operation("id space exhausted"));
        }
        Ok(id)
    }

    fn mismatch<T>(attribute: AttributeId, expected: &str, cell: &Cell) -> GraphResult<T> {
        Err(GraphError::type_mismatch(
            attribute,
            expected,
            cell.native_type().name(),
        ))
    }

    fn reattach(
        &mut self,
        transaction: TransactionId,
        source: VertexId,
        destination: VertexId,
    ) -> GraphResult<()> {
        let old = *self.record(transaction)?;
        self.adjacency.remove(transaction, old.source, old.destination);
        self.adjacency.insert(transaction, source, destination);
        self.transactions.insert(
            transaction,
            TransactionRecord {
                source,
                destination,
                directed: old.directed,
            },
        );
        Ok(())
    }
}

impl GraphRead for MemoryGraph {
    // ==================== Structure ====================

    fn vertices(&self) -> Vec<VertexId> {
        self.vertices.iter().copied().collect()
    }

    fn transactions(&self) -> Vec<TransactionId> {
        self.transactions.keys().copied().collect()
    }

    fn has_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    fn has_transaction(&self, transaction: TransactionId) -> bool {
        self.transactions.contains_key(&transaction)
    }

    fn transaction_source(&self, transaction: TransactionId) -> GraphResult<VertexId> {
        Ok(self.record(transaction)?.source)
    }

    fn transaction_destination(&self, transaction: TransactionId) -> GraphResult<VertexId> {
        Ok(self.record(transaction)?.destination)
    }

    fn transaction_directed(&self, transaction: TransactionId) -> GraphResult<bool> {
        Ok(self.record(transaction)?.directed)
    }

    fn vertex_transactions(&self, vertex: VertexId) -> GraphResult<Vec<TransactionId>> {
        self.check_vertex(vertex)?;
        Ok(self.adjacency.transactions_of(vertex).collect())
    }

    // ==================== Schema ====================

    fn attributes(&self) -> Vec<AttributeId> {
        self.columns.keys().copied().collect()
    }

    fn attribute(&self, attribute: AttributeId) -> GraphResult<&AttributeSpec> {
        Ok(&self.column(attribute)?.spec)
    }

    fn attribute_index_type(&self, attribute: AttributeId) -> GraphResult<IndexType> {
        Ok(self.column(attribute)?.index_type)
    }

    fn primary_key(&self, element_type: ElementType) -> Vec<AttributeId> {
        self.primary_keys
            .get(&element_type)
            .cloned()
            .unwrap_or_default()
    }

    // ==================== Values ====================

    fn is_default_value(&self, attribute: AttributeId, element: ElementId) -> GraphResult<bool> {
        self.cell(attribute, element)?;
        Ok(self.column(attribute)?.is_default(element))
    }

    fn get_byte(&self, attribute: AttributeId, element: ElementId) -> GraphResult<i8> {
        match self.cell(attribute, element)? {
            Cell::Byte(v) => Ok(*v),
            other => Self::mismatch(attribute, "byte", other),
        }
    }

    fn get_short(&self, attribute: AttributeId, element: ElementId) -> GraphResult<i16> {
        match self.cell(attribute, element)? {
            Cell::Short(v) => Ok(*v),
            other => Self::mismatch(attribute, "short", other),
        }
    }

    fn get_int(&self, attribute: AttributeId, element: ElementId) -> GraphResult<i32> {
        match self.cell(attribute, element)? {
            Cell::Int(v) => Ok(*v),
            other => Self::mismatch(attribute, "int", other),
        }
    }

    fn get_long(&self, attribute: AttributeId, element: ElementId) -> GraphResult<i64> {
        match self.cell(attribute, element)? {
            Cell::Long(v) => Ok(*v),
            other => Self::mismatch(attribute, "long", other),
        }
    }

    fn get_float(&self, attribute: AttributeId, element: ElementId) -> GraphResult<f32> {
        match self.cell(attribute, element)? {
            Cell::Float(v) => Ok(*v),
            other => Self::mismatch(attribute, "float", other),
        }
    }

    fn get_double(&self, attribute: AttributeId, element: ElementId) -> GraphResult<f64> {
        match self.cell(attribute, element)? {
            Cell::Double(v) => Ok(*v),
            other => Self::mismatch(attribute, "double", other),
        }
    }

    fn get_boolean(&self, attribute: AttributeId, element: ElementId) -> GraphResult<bool> {
        match self.cell(attribute, element)? {
            Cell::Boolean(v) => Ok(*v),
            other => Self::mismatch(attribute, "boolean", other),
        }
    }

    fn get_char(&self, attribute: AttributeId, element: ElementId) -> GraphResult<char> {
        match self.cell(attribute, element)? {
            Cell::Char(v) => Ok(*v),
            other => Self::mismatch(attribute, "char", other),
        }
    }

    fn get_object(&self, attribute: AttributeId, element: ElementId) -> GraphResult<Value> {
        match self.cell(attribute, element)? {
            Cell::Object(v) => Ok(v.clone()),
            other => Self::mismatch(attribute, "object", other),
        }
    }
}

impl GraphWrite for MemoryGraph {
    // ==================== Vertex Operations ====================

    fn add_vertex(&mut self) -> GraphResult<VertexId> {
        let id = VertexId(Self::allocate(&mut self.vertex_ids)?);
        self.vertices.insert(id);
        Ok(id)
    }

    fn remove_vertex(&mut self, vertex: VertexId) -> GraphResult<()> {
        self.check_vertex(vertex)?;
        if self.adjacency.has_transactions(vertex) {
            return Err(GraphError::VertexHasTransactions(vertex));
        }
        self.vertices.remove(&vertex);
        self.clear_values(ElementType::Vertex, vertex.into());
        self.vertex_ids.release(vertex.0);
        Ok(())
    }

    // ==================== Transaction Operations ====================

    fn add_transaction(
        &mut self,
        source: VertexId,
        destination: VertexId,
        directed: bool,
    ) -> GraphResult<TransactionId> {
        self.check_vertex(source)?;
        self.check_vertex(destination)?;
        let (source, destination) = if !directed && source > destination {
            (destination, source)
        } else {
            (source, destination)
        };
        let id = TransactionId(Self::allocate(&mut self.transaction_ids)?);
        self.transactions.insert(
            id,
            TransactionRecord {
                source,
                destination,
                directed,
            },
        );
        self.adjacency.insert(id, source, destination);
        Ok(id)
    }

    fn remove_transaction(&mut self, transaction: TransactionId) -> GraphResult<()> {
        let record = *self.record(transaction)?;
        self.adjacency
            .remove(transaction, record.source, record.destination);
        self.transactions.remove(&transaction);
        self.clear_values(ElementType::Transaction, transaction.into());
        self.transaction_ids.release(transaction.0);
        Ok(())
    }

    fn set_transaction_source(
        &mut self,
        transaction: TransactionId,
        source: VertexId,
    ) -> GraphResult<()> {
        self.check_vertex(source)?;
        let record = *self.record(transaction)?;
        if !record.directed && source > record.destination {
            self.reattach(transaction, record.destination, source)
        } else {
            self.reattach(transaction, source, record.destination)
        }
    }

    fn set_transaction_destination(
        &mut self,
        transaction: TransactionId,
        destination: VertexId,
    ) -> GraphResult<()> {
        self.check_vertex(destination)?;
        let record = *self.record(transaction)?;
        if !record.directed && destination < record.source {
            self.reattach(transaction, destination, record.source)
        } else {
            self.reattach(transaction, record.source, destination)
        }
    }

    // ==================== Attribute Operations ====================

    fn add_attribute(&mut self, spec: AttributeSpec) -> GraphResult<AttributeId> {
        if self.find_attribute(spec.element_type, &spec.label).is_some() {
            return Err(GraphError::invalid_operation(format!(
                "duplicate {} attribute '{}'",
                spec.element_type, spec.label
            )));
        }
        let id = AttributeId(Self::allocate(&mut self.attribute_ids)?);
        self.columns.insert(id, Column::new(id, spec));
        Ok(id)
    }

    fn remove_attribute(&mut self, attribute: AttributeId) -> GraphResult<()> {
        let column = self
            .columns
            .remove(&attribute)
            .ok_or(GraphError::AttributeNotFound(attribute))?;
        if let Some(keys) = self.primary_keys.get_mut(&column.spec.element_type) {
            keys.retain(|k| *k != attribute);
        }
        self.attribute_ids.release(attribute.0);
        Ok(())
    }

    fn update_attribute_name(&mut self, attribute: AttributeId, name: String) -> GraphResult<()> {
        self.column_mut(attribute)?.spec.label = name;
        Ok(())
    }

    fn update_attribute_description(
        &mut self,
        attribute: AttributeId,
        description: String,
    ) -> GraphResult<()> {
        self.column_mut(attribute)?.spec.description = description;
        Ok(())
    }

    fn update_attribute_default(
        &mut self,
        attribute: AttributeId,
        default: Value,
    ) -> GraphResult<()> {
        self.column_mut(attribute)?.set_default(default);
        Ok(())
    }

    fn set_attribute_index_type(
        &mut self,
        attribute: AttributeId,
        index_type: IndexType,
    ) -> GraphResult<()> {
        self.column_mut(attribute)?.index_type = index_type;
        Ok(())
    }

    fn set_primary_key(
        &mut self,
        element_type: ElementType,
        keys: &[AttributeId],
    ) -> GraphResult<()> {
        for key in keys {
            let spec = &self.column(*key)?.spec;
            if spec.element_type != element_type {
                return Err(GraphError::invalid_operation(format!(
                    "attribute {} belongs to {}, not {}",
                    key, spec.element_type, element_type
                )));
            }
        }
        if keys.is_empty() {
            self.primary_keys.remove(&element_type);
        } else {
            self.primary_keys.insert(element_type, keys.to_vec());
        }
        Ok(())
    }

    // ==================== Value Operations ====================

    fn set_byte(&mut self, attribute: AttributeId, element: ElementId, value: i8) -> GraphResult<()> {
        self.store(attribute, element, Cell::Byte(value))
    }

    fn set_short(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        value: i16,
    ) -> GraphResult<()> {
        self.store(attribute, element, Cell::Short(value))
    }

    fn set_int(&mut self, attribute: AttributeId, element: ElementId, value: i32) -> GraphResult<()> {
        self.store(attribute, element, Cell::Int(value))
    }

    fn set_long(&mut self, attribute: AttributeId, element: ElementId, value: i64) -> GraphResult<()> {
        self.store(attribute, element, Cell::Long(value))
    }

    fn set_float(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        value: f32,
    ) -> GraphResult<()> {
        self.store(attribute, element, Cell::Float(value))
    }

    fn set_double(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        value: f64,
    ) -> GraphResult<()> {
        self.store(attribute, element, Cell::Double(value))
    }

    fn set_boolean(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        value: bool,
    ) -> GraphResult<()> {
        self.store(attribute, element, Cell::Boolean(value))
    }

    fn set_char(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        value: char,
    ) -> GraphResult<()> {
        self.store(attribute, element, Cell::Char(value))
    }

    fn set_object(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        value: Value,
    ) -> GraphResult<()> {
        self.store(attribute, element, Cell::Object(value))
    }
}
