//! Collapses redundant structural edits before they reach a sink.
//!
//! Handles vertex add/remove, transaction add/remove and transaction
//! source-vertex updates. Every other mutation is rejected.
//!
//! Cancelling an add/remove pair is only sound when the graph hands back
//! the most recently freed id first, so replaying the shortened edit
//! allocates the same ids as the original.

use retrace_core::{
    AttributeId, AttributeSpec, ElementId, ElementType, GraphOperation, IndexType, TransactionId,
    Value, VertexId,
};
use retrace_journal::{EditError, EditResult, EditSink, GraphEdit};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    AddVertex(VertexId),
    RemoveVertex(VertexId),
    AddTransaction {
        source: VertexId,
        destination: VertexId,
        directed: bool,
        transaction: TransactionId,
    },
    RemoveTransaction {
        source: VertexId,
        destination: VertexId,
        directed: bool,
        transaction: TransactionId,
    },
    SetSource {
        transaction: TransactionId,
        old_source: VertexId,
        new_source: VertexId,
        reversed: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    entry: Entry,
    live: bool,
}

/// Where an add was buffered, and the counters it saw right after it.
#[derive(Debug, Clone, Copy)]
struct Stamp {
    index: usize,
    epoch: u64,
    generation: u64,
}

/// An [`EditSink`] decorator that buffers structural edits and forwards
/// the collapsed sequence on [`finish`](EditSink::finish).
///
/// Rules:
/// - A vertex removed after being added in this edit cancels both entries,
///   unless a live vertex add or remove, or a live transaction entry
///   touching the vertex, came in between.
/// - A transaction removed after being added cancels both entries, unless
///   a live transaction add or remove, or an endpoint update of it, came
///   in between.
/// - Consecutive non-reversed source updates of one transaction merge; a
///   merge that lands on the original source is dropped.
#[derive(Debug)]
pub struct NormalizingEdit<S: EditSink> {
    sink: S,
    entries: Vec<Pending>,
    /// Live vertex add/remove entries.
    vertex_epoch: u64,
    /// Live transaction add/remove entries.
    transaction_epoch: u64,
    /// Live transaction entries touching each vertex.
    vertex_generations: HashMap<VertexId, u64>,
    /// Live endpoint updates of each transaction.
    transaction_generations: HashMap<TransactionId, u64>,
    added_vertices: HashMap<VertexId, Stamp>,
    added_transactions: HashMap<TransactionId, Stamp>,
    finished: bool,
}

impl<S: EditSink> NormalizingEdit<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            entries: Vec::new(),
            vertex_epoch: 0,
            transaction_epoch: 0,
            vertex_generations: HashMap::new(),
            transaction_generations: HashMap::new(),
            added_vertices: HashMap::new(),
            added_transactions: HashMap::new(),
            finished: false,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Entries that will be forwarded on finish.
    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|p| p.live).count()
    }

    fn ensure_open(&self) -> EditResult<()> {
        if self.finished {
            Err(EditError::Finished)
        } else {
            Ok(())
        }
    }

    fn push(&mut self, entry: Entry) -> usize {
        self.entries.push(Pending { entry, live: true });
        self.entries.len() - 1
    }

    fn vertex_generation(&self, vertex: VertexId) -> u64 {
        self.vertex_generations.get(&vertex).copied().unwrap_or(0)
    }

    fn transaction_generation(&self, transaction: TransactionId) -> u64 {
        self.transaction_generations
            .get(&transaction)
            .copied()
            .unwrap_or(0)
    }

    fn touch(&mut self, a: VertexId, b: VertexId) {
        *self.vertex_generations.entry(a).or_default() += 1;
        if b != a {
            *self.vertex_generations.entry(b).or_default() += 1;
        }
    }

    fn untouch(&mut self, a: VertexId, b: VertexId) {
        for vertex in [a, b].into_iter().take(if a == b { 1 } else { 2 }) {
            if let Some(generation) = self.vertex_generations.get_mut(&vertex) {
                *generation = generation.saturating_sub(1);
            }
        }
    }

    fn last_live(&self) -> Option<usize> {
        self.entries.iter().rposition(|p| p.live)
    }

    fn forward(&mut self, entry: Entry) -> EditResult<()> {
        match entry {
            Entry::AddVertex(vertex) => self.sink.add_vertex(vertex),
            Entry::RemoveVertex(vertex) => self.sink.remove_vertex(vertex),
            Entry::AddTransaction {
                source,
                destination,
                directed,
                transaction,
            } => self
                .sink
                .add_transaction(source, destination, directed, transaction),
            Entry::RemoveTransaction {
                source,
                destination,
                directed,
                transaction,
            } => self
                .sink
                .remove_transaction(source, destination, directed, transaction),
            Entry::SetSource {
                transaction,
                old_source,
                new_source,
                reversed,
            } => self.sink.set_transaction_source_vertex(
                transaction,
                old_source,
                new_source,
                reversed,
            ),
        }
    }
}

impl<S: EditSink> EditSink for NormalizingEdit<S> {
    fn add_vertex(&mut self, vertex: VertexId) -> EditResult<()> {
        self.ensure_open()?;
        let index = self.push(Entry::AddVertex(vertex));
        self.vertex_epoch += 1;
        let stamp = Stamp {
            index,
            epoch: self.vertex_epoch,
            generation: self.vertex_generation(vertex),
        };
        self.added_vertices.insert(vertex, stamp);
        Ok(())
    }

    fn remove_vertex(&mut self, vertex: VertexId) -> EditResult<()> {
        self.ensure_open()?;
        if let Some(stamp) = self.added_vertices.remove(&vertex) {
            if stamp.epoch == self.vertex_epoch
                && stamp.generation == self.vertex_generation(vertex)
            {
                self.entries[stamp.index].live = false;
                self.vertex_epoch -= 1;
                trace!(%vertex, "cancelled vertex add/remove");
                return Ok(());
            }
        }
        self.push(Entry::RemoveVertex(vertex));
        self.vertex_epoch += 1;
        Ok(())
    }

    fn add_transaction(
        &mut self,
        source: VertexId,
        destination: VertexId,
        directed: bool,
        transaction: TransactionId,
    ) -> EditResult<()> {
        self.ensure_open()?;
        let index = self.push(Entry::AddTransaction {
            source,
            destination,
            directed,
            transaction,
        });
        self.transaction_epoch += 1;
        self.touch(source, destination);
        let stamp = Stamp {
            index,
            epoch: self.transaction_epoch,
            generation: self.transaction_generation(transaction),
        };
        self.added_transactions.insert(transaction, stamp);
        Ok(())
    }

    fn remove_transaction(
        &mut self,
        source: VertexId,
        destination: VertexId,
        directed: bool,
        transaction: TransactionId,
    ) -> EditResult<()> {
        self.ensure_open()?;
        if let Some(stamp) = self.added_transactions.remove(&transaction) {
            if stamp.epoch == self.transaction_epoch
                && stamp.generation == self.transaction_generation(transaction)
            {
                let added = &mut self.entries[stamp.index];
                added.live = false;
                if let Entry::AddTransaction {
                    source, destination, ..
                } = added.entry
                {
                    self.untouch(source, destination);
                }
                self.transaction_epoch -= 1;
                trace!(%transaction, "cancelled transaction add/remove");
                return Ok(());
            }
        }
        self.push(Entry::RemoveTransaction {
            source,
            destination,
            directed,
            transaction,
        });
        self.transaction_epoch += 1;
        self.touch(source, destination);
        Ok(())
    }

    fn set_transaction_source_vertex(
        &mut self,
        transaction: TransactionId,
        old_source: VertexId,
        new_source: VertexId,
        reversed: bool,
    ) -> EditResult<()> {
        self.ensure_open()?;
        if !reversed {
            if let Some(last) = self.last_live() {
                if let Entry::SetSource {
                    transaction: previous,
                    old_source: first_source,
                    new_source: merged_source,
                    reversed: false,
                } = self.entries[last].entry
                {
                    if previous == transaction {
                        self.untouch(first_source, merged_source);
                        if first_source == new_source {
                            self.entries[last].live = false;
                            if let Some(generation) =
                                self.transaction_generations.get_mut(&transaction)
                            {
                                *generation = generation.saturating_sub(1);
                            }
                        } else {
                            self.entries[last].entry = Entry::SetSource {
                                transaction,
                                old_source: first_source,
                                new_source,
                                reversed: false,
                            };
                            self.touch(first_source, new_source);
                        }
                        return Ok(());
                    }
                }
            }
        }
        self.push(Entry::SetSource {
            transaction,
            old_source,
            new_source,
            reversed,
        });
        *self.transaction_generations.entry(transaction).or_default() += 1;
        self.touch(old_source, new_source);
        Ok(())
    }

    fn finish(&mut self) -> EditResult<()> {
        self.ensure_open()?;
        self.finished = true;
        let entries = std::mem::take(&mut self.entries);
        let total = entries.len();
        let mut forwarded = 0usize;
        for pending in entries.into_iter().filter(|p| p.live) {
            self.forward(pending.entry)?;
            forwarded += 1;
        }
        debug!(buffered = total, forwarded, "normalized edit finished");
        self.sink.finish()
    }

    // ========== Unsupported ==========

    fn set_primary_key(
        &mut self,
        _element_type: ElementType,
        _old_keys: &[AttributeId],
        _new_keys: &[AttributeId],
    ) -> EditResult<()> {
        Err(EditError::unsupported("setPrimaryKey"))
    }

    fn set_transaction_destination_vertex(
        &mut self,
        _transaction: TransactionId,
        _old_destination: VertexId,
        _new_destination: VertexId,
        _reversed: bool,
    ) -> EditResult<()> {
        Err(EditError::unsupported("setTransactionDestinationVertex"))
    }

    fn add_attribute(&mut self, _spec: &AttributeSpec, _attribute: AttributeId) -> EditResult<()> {
        Err(EditError::unsupported("addAttribute"))
    }

    fn remove_attribute(
        &mut self,
        _spec: &AttributeSpec,
        _attribute: AttributeId,
    ) -> EditResult<()> {
        Err(EditError::unsupported("removeAttribute"))
    }

    fn update_attribute_name(
        &mut self,
        _attribute: AttributeId,
        _old_name: &str,
        _new_name: &str,
    ) -> EditResult<()> {
        Err(EditError::unsupported("updateAttributeName"))
    }

    fn update_attribute_description(
        &mut self,
        _attribute: AttributeId,
        _old_description: &str,
        _new_description: &str,
    ) -> EditResult<()> {
        Err(EditError::unsupported("updateAttributeDescription"))
    }

    fn update_attribute_default_value(
        &mut self,
        _attribute: AttributeId,
        _old_default: &Value,
        _new_default: &Value,
    ) -> EditResult<()> {
        Err(EditError::unsupported("updateAttributeDefaultValue"))
    }

    fn set_byte_value(&mut self, _: AttributeId, _: ElementId, _: i8, _: i8) -> EditResult<()> {
        Err(EditError::unsupported("setByteValue"))
    }

    fn set_short_value(&mut self, _: AttributeId, _: ElementId, _: i16, _: i16) -> EditResult<()> {
        Err(EditError::unsupported("setShortValue"))
    }

    fn set_int_value(&mut self, _: AttributeId, _: ElementId, _: i32, _: i32) -> EditResult<()> {
        Err(EditError::unsupported("setIntValue"))
    }

    fn set_long_value(&mut self, _: AttributeId, _: ElementId, _: i64, _: i64) -> EditResult<()> {
        Err(EditError::unsupported("setLongValue"))
    }

    fn set_float_value(&mut self, _: AttributeId, _: ElementId, _: f32, _: f32) -> EditResult<()> {
        Err(EditError::unsupported("setFloatValue"))
    }

    fn set_double_value(&mut self, _: AttributeId, _: ElementId, _: f64, _: f64) -> EditResult<()> {
        Err(EditError::unsupported("setDoubleValue"))
    }

    fn set_boolean_value(
        &mut self,
        _: AttributeId,
        _: ElementId,
        _: bool,
        _: bool,
    ) -> EditResult<()> {
        Err(EditError::unsupported("setBooleanValue"))
    }

    fn set_char_value(&mut self, _: AttributeId, _: ElementId, _: char, _: char) -> EditResult<()> {
        Err(EditError::unsupported("setCharValue"))
    }

    fn set_object_value(
        &mut self,
        _: AttributeId,
        _: ElementId,
        _: &Value,
        _: &Value,
    ) -> EditResult<()> {
        Err(EditError::unsupported("setObjectValue"))
    }

    fn set_attribute_index_type(
        &mut self,
        _: AttributeId,
        _: IndexType,
        _: IndexType,
    ) -> EditResult<()> {
        Err(EditError::unsupported("setAttributeIndexType"))
    }

    fn add_child(&mut self, _child: Arc<dyn GraphEdit>) -> EditResult<()> {
        Err(EditError::unsupported("executeChild"))
    }

    fn execute_graph_operation(&mut self, _operation: Arc<dyn GraphOperation>) -> EditResult<()> {
        Err(EditError::unsupported("executeGraphOperation"))
    }
}
