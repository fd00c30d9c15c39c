//! Id allocation and adjacency lookups.

use retrace_core::{TransactionId, VertexId};
use std::collections::{BTreeSet, HashMap};

/// Id allocator that reuses freed ids, most recently freed first.
///
/// Replaying a removal backwards re-adds the element through the normal
/// add path, so the id handed out must be the one just freed.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: u32,
    free: Vec<u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> u32 {
        match self.free.pop() {
            Some(id) => id,
            None => {
                let id = self.next;
                self.next += 1;
                id
            }
        }
    }

    pub fn release(&mut self, id: u32) {
        self.free.push(id);
    }

    /// One past the highest id ever handed out.
    pub fn capacity(&self) -> u32 {
        self.next
    }
}

/// Adjacency index: VertexId -> transactions touching it (either end).
#[derive(Debug, Default, Clone)]
pub struct AdjacencyIndex {
    incident: HashMap<VertexId, BTreeSet<TransactionId>>,
}

impl AdjacencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, transaction: TransactionId, source: VertexId, destination: VertexId) {
        self.incident.entry(source).or_default().insert(transaction);
        self.incident.entry(destination).or_default().insert(transaction);
    }

    pub fn remove(&mut self, transaction: TransactionId, source: VertexId, destination: VertexId) {
        for vertex in [source, destination] {
            if let Some(set) = self.incident.get_mut(&vertex) {
                set.remove(&transaction);
                if set.is_empty() {
                    self.incident.remove(&vertex);
                }
            }
        }
    }

    pub fn transactions_of(&self, vertex: VertexId) -> impl Iterator<Item = TransactionId> + '_ {
        self.incident
            .get(&vertex)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn has_transactions(&self, vertex: VertexId) -> bool {
        self.incident.contains_key(&vertex)
    }
}
