//! Retrace Graph Storage
//!
//! This crate provides an in-memory graph implementing the mutation
//! capability that edit logs replay against:
//! - Vertex and transaction storage with id reuse
//! - Typed attribute columns with defaults
//! - Adjacency index: find transactions touching a vertex
//! - Snapshots for comparing observable state

mod column;
mod graph;
mod index;
mod snapshot;

pub use column::Cell;
pub use graph::*;
pub use snapshot::*;
