//! Retrace Transaction
//!
//! Applies mutations to a graph while recording them as a reversible edit.
//!
//! Responsibilities:
//! - Read prior state from the graph before each mutation
//! - Cascade removals so undo restores incident transactions and values
//! - Commit the finished edit, or roll the graph back by undoing it
//! - Collapse add/remove pairs before they reach the sink

mod error;
mod normalizer;
mod recording;

pub use error::{TransactionError, TransactionResult};
pub use normalizer::NormalizingEdit;
pub use recording::{EditTransaction, TransactionState};
