//! Transaction error types.

use retrace_core::GraphError;
use retrace_journal::EditError;
use thiserror::Error;

/// Transaction errors.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The graph rejected a mutation. Nothing was recorded for it.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The sink rejected a recording, or replay failed.
    #[error("edit error: {0}")]
    Edit(#[from] EditError),

    /// A previous recording failed, so the graph and the edit disagree.
    #[error("transaction is closed")]
    Closed,
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
