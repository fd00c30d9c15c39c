//! Errors reported by a graph when it rejects a mutation.

use crate::{AttributeId, ElementId, TransactionId, VertexId};
use thiserror::Error;

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Vertex not found.
    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Attribute not found.
    #[error("Attribute not found: {0}")]
    AttributeNotFound(AttributeId),

    /// Element row not live for the attribute's element type.
    #[error("Element {element} not found for attribute {attribute}")]
    ElementNotFound {
        attribute: AttributeId,
        element: ElementId,
    },

    /// Cannot remove a vertex while transactions still reference it.
    #[error("Cannot remove vertex {0}: referenced by transactions")]
    VertexHasTransactions(VertexId),

    /// Typed access that does not match the attribute's native type.
    #[error("Type mismatch on {attribute}: expected {expected}, got {actual}")]
    TypeMismatch {
        attribute: AttributeId,
        expected: String,
        actual: String,
    },

    /// Invalid operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl GraphError {
    pub fn type_mismatch(
        attribute: AttributeId,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            attribute,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
