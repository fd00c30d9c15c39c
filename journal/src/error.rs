//! Edit journal error types.

use retrace_core::GraphError;
use thiserror::Error;

/// Edit journal errors.
#[derive(Debug, Error)]
pub enum EditError {
    /// The graph rejected a replayed mutation.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// IO error while reading or writing a persisted log.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Append or finish on a log that is already finished.
    #[error("edit log is already finished")]
    Finished,

    /// Replay or persistence of a log that is still recording.
    #[error("edit log is not finished")]
    NotFinished,

    /// Mutation kind the sink does not handle.
    #[error("unsupported edit: {operation}")]
    Unsupported { operation: &'static str },

    /// Instruction word with an ordinal outside the catalog.
    #[error("unknown operation ordinal {ordinal}")]
    UnknownOperation { ordinal: u16 },

    /// Operand code outside the codec's range.
    #[error("invalid operand code {code} for {operation}")]
    InvalidOperandCode { operation: &'static str, code: u16 },

    /// A scan needed more operands than the buffer holds.
    #[error("{buffer} buffer exhausted")]
    BufferUnderrun { buffer: &'static str },

    /// Object index outside the object table.
    #[error("object index {index} out of range")]
    ObjectIndex { index: i32 },

    /// Object of the wrong kind for the operation.
    #[error("object {index} is not {expected}")]
    ObjectKind { index: i32, expected: &'static str },

    /// Enum ordinal outside its range.
    #[error("invalid {kind} ordinal {ordinal}")]
    InvalidOrdinal { kind: &'static str, ordinal: i64 },

    /// Character delta that produced an invalid code point.
    #[error("invalid char code point {0:#x}")]
    InvalidChar(u32),

    /// Persisted object type name with no registered reader.
    #[error("unknown object type '{name}'")]
    UnknownObjectType { name: String },

    /// Structurally invalid persisted log.
    #[error("invalid edit log format: {message}")]
    InvalidFormat { message: String },

    /// Index or count that no longer fits its i32 field.
    #[error("{what} exceeds i32 capacity")]
    Capacity { what: &'static str },

    /// Persisted log ended early.
    #[error("truncated edit log: {message}")]
    Truncated { message: String },
}

impl EditError {
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    pub fn underrun(buffer: &'static str) -> Self {
        Self::BufferUnderrun { buffer }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    pub fn capacity(what: &'static str) -> Self {
        Self::Capacity { what }
    }

    pub fn truncated(message: impl Into<String>) -> Self {
        Self::Truncated {
            message: message.into(),
        }
    }

    pub fn unknown_object_type(name: impl Into<String>) -> Self {
        Self::UnknownObjectType { name: name.into() }
    }
}

/// Result type for edit journal operations.
pub type EditResult<T> = Result<T, EditError>;
