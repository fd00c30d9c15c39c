//! Error types for the scenario harness.

use retrace_core::GraphError;
use retrace_journal::EditError;
use retrace_transaction::TransactionError;
use thiserror::Error;

/// Errors raised while running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("step '{step}': {source}")]
    Transaction {
        step: String,
        #[source]
        source: TransactionError,
    },

    #[error("step '{step}': {source}")]
    Edit {
        step: String,
        #[source]
        source: EditError,
    },

    #[error("step '{step}': {source}")]
    Graph {
        step: String,
        #[source]
        source: GraphError,
    },

    #[error("step '{step}': assertion failed: {message}")]
    AssertionFailed { step: String, message: String },

    #[error("step '{step}': {phase} diverged from the recorded graph")]
    ReplayDiverged { step: String, phase: &'static str },
}

impl ScenarioError {
    pub fn transaction(step: &str, source: TransactionError) -> Self {
        Self::Transaction {
            step: step.to_string(),
            source,
        }
    }

    pub fn edit(step: &str, source: EditError) -> Self {
        Self::Edit {
            step: step.to_string(),
            source,
        }
    }

    pub fn graph(step: &str, source: GraphError) -> Self {
        Self::Graph {
            step: step.to_string(),
            source,
        }
    }

    pub fn assertion_failed(step: &str, message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            step: step.to_string(),
            message: message.into(),
        }
    }

    pub fn diverged(step: &str, phase: &'static str) -> Self {
        Self::ReplayDiverged {
            step: step.to_string(),
            phase,
        }
    }
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
