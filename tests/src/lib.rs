//! Retrace Integration Tests
//!
//! Scenario harness for end-to-end edit log tests:
//! - Scenarios run named steps, each recorded into its own edit log
//! - Every log is replayed, undone and reloaded from bytes as it is checked
//! - Fixtures and random mutation scripts shared by the test suites

pub mod assertion;
pub mod error;
pub mod fixture;
pub mod runner;
pub mod script;

pub use assertion::{Assertion, AssertionBuilder, ValueCheck};
pub use error::{ScenarioError, ScenarioResult};
pub use runner::Runner;
pub use scenario::{RecordingTransaction, Scenario, Step};

pub mod prelude {
    pub use crate::assertion::AssertionBuilder;
    pub use crate::fixture::{attribute, registry, transaction, vertex, Relabel, Schema};
    pub use crate::scenario::{RecordingTransaction, Scenario};
    pub use crate::script::Mutation;
    pub use retrace_core::{AttributeSpec, ElementType, IndexType, Value};
    pub use retrace_graph::{GraphSnapshot, MemoryGraph, SnapshotValue};
    pub use retrace_journal::{EditLog, Operation};
}
