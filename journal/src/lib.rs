//! Retrace Journal
//!
//! Compact, replayable edit logs.
//!
//! Responsibilities:
//! - Encode each graph mutation as a 16-bit instruction plus register deltas
//! - Intern values, key lists and nested edits in a per-log object table
//! - Execute a finished log forward and undo it backward
//! - Persist and reload logs through a registry of object readers

pub mod catalog;
pub mod codec;
mod config;
mod edit;
mod error;
mod log;
mod object;
mod recorder;
mod stats;
pub mod wire;

pub use catalog::Operation;
pub use config::EditLogConfig;
pub use edit::{EditSink, GraphEdit};
pub use error::{EditError, EditResult};
pub use log::{EditLog, EDIT_LOG_TYPE};
pub use object::{Object, ObjectTable, ATTRIBUTE_TYPE, KEYS_TYPE, VALUE_TYPE};
pub use recorder::EditRecorder;
pub use stats::{EditStats, KindStats};
pub use wire::{ObjectReader, ObjectRegistry};
