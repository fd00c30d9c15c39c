//! Size accounting for finished edit logs.

use crate::catalog::Operation;
use crate::codec::{Buffers, Cursor};
use crate::object::{Object, ObjectTable};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-operation share of a log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindStats {
    /// Stored instruction words
    pub words: usize,
    /// Applications, repeats included
    pub applications: usize,
    /// Operand bytes pushed to the typed buffers
    pub operand_bytes: usize,
}

/// Size and composition of an edit log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditStats {
    pub words: usize,
    pub applications: usize,
    pub bytes: usize,
    pub shorts: usize,
    pub ints: usize,
    pub longs: usize,
    pub objects: usize,
    /// Summed size of the embedded graph operations
    pub graph_operations: usize,
    /// Size of the persisted instruction stream and buffers, headers included
    pub encoded_size: usize,
    pub kinds: BTreeMap<Operation, KindStats>,
}

impl EditStats {
    pub(crate) fn for_log(words: &[u16], buffers: &Buffers, objects: &ObjectTable) -> Self {
        let graph_operations = objects
            .iter()
            .map(|object| match object {
                Object::Operation(operation) => operation.size(),
                _ => 0,
            })
            .sum();
        Self {
            words: words.len(),
            bytes: buffers.bytes.len(),
            shorts: buffers.shorts.len(),
            ints: buffers.ints.len(),
            longs: buffers.longs.len(),
            objects: objects.len(),
            graph_operations,
            // six counts, then the words and the buffers
            encoded_size: 6 * 4 + words.len() * 2 + buffers.byte_size(),
            ..Self::default()
        }
    }

    pub(crate) fn count(
        &mut self,
        operation: Operation,
        applications: u16,
        before: &Cursor,
        after: &Cursor,
    ) {
        let operand_bytes = (after.bytes - before.bytes)
            + (after.shorts - before.shorts) * 2
            + (after.ints - before.ints) * 4
            + (after.longs - before.longs) * 8;
        let kind = self.kinds.entry(operation).or_default();
        kind.words += 1;
        kind.applications += applications as usize;
        kind.operand_bytes += operand_bytes;
        self.applications += applications as usize;
    }

    /// Average encoded bytes per application.
    pub fn bytes_per_edit(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            self.encoded_size as f64 / self.applications as f64
        }
    }

    /// Emit the statistics at debug level.
    pub fn log(&self) {
        debug!(
            words = self.words,
            applications = self.applications,
            bytes = self.bytes,
            shorts = self.shorts,
            ints = self.ints,
            longs = self.longs,
            objects = self.objects,
            graph_operations = self.graph_operations,
            encoded_size = self.encoded_size,
            "edit log stats"
        );
        for (operation, kind) in &self.kinds {
            debug!(
                operation = operation.name(),
                words = kind.words,
                applications = kind.applications,
                operand_bytes = kind.operand_bytes,
                "edit log kind"
            );
        }
    }
}
