//! The edit log: an instruction stream, its operand buffers and objects.

use crate::catalog::{self, Operation, REPEAT_MASK, REPEAT_SHIFT};
use crate::codec::{Buffers, Cursor, Registers};
use crate::config::EditLogConfig;
use crate::edit::GraphEdit;
use crate::error::{EditError, EditResult};
use crate::object::{Object, ObjectTable};
use crate::stats::EditStats;
use retrace_core::GraphWrite;
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, trace, warn};

/// Type name an edit log is persisted under when embedded as a child.
pub const EDIT_LOG_TYPE: &str = "edit-log";

const NO_SCAN: u8 = 0;
const FORWARD: u8 = 1;
const BACKWARD: u8 = 2;

/// A compact, replayable record of graph mutations.
///
/// A log records once, through an [`EditRecorder`](crate::EditRecorder),
/// and is then finished. A finished log is read-only and can be executed
/// and undone any number of times.
#[derive(Debug)]
pub struct EditLog {
    config: EditLogConfig,
    words: Vec<u16>,
    buffers: Buffers,
    objects: ObjectTable,
    /// Live registers while recording; the undo seed once finished.
    registers: Registers,
    /// Last word appended, while it can still absorb repeats.
    current: Option<u16>,
    extra: u16,
    finished: bool,
    last_scan: AtomicU8,
}

impl Default for EditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EditLog {
    pub fn new() -> Self {
        Self::with_config(EditLogConfig::default())
    }

    pub fn with_config(config: EditLogConfig) -> Self {
        let capacity = config.initial_capacity;
        Self {
            words: Vec::with_capacity(capacity),
            buffers: Buffers::with_capacity(capacity),
            objects: ObjectTable::new(),
            registers: Registers::new(),
            current: None,
            extra: 0,
            finished: false,
            last_scan: AtomicU8::new(NO_SCAN),
            config,
        }
    }

    /// Assemble a finished log from its persisted parts.
    pub(crate) fn from_parts(
        words: Vec<u16>,
        buffers: Buffers,
        objects: Vec<Object>,
    ) -> EditResult<Self> {
        let registers = scan_registers(&words, &buffers, |_, _, _, _| {})?;
        Ok(Self {
            config: EditLogConfig::default(),
            words,
            buffers,
            objects: ObjectTable::frozen(objects),
            registers,
            current: None,
            extra: 0,
            finished: true,
            last_scan: AtomicU8::new(NO_SCAN),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Stored instruction words, repeats folded in.
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn buffers(&self) -> &Buffers {
        &self.buffers
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// The register snapshot undo starts from. Meaningful once finished.
    pub fn final_registers(&self) -> &Registers {
        &self.registers
    }

    pub fn config(&self) -> &EditLogConfig {
        &self.config
    }

    fn ensure_recording(&self) -> EditResult<()> {
        if self.finished {
            Err(EditError::Finished)
        } else {
            Ok(())
        }
    }

    fn ensure_finished(&self) -> EditResult<()> {
        if self.finished {
            Ok(())
        } else {
            Err(EditError::NotFinished)
        }
    }

    // ==================== Recording ====================

    /// Append an instruction word, folding it into the previous entry when
    /// identical, up to four applications per entry.
    pub fn append_instruction(&mut self, word: u16) -> EditResult<()> {
        self.ensure_recording()?;
        let word = word & !(REPEAT_MASK << REPEAT_SHIFT);
        match (self.current, self.words.last_mut()) {
            (Some(current), Some(last)) if current == word => {
                self.extra += 1;
                *last = word | (self.extra << REPEAT_SHIFT);
                if self.extra == REPEAT_MASK {
                    self.current = None;
                }
            }
            _ => {
                self.words.push(word);
                self.current = Some(word);
                self.extra = 0;
            }
        }
        Ok(())
    }

    pub fn append_byte(&mut self, value: i8) -> EditResult<()> {
        self.ensure_recording()?;
        self.buffers.bytes.push(value);
        Ok(())
    }

    pub fn append_short(&mut self, value: i16) -> EditResult<()> {
        self.ensure_recording()?;
        self.buffers.shorts.push(value);
        Ok(())
    }

    pub fn append_int(&mut self, value: i32) -> EditResult<()> {
        self.ensure_recording()?;
        self.buffers.ints.push(value);
        Ok(())
    }

    pub fn append_long(&mut self, value: i64) -> EditResult<()> {
        self.ensure_recording()?;
        self.buffers.longs.push(value);
        Ok(())
    }

    /// Intern an object, returning the index of an equal one if present.
    pub fn append_object(&mut self, object: Object) -> EditResult<i32> {
        self.ensure_recording()?;
        self.objects.intern(object)
    }

    /// Encode one application of `operation` and append it.
    pub(crate) fn record(&mut self, operation: Operation, values: &[i64]) -> EditResult<()> {
        self.ensure_recording()?;
        let word = catalog::encode(operation, values, &mut self.registers, &mut self.buffers);
        self.append_instruction(word)
    }

    /// End recording: trim buffers, freeze the object table and keep the
    /// registers as the undo seed.
    pub fn finish(&mut self) -> EditResult<()> {
        self.ensure_recording()?;
        self.words.shrink_to_fit();
        self.buffers.shrink_to_fit();
        self.objects.freeze();
        self.current = None;
        self.finished = true;
        debug!(
            words = self.words.len(),
            bytes = self.buffers.bytes.len(),
            shorts = self.buffers.shorts.len(),
            ints = self.buffers.ints.len(),
            longs = self.buffers.longs.len(),
            objects = self.objects.len(),
            "edit log finished"
        );
        if self.config.log_stats {
            self.stats()?.log();
        }
        Ok(())
    }

    // ==================== Replay ====================

    fn note_scan(&self, direction: u8) {
        let previous = self.last_scan.swap(direction, Ordering::Relaxed);
        if previous == direction {
            warn!(
                direction = if direction == FORWARD { "execute" } else { "undo" },
                "edit log replayed twice in the same direction"
            );
        }
    }

    /// Re-apply every recorded mutation, first to last.
    pub fn execute(&self, graph: &mut dyn GraphWrite) -> EditResult<()> {
        self.ensure_finished()?;
        self.note_scan(FORWARD);
        let mut registers = Registers::new();
        let mut cursor = Cursor::start();
        for &word in &self.words {
            let (operation, applications) = catalog::decode_word(word)?;
            let entry = operation.entry();
            for _ in 0..applications {
                catalog::read_forward(entry, word, &mut registers, &mut cursor, &self.buffers)?;
                trace!(operation = entry.name, "execute");
                (entry.execute)(&registers, &self.objects, graph)?;
            }
        }
        Ok(())
    }

    /// Reverse every recorded mutation, last to first.
    pub fn undo(&self, graph: &mut dyn GraphWrite) -> EditResult<()> {
        self.ensure_finished()?;
        self.note_scan(BACKWARD);
        let mut registers = self.registers;
        let mut cursor = Cursor::end(&self.buffers);
        for &word in self.words.iter().rev() {
            let (operation, applications) = catalog::decode_word(word)?;
            let entry = operation.entry();
            for _ in 0..applications {
                trace!(operation = entry.name, "undo");
                (entry.undo)(&registers, &self.objects, graph)?;
                catalog::read_backward(entry, word, &mut registers, &mut cursor, &self.buffers)?;
            }
        }
        Ok(())
    }

    /// Size and composition of the finished log.
    pub fn stats(&self) -> EditResult<EditStats> {
        self.ensure_finished()?;
        let mut stats = EditStats::for_log(&self.words, &self.buffers, &self.objects);
        scan_registers(&self.words, &self.buffers, |operation, applications, before, after| {
            stats.count(operation, applications, before, after);
        })?;
        Ok(stats)
    }
}

/// Run the registers forward over every instruction without touching a
/// graph. Fails unless every buffer is consumed exactly.
pub(crate) fn scan_registers(
    words: &[u16],
    buffers: &Buffers,
    mut visit: impl FnMut(Operation, u16, &Cursor, &Cursor),
) -> EditResult<Registers> {
    let mut registers = Registers::new();
    let mut cursor = Cursor::start();
    for &word in words {
        let (operation, applications) = catalog::decode_word(word)?;
        let entry = operation.entry();
        let before = cursor;
        for _ in 0..applications {
            catalog::read_forward(entry, word, &mut registers, &mut cursor, buffers)?;
        }
        visit(operation, applications, &before, &cursor);
    }
    if !cursor.is_at_end(buffers) {
        return Err(EditError::invalid_format(
            "operand buffers hold values no instruction reads",
        ));
    }
    Ok(registers)
}

impl GraphEdit for EditLog {
    fn execute(&self, graph: &mut dyn GraphWrite) -> EditResult<()> {
        EditLog::execute(self, graph)
    }

    fn undo(&self, graph: &mut dyn GraphWrite) -> EditResult<()> {
        EditLog::undo(self, graph)
    }

    fn type_name(&self) -> &str {
        EDIT_LOG_TYPE
    }

    fn write_to(&self, out: &mut dyn io::Write) -> EditResult<()> {
        self.serialize(out)
    }
}
