//! Rolling registers and operand codecs.
//!
//! Every operand of an instruction moves one register from its previous
//! value to a new one. The operand code stored in the instruction word says
//! how the delta between the two was stored: not at all (unchanged, +1, -1)
//! or pushed to one of the typed buffers. Because every code is a delta, a
//! backward scan recovers the previous register value by subtracting it.

use crate::error::{EditError, EditResult};
use retrace_core::{AttributeId, ElementId};

/// The rolling registers carried from one instruction to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    Attribute = 0,
    Id = 1,
    Int = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    Object = 6,
}

impl Register {
    pub const COUNT: usize = 7;

    /// 64-bit registers; all others wrap at 32 bits.
    pub const fn is_wide(self) -> bool {
        matches!(self, Register::Long | Register::Double)
    }
}

/// Current value of every register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers {
    values: [i64; Register::COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, register: Register) -> i64 {
        self.values[register as usize]
    }

    /// Set a register, truncating 32-bit registers to their width.
    pub fn set(&mut self, register: Register, value: i64) {
        self.values[register as usize] = if register.is_wide() {
            value
        } else {
            value as i32 as i64
        };
    }

    /// Wrapping difference `value - register` in the register's width.
    pub fn delta_to(&self, register: Register, value: i64) -> i64 {
        let current = self.get(register);
        if register.is_wide() {
            value.wrapping_sub(current)
        } else {
            (value as i32).wrapping_sub(current as i32) as i64
        }
    }

    pub fn add(&mut self, register: Register, delta: i64) {
        let current = self.get(register);
        self.set(register, current.wrapping_add(delta));
    }

    pub fn sub(&mut self, register: Register, delta: i64) {
        let current = self.get(register);
        self.set(register, current.wrapping_sub(delta));
    }

    pub fn attribute(&self) -> AttributeId {
        AttributeId(self.get(Register::Attribute) as i32 as u32)
    }

    /// The id register, including any flag in the sign bit.
    pub fn id(&self) -> i32 {
        self.get(Register::Id) as i32
    }

    /// The id register as an element row.
    pub fn element(&self) -> ElementId {
        ElementId(self.id() as u32)
    }

    pub fn int(&self) -> i32 {
        self.get(Register::Int) as i32
    }

    pub fn long(&self) -> i64 {
        self.get(Register::Long)
    }

    pub fn float_bits(&self) -> u32 {
        self.get(Register::Float) as i32 as u32
    }

    pub fn double_bits(&self) -> u64 {
        self.get(Register::Double) as u64
    }

    pub fn object(&self) -> i32 {
        self.get(Register::Object) as i32
    }
}

/// How a delta is represented for one operand code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// Register unchanged.
    Zero,
    PlusOne,
    MinusOne,
    /// Delta pushed to the byte buffer.
    Byte,
    /// Delta pushed to the short buffer.
    Short,
    /// Delta pushed to the int buffer.
    Int,
    /// Delta pushed to the long buffer.
    Long,
}

impl Delta {
    fn represents(self, delta: i64) -> bool {
        match self {
            Delta::Zero => delta == 0,
            Delta::PlusOne => delta == 1,
            Delta::MinusOne => delta == -1,
            Delta::Byte => delta == delta as i8 as i64,
            Delta::Short => delta == delta as i16 as i64,
            Delta::Int => delta == delta as i32 as i64,
            Delta::Long => true,
        }
    }
}

const SMALL: &[Delta] = &[Delta::Zero, Delta::Byte, Delta::Short, Delta::Int];
const STEP: &[Delta] = &[
    Delta::Zero,
    Delta::PlusOne,
    Delta::MinusOne,
    Delta::Byte,
    Delta::Short,
    Delta::Int,
];
const SEQUENCE: &[Delta] = &[Delta::Zero, Delta::PlusOne, Delta::Short, Delta::Int];
const WIDE: &[Delta] = &[Delta::Zero, Delta::Byte, Delta::Int, Delta::Long];

/// An operand encoding: a table from operand code to delta representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Arbitrary 32-bit values that are often unchanged.
    Small,
    /// Ids that tend to move by one in either direction.
    Step,
    /// Indices that tend to grow by one.
    Sequence,
    /// Arbitrary 64-bit values.
    Wide,
}

impl Codec {
    /// Bits the operand code occupies in the instruction word.
    pub const fn width(self) -> u16 {
        match self {
            Codec::Step => 3,
            Codec::Small | Codec::Sequence | Codec::Wide => 2,
        }
    }

    pub const fn table(self) -> &'static [Delta] {
        match self {
            Codec::Small => SMALL,
            Codec::Step => STEP,
            Codec::Sequence => SEQUENCE,
            Codec::Wide => WIDE,
        }
    }

    pub fn mask(self) -> u16 {
        (1 << self.width()) - 1
    }

    /// First code able to represent the delta.
    fn choose(self, delta: i64) -> (u16, Delta) {
        let table = self.table();
        for (code, kind) in table.iter().enumerate() {
            if kind.represents(delta) {
                return (code as u16, *kind);
            }
        }
        // Every table ends in a representation wide enough for its registers.
        (table.len() as u16 - 1, table[table.len() - 1])
    }

    pub fn decode(self, code: u16) -> Option<Delta> {
        self.table().get(code as usize).copied()
    }
}

/// The four typed operand buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffers {
    pub bytes: Vec<i8>,
    pub shorts: Vec<i16>,
    pub ints: Vec<i32>,
    pub longs: Vec<i64>,
}

impl Buffers {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            shorts: Vec::with_capacity(capacity),
            ints: Vec::with_capacity(capacity),
            longs: Vec::with_capacity(capacity),
        }
    }

    pub fn shrink_to_fit(&mut self) {
        self.bytes.shrink_to_fit();
        self.shorts.shrink_to_fit();
        self.ints.shrink_to_fit();
        self.longs.shrink_to_fit();
    }

    /// Encoded size of the buffer contents in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len() + self.shorts.len() * 2 + self.ints.len() * 4 + self.longs.len() * 8
    }

    fn push(&mut self, kind: Delta, delta: i64) {
        match kind {
            Delta::Byte => self.bytes.push(delta as i8),
            Delta::Short => self.shorts.push(delta as i16),
            Delta::Int => self.ints.push(delta as i32),
            Delta::Long => self.longs.push(delta),
            Delta::Zero | Delta::PlusOne | Delta::MinusOne => {}
        }
    }
}

/// Move `register` to `value`, storing the delta, and return the operand code.
pub fn store(
    codec: Codec,
    register: Register,
    value: i64,
    registers: &mut Registers,
    buffers: &mut Buffers,
) -> u16 {
    let delta = registers.delta_to(register, value);
    let (code, kind) = codec.choose(delta);
    buffers.push(kind, delta);
    registers.set(register, value);
    code
}

/// Read positions into the operand buffers during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub bytes: usize,
    pub shorts: usize,
    pub ints: usize,
    pub longs: usize,
}

impl Cursor {
    pub fn start() -> Self {
        Self::default()
    }

    pub fn end(buffers: &Buffers) -> Self {
        Self {
            bytes: buffers.bytes.len(),
            shorts: buffers.shorts.len(),
            ints: buffers.ints.len(),
            longs: buffers.longs.len(),
        }
    }

    pub fn is_at_end(&self, buffers: &Buffers) -> bool {
        *self == Self::end(buffers)
    }

    fn next(&mut self, buffers: &Buffers, kind: Delta) -> EditResult<i64> {
        fn take<T: Copy + Into<i64>>(buf: &[T], pos: &mut usize, name: &'static str) -> EditResult<i64> {
            let value = buf.get(*pos).copied().ok_or(EditError::underrun(name))?;
            *pos += 1;
            Ok(value.into())
        }
        match kind {
            Delta::Zero => Ok(0),
            Delta::PlusOne => Ok(1),
            Delta::MinusOne => Ok(-1),
            Delta::Byte => take(&buffers.bytes, &mut self.bytes, "byte"),
            Delta::Short => take(&buffers.shorts, &mut self.shorts, "short"),
            Delta::Int => take(&buffers.ints, &mut self.ints, "int"),
            Delta::Long => take(&buffers.longs, &mut self.longs, "long"),
        }
    }

    fn prev(&mut self, buffers: &Buffers, kind: Delta) -> EditResult<i64> {
        fn take<T: Copy + Into<i64>>(buf: &[T], pos: &mut usize, name: &'static str) -> EditResult<i64> {
            let index = pos.checked_sub(1).ok_or(EditError::underrun(name))?;
            let value = buf.get(index).copied().ok_or(EditError::underrun(name))?;
            *pos = index;
            Ok(value.into())
        }
        match kind {
            Delta::Zero => Ok(0),
            Delta::PlusOne => Ok(1),
            Delta::MinusOne => Ok(-1),
            Delta::Byte => take(&buffers.bytes, &mut self.bytes, "byte"),
            Delta::Short => take(&buffers.shorts, &mut self.shorts, "short"),
            Delta::Int => take(&buffers.ints, &mut self.ints, "int"),
            Delta::Long => take(&buffers.longs, &mut self.longs, "long"),
        }
    }

    /// Apply one operand forward: read its delta and add it to the register.
    pub fn apply_forward(
        &mut self,
        buffers: &Buffers,
        kind: Delta,
        register: Register,
        registers: &mut Registers,
    ) -> EditResult<()> {
        let delta = self.next(buffers, kind)?;
        registers.add(register, delta);
        Ok(())
    }

    /// Apply one operand backward: read its delta from the end and subtract it.
    pub fn apply_backward(
        &mut self,
        buffers: &Buffers,
        kind: Delta,
        register: Register,
        registers: &mut Registers,
    ) -> EditResult<()> {
        let delta = self.prev(buffers, kind)?;
        registers.sub(register, delta);
        Ok(())
    }
}
