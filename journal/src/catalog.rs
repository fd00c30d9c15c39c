//! The closed catalog of reversible graph mutations.
//!
//! Instruction word layout:
//!
//! ```text
//!  15            7 6   5 4       0
//! +---------------+-----+---------+
//! | operand codes | rep | ordinal |
//! +---------------+-----+---------+
//! ```
//!
//! Operand codes are packed from bit 7 upward in schema order. Each entry
//! declares its operands as `{register, codec}` pairs; the word layout
//! follows from the codec widths.

use crate::codec::{self, Buffers, Codec, Cursor, Register, Registers};
use crate::error::{EditError, EditResult};
use crate::object::ObjectTable;
use retrace_core::{ElementType, GraphWrite, IndexType, TransactionId, Value, VertexId};
use tracing::warn;

pub const ORDINAL_MASK: u16 = 0x1F;
pub const REPEAT_SHIFT: u16 = 5;
pub const REPEAT_MASK: u16 = 0x3;
pub const OPERAND_SHIFT: u16 = 7;
pub const OPERAND_BITS: u16 = 16 - OPERAND_SHIFT;

/// Flag in the id operand of an endpoint update: the graph swapped the
/// endpoints of an undirected transaction.
pub const REVERSED_FLAG: u32 = 0x8000_0000;

/// Every elementary mutation kind, by ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Operation {
    SetPrimaryKey = 0,
    AddVertex,
    RemoveVertex,
    AddDirectedTransaction,
    AddUndirectedTransaction,
    RemoveDirectedTransaction,
    RemoveUndirectedTransaction,
    SetTransactionSourceVertex,
    SetTransactionDestinationVertex,
    AddAttribute,
    RemoveAttribute,
    UpdateAttributeName,
    UpdateAttributeDescription,
    UpdateAttributeDefaultValue,
    SetByteValue,
    SetShortValue,
    SetIntValue,
    SetLongValue,
    SetFloatValue,
    SetDoubleValue,
    SetBooleanTrue,
    SetBooleanFalse,
    SetCharValue,
    SetObjectValue,
    SetObjectValueFromNull,
    SetObjectValueToNull,
    ExecuteChild,
    SetAttributeIndexType,
    ExecuteGraphOperation,
}

impl Operation {
    pub const ALL: [Operation; 29] = [
        Operation::SetPrimaryKey,
        Operation::AddVertex,
        Operation::RemoveVertex,
        Operation::AddDirectedTransaction,
        Operation::AddUndirectedTransaction,
        Operation::RemoveDirectedTransaction,
        Operation::RemoveUndirectedTransaction,
        Operation::SetTransactionSourceVertex,
        Operation::SetTransactionDestinationVertex,
        Operation::AddAttribute,
        Operation::RemoveAttribute,
        Operation::UpdateAttributeName,
        Operation::UpdateAttributeDescription,
        Operation::UpdateAttributeDefaultValue,
        Operation::SetByteValue,
        Operation::SetShortValue,
        Operation::SetIntValue,
        Operation::SetLongValue,
        Operation::SetFloatValue,
        Operation::SetDoubleValue,
        Operation::SetBooleanTrue,
        Operation::SetBooleanFalse,
        Operation::SetCharValue,
        Operation::SetObjectValue,
        Operation::SetObjectValueFromNull,
        Operation::SetObjectValueToNull,
        Operation::ExecuteChild,
        Operation::SetAttributeIndexType,
        Operation::ExecuteGraphOperation,
    ];

    pub fn ordinal(self) -> u16 {
        self as u16
    }

    pub fn from_ordinal(ordinal: u16) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn entry(self) -> &'static OperationEntry {
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }
}

/// One operand slot of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub register: Register,
    pub codec: Codec,
}

const fn operand(register: Register, codec: Codec) -> Operand {
    Operand { register, codec }
}

/// Replays one instruction against a graph, using the registers decoded for it.
pub type Replay = fn(&Registers, &ObjectTable, &mut dyn GraphWrite) -> EditResult<()>;

/// Schema and behaviour of one operation kind.
pub struct OperationEntry {
    pub operation: Operation,
    pub name: &'static str,
    pub operands: &'static [Operand],
    pub execute: Replay,
    pub undo: Replay,
}

impl std::fmt::Debug for OperationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationEntry")
            .field("name", &self.name)
            .field("operands", &self.operands)
            .finish()
    }
}

// ==================== Operand Schemas ====================

const PRIMARY_KEY: &[Operand] = &[
    operand(Register::Attribute, Codec::Small),
    operand(Register::Int, Codec::Small),
    operand(Register::Object, Codec::Sequence),
];
const VERTEX: &[Operand] = &[operand(Register::Id, Codec::Step)];
const TRANSACTION: &[Operand] = &[
    operand(Register::Id, Codec::Step),
    operand(Register::Int, Codec::Small),
    operand(Register::Object, Codec::Sequence),
];
const ENDPOINT: &[Operand] = &[
    operand(Register::Id, Codec::Small),
    operand(Register::Int, Codec::Small),
];
const ATTRIBUTE: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Object, Codec::Sequence),
];
const ATTRIBUTE_UPDATE: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Int, Codec::Small),
    operand(Register::Object, Codec::Sequence),
];
const INT_VALUE: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Id, Codec::Step),
    operand(Register::Int, Codec::Small),
];
const LONG_VALUE: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Id, Codec::Step),
    operand(Register::Long, Codec::Wide),
];
const FLOAT_VALUE: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Id, Codec::Step),
    operand(Register::Float, Codec::Small),
];
const DOUBLE_VALUE: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Id, Codec::Step),
    operand(Register::Double, Codec::Wide),
];
const BOOLEAN_VALUE: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Id, Codec::Step),
];
const OBJECT_VALUE: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Id, Codec::Small),
    operand(Register::Int, Codec::Small),
    operand(Register::Object, Codec::Sequence),
];
const OBJECT_NULL: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Id, Codec::Step),
    operand(Register::Object, Codec::Sequence),
];
const OBJECT_ONLY: &[Operand] = &[operand(Register::Object, Codec::Sequence)];
const INDEX_TYPE: &[Operand] = &[
    operand(Register::Attribute, Codec::Step),
    operand(Register::Int, Codec::Small),
];

const fn entry(
    operation: Operation,
    name: &'static str,
    operands: &'static [Operand],
    execute: Replay,
    undo: Replay,
) -> OperationEntry {
    OperationEntry {
        operation,
        name,
        operands,
        execute,
        undo,
    }
}

#[rustfmt::skip]
const ENTRIES: [OperationEntry; 29] = [
    entry(Operation::SetPrimaryKey, "setPrimaryKey", PRIMARY_KEY, set_primary_key_new, set_primary_key_old),
    entry(Operation::AddVertex, "addVertex", VERTEX, add_vertex, remove_vertex),
    entry(Operation::RemoveVertex, "removeVertex", VERTEX, remove_vertex, add_vertex),
    entry(Operation::AddDirectedTransaction, "addDirectedTransaction", TRANSACTION, add_directed_transaction, remove_transaction),
    entry(Operation::AddUndirectedTransaction, "addUndirectedTransaction", TRANSACTION, add_undirected_transaction, remove_transaction),
    entry(Operation::RemoveDirectedTransaction, "removeDirectedTransaction", TRANSACTION, remove_transaction, add_directed_transaction),
    entry(Operation::RemoveUndirectedTransaction, "removeUndirectedTransaction", TRANSACTION, remove_transaction, add_undirected_transaction),
    entry(Operation::SetTransactionSourceVertex, "setTransactionSourceVertex", ENDPOINT, source_execute, source_undo),
    entry(Operation::SetTransactionDestinationVertex, "setTransactionDestinationVertex", ENDPOINT, destination_execute, destination_undo),
    entry(Operation::AddAttribute, "addAttribute", ATTRIBUTE, add_attribute, remove_attribute),
    entry(Operation::RemoveAttribute, "removeAttribute", ATTRIBUTE, remove_attribute, add_attribute),
    entry(Operation::UpdateAttributeName, "updateAttributeName", ATTRIBUTE_UPDATE, name_new, name_old),
    entry(Operation::UpdateAttributeDescription, "updateAttributeDescription", ATTRIBUTE_UPDATE, description_new, description_old),
    entry(Operation::UpdateAttributeDefaultValue, "updateAttributeDefaultValue", ATTRIBUTE_UPDATE, default_new, default_old),
    entry(Operation::SetByteValue, "setByteValue", INT_VALUE, xor_byte, xor_byte),
    entry(Operation::SetShortValue, "setShortValue", INT_VALUE, xor_short, xor_short),
    entry(Operation::SetIntValue, "setIntValue", INT_VALUE, add_int, sub_int),
    entry(Operation::SetLongValue, "setLongValue", LONG_VALUE, add_long, sub_long),
    entry(Operation::SetFloatValue, "setFloatValue", FLOAT_VALUE, xor_float, xor_float),
    entry(Operation::SetDoubleValue, "setDoubleValue", DOUBLE_VALUE, xor_double, xor_double),
    entry(Operation::SetBooleanTrue, "setBooleanValueTrue", BOOLEAN_VALUE, set_true, set_false),
    entry(Operation::SetBooleanFalse, "setBooleanValueFalse", BOOLEAN_VALUE, set_false, set_true),
    entry(Operation::SetCharValue, "setCharValue", INT_VALUE, xor_char, xor_char),
    entry(Operation::SetObjectValue, "setObjectValue", OBJECT_VALUE, object_new, object_old),
    entry(Operation::SetObjectValueFromNull, "setObjectValueFromNull", OBJECT_NULL, object_new, object_null),
    entry(Operation::SetObjectValueToNull, "setObjectValueToNull", OBJECT_NULL, object_null, object_new),
    entry(Operation::ExecuteChild, "executeChild", OBJECT_ONLY, child_execute, child_undo),
    entry(Operation::SetAttributeIndexType, "setAttributeIndexType", INDEX_TYPE, index_type_execute, index_type_undo),
    entry(Operation::ExecuteGraphOperation, "executeGraphOperation", OBJECT_ONLY, operation_execute, operation_undo),
];

const fn operand_bits(operands: &[Operand]) -> u16 {
    let mut total = 0;
    let mut i = 0;
    while i < operands.len() {
        total += operands[i].codec.width();
        i += 1;
    }
    total
}

// Every schema must fit the word, and entries must sit at their own ordinal.
const _: () = {
    let mut i = 0;
    while i < ENTRIES.len() {
        assert!(operand_bits(ENTRIES[i].operands) <= OPERAND_BITS);
        assert!(ENTRIES[i].operation as usize == i);
        i += 1;
    }
    assert!(ENTRIES.len() <= ORDINAL_MASK as usize + 1);
};

pub static CATALOG: [OperationEntry; 29] = ENTRIES;

// ==================== Word Encoding ====================

/// Encode one application of `operation`, moving each operand register to
/// the matching entry of `values` and pushing the deltas. Returns the
/// instruction word with a zero repeat count.
pub fn encode(
    operation: Operation,
    values: &[i64],
    registers: &mut Registers,
    buffers: &mut Buffers,
) -> u16 {
    let entry = operation.entry();
    debug_assert_eq!(entry.operands.len(), values.len(), "{}", entry.name);
    let mut word = operation.ordinal();
    let mut shift = OPERAND_SHIFT;
    for (operand, value) in entry.operands.iter().zip(values) {
        let code = codec::store(operand.codec, operand.register, *value, registers, buffers);
        word |= code << shift;
        shift += operand.codec.width();
    }
    word
}

/// Split a word into its operation and the number of applications.
pub fn decode_word(word: u16) -> EditResult<(Operation, u16)> {
    let ordinal = word & ORDINAL_MASK;
    let operation =
        Operation::from_ordinal(ordinal).ok_or(EditError::UnknownOperation { ordinal })?;
    let applications = ((word >> REPEAT_SHIFT) & REPEAT_MASK) + 1;
    Ok((operation, applications))
}

fn operand_delta(
    entry: &OperationEntry,
    operand: &Operand,
    word: u16,
    shift: u16,
) -> EditResult<codec::Delta> {
    let code = (word >> shift) & operand.codec.mask();
    operand.codec.decode(code).ok_or(EditError::InvalidOperandCode {
        operation: entry.name,
        code,
    })
}

/// Advance the registers over one application, consuming operands forward.
pub fn read_forward(
    entry: &OperationEntry,
    word: u16,
    registers: &mut Registers,
    cursor: &mut Cursor,
    buffers: &Buffers,
) -> EditResult<()> {
    let mut shift = OPERAND_SHIFT;
    for operand in entry.operands {
        let delta = operand_delta(entry, operand, word, shift)?;
        cursor.apply_forward(buffers, delta, operand.register, registers)?;
        shift += operand.codec.width();
    }
    Ok(())
}

/// Rewind the registers over one application, consuming operands backward.
pub fn read_backward(
    entry: &OperationEntry,
    word: u16,
    registers: &mut Registers,
    cursor: &mut Cursor,
    buffers: &Buffers,
) -> EditResult<()> {
    // Start past the last code and walk down the word.
    let mut shift = OPERAND_SHIFT + operand_bits(entry.operands);
    for operand in entry.operands.iter().rev() {
        shift -= operand.codec.width();
        let delta = operand_delta(entry, operand, word, shift)?;
        cursor.apply_backward(buffers, delta, operand.register, registers)?;
    }
    Ok(())
}

// ==================== Structure ====================

fn warn_on_moved_id(kind: &'static str, recorded: u32, replayed: u32) {
    if recorded != replayed {
        warn!(kind, recorded, replayed, "replayed id differs from recorded id");
    }
}

fn set_primary_key_new(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let element_type = element_type(r)?;
    g.set_primary_key(element_type, o.keys(r.object())?)?;
    Ok(())
}

fn set_primary_key_old(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let element_type = element_type(r)?;
    g.set_primary_key(element_type, o.keys(r.int())?)?;
    Ok(())
}

fn element_type(r: &Registers) -> EditResult<ElementType> {
    let ordinal = r.get(Register::Attribute);
    u32::try_from(ordinal)
        .ok()
        .and_then(ElementType::from_ordinal)
        .ok_or(EditError::InvalidOrdinal {
            kind: "element type",
            ordinal,
        })
}

fn add_vertex(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let vertex = g.add_vertex()?;
    warn_on_moved_id("vertex", r.id() as u32, vertex.raw());
    Ok(())
}

fn remove_vertex(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.remove_vertex(VertexId(r.id() as u32))?;
    Ok(())
}

fn add_transaction(r: &Registers, directed: bool, g: &mut dyn GraphWrite) -> EditResult<()> {
    let source = VertexId(r.object() as u32);
    let destination = VertexId(r.int() as u32);
    let transaction = g.add_transaction(source, destination, directed)?;
    warn_on_moved_id("transaction", r.id() as u32, transaction.raw());
    Ok(())
}

fn add_directed_transaction(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    add_transaction(r, true, g)
}

fn add_undirected_transaction(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    add_transaction(r, false, g)
}

fn remove_transaction(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.remove_transaction(TransactionId(r.id() as u32))?;
    Ok(())
}

fn endpoint_transaction(r: &Registers) -> (TransactionId, bool) {
    let raw = r.id() as u32;
    (TransactionId(raw & !REVERSED_FLAG), raw & REVERSED_FLAG != 0)
}

fn flip(vertex: VertexId, r: &Registers) -> VertexId {
    VertexId(vertex.raw() ^ r.int() as u32)
}

fn source_execute(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (transaction, _) = endpoint_transaction(r);
    let source = g.transaction_source(transaction)?;
    g.set_transaction_source(transaction, flip(source, r))?;
    Ok(())
}

fn source_undo(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    // A swapped undirected transaction carries the moved endpoint as its destination.
    let (transaction, reversed) = endpoint_transaction(r);
    if reversed {
        let destination = g.transaction_destination(transaction)?;
        g.set_transaction_destination(transaction, flip(destination, r))?;
    } else {
        let source = g.transaction_source(transaction)?;
        g.set_transaction_source(transaction, flip(source, r))?;
    }
    Ok(())
}

fn destination_execute(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (transaction, _) = endpoint_transaction(r);
    let destination = g.transaction_destination(transaction)?;
    g.set_transaction_destination(transaction, flip(destination, r))?;
    Ok(())
}

fn destination_undo(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (transaction, reversed) = endpoint_transaction(r);
    if reversed {
        let source = g.transaction_source(transaction)?;
        g.set_transaction_source(transaction, flip(source, r))?;
    } else {
        let destination = g.transaction_destination(transaction)?;
        g.set_transaction_destination(transaction, flip(destination, r))?;
    }
    Ok(())
}

// ==================== Schema ====================

fn add_attribute(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let attribute = g.add_attribute(o.attribute(r.object())?.clone())?;
    warn_on_moved_id("attribute", r.attribute().raw(), attribute.raw());
    Ok(())
}

fn remove_attribute(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.remove_attribute(r.attribute())?;
    Ok(())
}

fn name_new(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.update_attribute_name(r.attribute(), o.string(r.object())?)?;
    Ok(())
}

fn name_old(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.update_attribute_name(r.attribute(), o.string(r.int())?)?;
    Ok(())
}

fn description_new(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.update_attribute_description(r.attribute(), o.string(r.object())?)?;
    Ok(())
}

fn description_old(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.update_attribute_description(r.attribute(), o.string(r.int())?)?;
    Ok(())
}

fn default_new(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.update_attribute_default(r.attribute(), o.value(r.object())?)?;
    Ok(())
}

fn default_old(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.update_attribute_default(r.attribute(), o.value(r.int())?)?;
    Ok(())
}

fn index_type_shift(r: &Registers, g: &mut dyn GraphWrite, sign: i64) -> EditResult<()> {
    let attribute = r.attribute();
    let current = g.attribute_index_type(attribute)?.ordinal() as i64;
    let ordinal = current + sign * r.int() as i64;
    let index_type = u32::try_from(ordinal)
        .ok()
        .and_then(IndexType::from_ordinal)
        .ok_or(EditError::InvalidOrdinal {
            kind: "index type",
            ordinal,
        })?;
    g.set_attribute_index_type(attribute, index_type)?;
    Ok(())
}

fn index_type_execute(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    index_type_shift(r, g, 1)
}

fn index_type_undo(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    index_type_shift(r, g, -1)
}

// ==================== Values ====================

fn xor_byte(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (attribute, element) = (r.attribute(), r.element());
    let current = g.get_byte(attribute, element)?;
    g.set_byte(attribute, element, current ^ r.int() as i8)?;
    Ok(())
}

fn xor_short(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (attribute, element) = (r.attribute(), r.element());
    let current = g.get_short(attribute, element)?;
    g.set_short(attribute, element, current ^ r.int() as i16)?;
    Ok(())
}

fn add_int(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (attribute, element) = (r.attribute(), r.element());
    let current = g.get_int(attribute, element)?;
    g.set_int(attribute, element, current.wrapping_add(r.int()))?;
    Ok(())
}

fn sub_int(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (attribute, element) = (r.attribute(), r.element());
    let current = g.get_int(attribute, element)?;
    g.set_int(attribute, element, current.wrapping_sub(r.int()))?;
    Ok(())
}

fn add_long(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (attribute, element) = (r.attribute(), r.element());
    let current = g.get_long(attribute, element)?;
    g.set_long(attribute, element, current.wrapping_add(r.long()))?;
    Ok(())
}

fn sub_long(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (attribute, element) = (r.attribute(), r.element());
    let current = g.get_long(attribute, element)?;
    g.set_long(attribute, element, current.wrapping_sub(r.long()))?;
    Ok(())
}

fn xor_float(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (attribute, element) = (r.attribute(), r.element());
    let current = g.get_float(attribute, element)?;
    g.set_float(attribute, element, f32::from_bits(current.to_bits() ^ r.float_bits()))?;
    Ok(())
}

fn xor_double(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (attribute, element) = (r.attribute(), r.element());
    let current = g.get_double(attribute, element)?;
    g.set_double(attribute, element, f64::from_bits(current.to_bits() ^ r.double_bits()))?;
    Ok(())
}

fn set_true(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.set_boolean(r.attribute(), r.element(), true)?;
    Ok(())
}

fn set_false(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.set_boolean(r.attribute(), r.element(), false)?;
    Ok(())
}

fn xor_char(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    let (attribute, element) = (r.attribute(), r.element());
    let current = g.get_char(attribute, element)?;
    let code = current as u32 ^ r.int() as u32;
    let next = char::from_u32(code).ok_or(EditError::InvalidChar(code))?;
    g.set_char(attribute, element, next)?;
    Ok(())
}

fn object_new(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.set_object(r.attribute(), r.element(), o.value(r.object())?)?;
    Ok(())
}

fn object_old(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.set_object(r.attribute(), r.element(), o.value(r.int())?)?;
    Ok(())
}

fn object_null(r: &Registers, _: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    g.set_object(r.attribute(), r.element(), Value::Null)?;
    Ok(())
}

// ==================== Nested ====================

fn child_execute(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    o.child(r.object())?.execute(g)
}

fn child_undo(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    o.child(r.object())?.undo(g)
}

fn operation_execute(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    o.operation(r.object())?.execute(g)?;
    Ok(())
}

fn operation_undo(r: &Registers, o: &ObjectTable, g: &mut dyn GraphWrite) -> EditResult<()> {
    o.operation(r.object())?.undo(g)?;
    Ok(())
}
