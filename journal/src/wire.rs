//! Persisted form of an edit log.
//!
//! Every section is its i32 count followed by its items. All integers are
//! big-endian:
//!
//! ```text
//! i32 word count,   i16 * words
//! i32 byte count,   i8  * bytes
//! i32 short count,  i16 * shorts
//! i32 int count,    i32 * ints
//! i32 long count,   i64 * longs
//! i32 object count, objects
//! ```
//!
//! Each object starts with an i32 type index. Index 0 is null. An index one
//! past the highest seen so far introduces a new type and is followed by its
//! name as an i32 length and UTF-8 bytes. The payload follows the header and
//! is read back by the reader registered under the type name. Nested edit
//! logs and lists are refused past [`MAX_NESTING`] levels.

use crate::codec::Buffers;
use crate::edit::GraphEdit;
use crate::error::{EditError, EditResult};
use crate::log::{EditLog, EDIT_LOG_TYPE};
use crate::object::{Object, ATTRIBUTE_TYPE, KEYS_TYPE, VALUE_TYPE};
use retrace_core::{AttributeId, AttributeSpec, ElementType, GraphOperation, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Largest count preallocated before any element has been read.
const PREALLOCATE_LIMIT: usize = 4096;

/// Deepest nesting of objects or lists a reader accepts.
pub const MAX_NESTING: usize = 64;

// ==================== Primitives ====================

fn eof(error: io::Error, what: &str) -> EditError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        EditError::truncated(format!("missing {what}"))
    } else {
        EditError::Io(error)
    }
}

fn read_array<const N: usize>(input: &mut dyn Read, what: &str) -> EditResult<[u8; N]> {
    let mut buf = [0u8; N];
    input.read_exact(&mut buf).map_err(|e| eof(e, what))?;
    Ok(buf)
}

pub fn write_u8(out: &mut dyn Write, value: u8) -> io::Result<()> {
    out.write_all(&[value])
}

pub fn read_u8(input: &mut dyn Read) -> EditResult<u8> {
    Ok(read_array::<1>(input, "u8")?[0])
}

pub fn write_i32(out: &mut dyn Write, value: i32) -> io::Result<()> {
    out.write_all(&value.to_be_bytes())
}

pub fn read_i32(input: &mut dyn Read) -> EditResult<i32> {
    Ok(i32::from_be_bytes(read_array(input, "i32")?))
}

pub fn write_i64(out: &mut dyn Write, value: i64) -> io::Result<()> {
    out.write_all(&value.to_be_bytes())
}

pub fn read_i64(input: &mut dyn Read) -> EditResult<i64> {
    Ok(i64::from_be_bytes(read_array(input, "i64")?))
}

fn read_count(input: &mut dyn Read, what: &str) -> EditResult<usize> {
    let count = read_i32(input)?;
    usize::try_from(count)
        .map_err(|_| EditError::invalid_format(format!("negative {what} count {count}")))
}

pub fn write_string(out: &mut dyn Write, value: &str) -> io::Result<()> {
    let len = i32::try_from(value.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
    write_i32(out, len)?;
    out.write_all(value.as_bytes())
}

pub fn read_string(input: &mut dyn Read) -> EditResult<String> {
    let len = read_count(input, "string length")?;
    let mut bytes = Vec::with_capacity(len.min(PREALLOCATE_LIMIT));
    (&mut *input)
        .take(len as u64)
        .read_to_end(&mut bytes)
        .map_err(|e| eof(e, "string"))?;
    if bytes.len() != len {
        return Err(EditError::truncated("missing string bytes"));
    }
    String::from_utf8(bytes).map_err(|e| EditError::invalid_format(e.to_string()))
}

/// Write a value as its tag and payload.
pub fn write_value(out: &mut dyn Write, value: &Value) -> io::Result<()> {
    write_u8(out, value.tag())?;
    match value {
        Value::Null => Ok(()),
        Value::Bool(b) => write_u8(out, *b as u8),
        Value::Int(n) | Value::Timestamp(n) | Value::Duration(n) => write_i64(out, *n),
        Value::Float(f) => write_i64(out, f.to_bits() as i64),
        Value::String(s) => write_string(out, s),
        Value::List(items) => {
            let len = i32::try_from(items.len())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "list too long"))?;
            write_i32(out, len)?;
            items.iter().try_for_each(|item| write_value(out, item))
        }
    }
}

pub fn read_value(input: &mut dyn Read) -> EditResult<Value> {
    read_nested_value(input, 0)
}

fn read_nested_value(input: &mut dyn Read, depth: usize) -> EditResult<Value> {
    let tag = read_u8(input)?;
    let value = match tag {
        0 => Value::Null,
        1 => Value::Bool(read_u8(input)? != 0),
        2 => Value::Int(read_i64(input)?),
        3 => Value::Float(f64::from_bits(read_i64(input)? as u64)),
        4 => Value::String(read_string(input)?),
        5 => Value::Timestamp(read_i64(input)?),
        6 => Value::Duration(read_i64(input)?),
        7 => {
            if depth >= MAX_NESTING {
                return Err(EditError::invalid_format(format!(
                    "lists nested deeper than {MAX_NESTING}"
                )));
            }
            let len = read_count(input, "list")?;
            let mut items = Vec::with_capacity(len.min(PREALLOCATE_LIMIT));
            for _ in 0..len {
                items.push(read_nested_value(input, depth + 1)?);
            }
            Value::List(items)
        }
        other => {
            return Err(EditError::invalid_format(format!("unknown value tag {other}")));
        }
    };
    Ok(value)
}

fn write_keys(out: &mut dyn Write, keys: &[AttributeId]) -> io::Result<()> {
    let len = i32::try_from(keys.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many keys"))?;
    write_i32(out, len)?;
    keys.iter().try_for_each(|key| write_i32(out, key.raw() as i32))
}

fn read_keys(input: &mut dyn Read) -> EditResult<Vec<AttributeId>> {
    let len = read_count(input, "key")?;
    let mut keys = Vec::with_capacity(len.min(PREALLOCATE_LIMIT));
    for _ in 0..len {
        keys.push(AttributeId::new(read_i32(input)? as u32));
    }
    Ok(keys)
}

fn write_attribute(out: &mut dyn Write, spec: &AttributeSpec) -> io::Result<()> {
    write_u8(out, spec.element_type.ordinal())?;
    write_string(out, &spec.attribute_type)?;
    write_string(out, &spec.label)?;
    write_string(out, &spec.description)?;
    write_value(out, &spec.default_value)?;
    match &spec.merger_id {
        Some(merger) => {
            write_u8(out, 1)?;
            write_string(out, merger)
        }
        None => write_u8(out, 0),
    }
}

fn read_attribute(input: &mut dyn Read) -> EditResult<AttributeSpec> {
    let ordinal = read_u8(input)?;
    let element_type =
        ElementType::from_ordinal(ordinal as u32).ok_or(EditError::InvalidOrdinal {
            kind: "element type",
            ordinal: ordinal as i64,
        })?;
    let attribute_type = read_string(input)?;
    let label = read_string(input)?;
    let description = read_string(input)?;
    let default_value = read_value(input)?;
    let merger_id = match read_u8(input)? {
        0 => None,
        _ => Some(read_string(input)?),
    };
    Ok(AttributeSpec {
        element_type,
        attribute_type,
        label,
        description,
        default_value,
        merger_id,
    })
}

// ==================== Object Registry ====================

/// Reads one object payload. The registry is passed along so nested edit
/// logs can resolve their own objects; it carries the nesting depth of the
/// payload being read.
pub type ObjectReader =
    Arc<dyn Fn(&mut dyn Read, &ObjectRegistry) -> EditResult<Object> + Send + Sync>;

/// Maps persisted type names to payload readers.
///
/// A new registry knows values, key lists, attribute specs and nested
/// edit logs. Graph operations and other edit types are registered by the
/// application that defines them.
#[derive(Clone)]
pub struct ObjectRegistry {
    readers: Arc<HashMap<String, ObjectReader>>,
    depth: usize,
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.readers.keys().collect();
        names.sort();
        f.debug_struct("ObjectRegistry")
            .field("types", &names)
            .field("depth", &self.depth)
            .finish()
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            readers: Arc::new(HashMap::new()),
            depth: 0,
        };
        registry.register(VALUE_TYPE, |input, _| Ok(Object::from(read_value(input)?)));
        registry.register(KEYS_TYPE, |input, _| Ok(Object::Keys(read_keys(input)?)));
        registry.register(ATTRIBUTE_TYPE, |input, _| {
            Ok(Object::Attribute(read_attribute(input)?))
        });
        registry.register(EDIT_LOG_TYPE, |input, registry| {
            let log = EditLog::deserialize_with(input, registry)?;
            Ok(Object::Child(Arc::new(log)))
        });
        registry
    }

    /// Register a reader, replacing any reader under the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, read: F)
    where
        F: Fn(&mut dyn Read, &ObjectRegistry) -> EditResult<Object> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.readers).insert(name.into(), Arc::new(read));
    }

    pub fn with_operation<F>(mut self, name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&mut dyn Read) -> EditResult<Arc<dyn GraphOperation>> + Send + Sync + 'static,
    {
        self.register(name, move |input, _| Ok(Object::Operation(read(input)?)));
        self
    }

    pub fn with_edit<F>(mut self, name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&mut dyn Read, &ObjectRegistry) -> EditResult<Arc<dyn GraphEdit>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, move |input, registry| {
            Ok(Object::Child(read(input, registry)?))
        });
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.readers.contains_key(name)
    }

    /// The same readers, one level deeper.
    fn nested(&self) -> EditResult<Self> {
        if self.depth >= MAX_NESTING {
            return Err(EditError::invalid_format(format!(
                "objects nested deeper than {MAX_NESTING}"
            )));
        }
        Ok(Self {
            readers: Arc::clone(&self.readers),
            depth: self.depth + 1,
        })
    }

    fn read(&self, name: &str, input: &mut dyn Read) -> EditResult<Object> {
        let reader = self
            .readers
            .get(name)
            .ok_or_else(|| EditError::unknown_object_type(name))?;
        reader(input, &self.nested()?)
    }
}

fn write_payload(out: &mut dyn Write, object: &Object) -> EditResult<()> {
    match object {
        Object::Null => {}
        Object::Value(value) => write_value(out, value)?,
        Object::Keys(keys) => write_keys(out, keys)?,
        Object::Attribute(spec) => write_attribute(out, spec)?,
        Object::Child(edit) => edit.write_to(out)?,
        Object::Operation(operation) => operation.write_to(out)?,
    }
    Ok(())
}

fn write_count(out: &mut dyn Write, count: usize) -> EditResult<()> {
    let count = i32::try_from(count).map_err(|_| EditError::capacity("section count"))?;
    write_i32(out, count)?;
    Ok(())
}

// ==================== Edit Log ====================

impl EditLog {
    /// Write the finished log.
    pub fn serialize(&self, out: &mut dyn Write) -> EditResult<()> {
        if !self.is_finished() {
            return Err(EditError::NotFinished);
        }
        let buffers = self.buffers();
        let words = self.words();
        write_count(out, words.len())?;
        for word in words {
            out.write_all(&word.to_be_bytes())?;
        }
        write_count(out, buffers.bytes.len())?;
        let bytes: Vec<u8> = buffers.bytes.iter().map(|b| *b as u8).collect();
        out.write_all(&bytes)?;
        write_count(out, buffers.shorts.len())?;
        for value in &buffers.shorts {
            out.write_all(&value.to_be_bytes())?;
        }
        write_count(out, buffers.ints.len())?;
        for value in &buffers.ints {
            out.write_all(&value.to_be_bytes())?;
        }
        write_count(out, buffers.longs.len())?;
        for value in &buffers.longs {
            out.write_all(&value.to_be_bytes())?;
        }

        write_count(out, self.objects().len())?;
        let mut types: HashMap<&str, i32> = HashMap::new();
        for object in self.objects().iter() {
            let Some(name) = object.type_name() else {
                write_i32(out, 0)?;
                continue;
            };
            match types.get(name) {
                Some(index) => write_i32(out, *index)?,
                None => {
                    let index = types.len() as i32 + 1;
                    types.insert(name, index);
                    write_i32(out, index)?;
                    write_string(out, name)?;
                }
            }
            write_payload(out, object)?;
        }
        Ok(())
    }

    /// Read a log using the built-in object types only.
    pub fn deserialize(input: &mut dyn Read) -> EditResult<Self> {
        Self::deserialize_with(input, &ObjectRegistry::new())
    }

    pub fn deserialize_with(input: &mut dyn Read, registry: &ObjectRegistry) -> EditResult<Self> {
        let word_count = read_count(input, "word")?;
        let mut words = Vec::with_capacity(word_count.min(PREALLOCATE_LIMIT));
        for _ in 0..word_count {
            words.push(u16::from_be_bytes(read_array(input, "instruction word")?));
        }
        let mut buffers = Buffers::default();
        for _ in 0..read_count(input, "byte")? {
            buffers.bytes.push(read_array::<1>(input, "byte operand")?[0] as i8);
        }
        for _ in 0..read_count(input, "short")? {
            buffers.shorts.push(i16::from_be_bytes(read_array(input, "short operand")?));
        }
        for _ in 0..read_count(input, "int")? {
            buffers.ints.push(i32::from_be_bytes(read_array(input, "int operand")?));
        }
        for _ in 0..read_count(input, "long")? {
            buffers.longs.push(i64::from_be_bytes(read_array(input, "long operand")?));
        }

        let object_count = read_count(input, "object")?;
        let mut names: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(object_count.min(PREALLOCATE_LIMIT));
        for position in 0..object_count {
            let index = read_i32(input)?;
            let object = if index == 0 {
                Object::Null
            } else {
                let slot = usize::try_from(index).map_err(|_| {
                    EditError::invalid_format(format!("negative type index {index}"))
                })? - 1;
                if slot == names.len() {
                    names.push(read_string(input)?);
                } else if slot > names.len() {
                    return Err(EditError::invalid_format(format!(
                        "type index {index} skips ahead of {} known types",
                        names.len()
                    )));
                }
                registry.read(&names[slot], input)?
            };
            if position == 0 && !matches!(object, Object::Null) {
                return Err(EditError::invalid_format("first object must be null"));
            }
            objects.push(object);
        }
        if objects.is_empty() {
            return Err(EditError::invalid_format("object table is empty"));
        }

        EditLog::from_parts(words, buffers, objects)
    }

    pub fn to_bytes(&self) -> EditResult<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize(&mut out)?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> EditResult<Self> {
        Self::from_bytes_with(bytes, &ObjectRegistry::new())
    }

    /// Read a log from a complete buffer. Trailing bytes are rejected.
    pub fn from_bytes_with(bytes: &[u8], registry: &ObjectRegistry) -> EditResult<Self> {
        let mut input = bytes;
        let log = Self::deserialize_with(&mut input, registry)?;
        if !input.is_empty() {
            return Err(EditError::invalid_format(format!(
                "{} trailing bytes",
                input.len()
            )));
        }
        Ok(log)
    }
}
