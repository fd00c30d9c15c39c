//! Interned objects referenced by index from the instruction stream.

use crate::edit::GraphEdit;
use crate::error::{EditError, EditResult};
use retrace_core::{AttributeId, AttributeSpec, GraphOperation, Value};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An object stored in an edit log.
///
/// Values, keys and attribute specs compare by value. Child edits and
/// graph operations compare by identity: the same shared instance.
#[derive(Debug, Clone)]
pub enum Object {
    Null,
    Value(Value),
    Keys(Vec<AttributeId>),
    Attribute(AttributeSpec),
    Child(Arc<dyn GraphEdit>),
    Operation(Arc<dyn GraphOperation>),
}

impl Object {
    /// Name the object is persisted under. `None` for null.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Object::Null => None,
            Object::Value(_) => Some(VALUE_TYPE),
            Object::Keys(_) => Some(KEYS_TYPE),
            Object::Attribute(_) => Some(ATTRIBUTE_TYPE),
            Object::Child(edit) => Some(edit.type_name()),
            Object::Operation(operation) => Some(operation.type_name()),
        }
    }
}

pub const VALUE_TYPE: &str = "value";
pub const KEYS_TYPE: &str = "keys";
pub const ATTRIBUTE_TYPE: &str = "attribute";

impl From<Value> for Object {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Object::Null,
            other => Object::Value(other),
        }
    }
}

fn arc_address<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc) as *const () as usize
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Value(a), Object::Value(b)) => a == b,
            (Object::Keys(a), Object::Keys(b)) => a == b,
            (Object::Attribute(a), Object::Attribute(b)) => a == b,
            (Object::Child(a), Object::Child(b)) => arc_address(a) == arc_address(b),
            (Object::Operation(a), Object::Operation(b)) => arc_address(a) == arc_address(b),
            _ => false,
        }
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Object::Null => {}
            Object::Value(value) => value.hash(state),
            Object::Keys(keys) => keys.hash(state),
            Object::Attribute(spec) => spec.hash(state),
            Object::Child(edit) => arc_address(edit).hash(state),
            Object::Operation(operation) => arc_address(operation).hash(state),
        }
    }
}

/// The object buffer of an edit log.
///
/// Index 0 always holds [`Object::Null`]. While recording, an equality
/// index deduplicates pushes; it is dropped when the log is finished.
#[derive(Debug, Clone)]
pub struct ObjectTable {
    objects: Vec<Object>,
    index: Option<HashMap<Object, i32>>,
}

/// Index the next pushed object will take.
fn next_position(len: usize) -> EditResult<i32> {
    i32::try_from(len).map_err(|_| EditError::capacity("object table"))
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTable {
    pub fn new() -> Self {
        Self {
            objects: vec![Object::Null],
            index: Some(HashMap::new()),
        }
    }

    /// A finished table holding exactly these objects.
    pub(crate) fn frozen(objects: Vec<Object>) -> Self {
        Self {
            objects,
            index: None,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.index.is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter()
    }

    /// Return the index of an equal object, pushing it if absent.
    pub fn intern(&mut self, object: Object) -> EditResult<i32> {
        if matches!(object, Object::Null) {
            return Ok(0);
        }
        let index = self.index.as_mut().ok_or(EditError::Finished)?;
        if let Some(existing) = index.get(&object) {
            return Ok(*existing);
        }
        let position = next_position(self.objects.len())?;
        index.insert(object.clone(), position);
        self.objects.push(object);
        Ok(position)
    }

    /// Drop the equality index. The table is read-only afterwards.
    pub fn freeze(&mut self) {
        self.index = None;
        self.objects.shrink_to_fit();
    }

    pub fn get(&self, index: i32) -> EditResult<&Object> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.objects.get(i))
            .ok_or(EditError::ObjectIndex { index })
    }

    fn wrong_kind<T>(index: i32, expected: &'static str) -> EditResult<T> {
        Err(EditError::ObjectKind { index, expected })
    }

    /// A value object; index 0 reads as `Value::Null`.
    pub fn value(&self, index: i32) -> EditResult<Value> {
        match self.get(index)? {
            Object::Null => Ok(Value::Null),
            Object::Value(value) => Ok(value.clone()),
            _ => Self::wrong_kind(index, "a value"),
        }
    }

    pub fn string(&self, index: i32) -> EditResult<String> {
        match self.get(index)? {
            Object::Value(Value::String(s)) => Ok(s.clone()),
            _ => Self::wrong_kind(index, "a string"),
        }
    }

    pub fn keys(&self, index: i32) -> EditResult<&[AttributeId]> {
        match self.get(index)? {
            Object::Keys(keys) => Ok(keys),
            _ => Self::wrong_kind(index, "a key list"),
        }
    }

    pub fn attribute(&self, index: i32) -> EditResult<&AttributeSpec> {
        match self.get(index)? {
            Object::Attribute(spec) => Ok(spec),
            _ => Self::wrong_kind(index, "an attribute"),
        }
    }

    pub fn child(&self, index: i32) -> EditResult<&Arc<dyn GraphEdit>> {
        match self.get(index)? {
            Object::Child(edit) => Ok(edit),
            _ => Self::wrong_kind(index, "a child edit"),
        }
    }

    pub fn operation(&self, index: i32) -> EditResult<&Arc<dyn GraphOperation>> {
        match self.get(index)? {
            Object::Operation(operation) => Ok(operation),
            _ => Self::wrong_kind(index, "a graph operation"),
        }
    }
}
