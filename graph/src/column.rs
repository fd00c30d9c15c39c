//! Typed attribute columns.

use retrace_core::{
    AttributeId, AttributeSpec, ElementId, GraphError, GraphResult, IndexType, NativeType, Value,
};
use std::collections::HashMap;

/// A single stored attribute value in its native representation.
#[derive(Debug, Clone)]
pub enum Cell {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Char(char),
    Object(Value),
}

impl Cell {
    pub fn native_type(&self) -> NativeType {
        match self {
            Cell::Byte(_) => NativeType::Byte,
            Cell::Short(_) => NativeType::Short,
            Cell::Int(_) => NativeType::Int,
            Cell::Long(_) => NativeType::Long,
            Cell::Float(_) => NativeType::Float,
            Cell::Double(_) => NativeType::Double,
            Cell::Boolean(_) => NativeType::Boolean,
            Cell::Char(_) => NativeType::Char,
            Cell::Object(_) => NativeType::Object,
        }
    }

    /// Convert an attribute default into a cell of the given native type.
    /// Defaults that do not fit the type fall back to the type's zero.
    pub fn from_default(native: NativeType, default: &Value) -> Self {
        match native {
            NativeType::Byte => Cell::Byte(default.coerce_int() as i8),
            NativeType::Short => Cell::Short(default.coerce_int() as i16),
            NativeType::Int => Cell::Int(default.coerce_int() as i32),
            NativeType::Long => Cell::Long(default.coerce_int()),
            NativeType::Float => Cell::Float(default.coerce_float() as f32),
            NativeType::Double => Cell::Double(default.coerce_float()),
            NativeType::Boolean => Cell::Boolean(default.coerce_bool()),
            NativeType::Char => Cell::Char(default.coerce_char()),
            NativeType::Object => Cell::Object(default.clone()),
        }
    }

    /// Bitwise equality, so float cells compare by raw bits.
    pub fn same_as(&self, other: &Cell) -> bool {
        match (self, other) {
            (Cell::Byte(a), Cell::Byte(b)) => a == b,
            (Cell::Short(a), Cell::Short(b)) => a == b,
            (Cell::Int(a), Cell::Int(b)) => a == b,
            (Cell::Long(a), Cell::Long(b)) => a == b,
            (Cell::Float(a), Cell::Float(b)) => a.to_bits() == b.to_bits(),
            (Cell::Double(a), Cell::Double(b)) => a.to_bits() == b.to_bits(),
            (Cell::Boolean(a), Cell::Boolean(b)) => a == b,
            (Cell::Char(a), Cell::Char(b)) => a == b,
            (Cell::Object(a), Cell::Object(b)) => a == b,
            _ => false,
        }
    }
}

/// One attribute: its schema plus the values set on live elements.
#[derive(Debug, Clone)]
pub struct Column {
    pub id: AttributeId,
    pub spec: AttributeSpec,
    pub native: NativeType,
    pub index_type: IndexType,
    default: Cell,
    cells: HashMap<ElementId, Cell>,
}

impl Column {
    pub fn new(id: AttributeId, spec: AttributeSpec) -> Self {
        let native = spec.native_type();
        let default = Cell::from_default(native, &spec.default_value);
        Self {
            id,
            spec,
            native,
            index_type: IndexType::None,
            default,
            cells: HashMap::new(),
        }
    }

    pub fn set_default(&mut self, default: Value) {
        self.default = Cell::from_default(self.native, &default);
        self.spec.default_value = default;
    }

    pub fn get(&self, element: ElementId) -> &Cell {
        self.cells.get(&element).unwrap_or(&self.default)
    }

    pub fn is_default(&self, element: ElementId) -> bool {
        self.cells
            .get(&element)
            .map_or(true, |cell| cell.same_as(&self.default))
    }

    pub fn set(&mut self, element: ElementId, cell: Cell) -> GraphResult<()> {
        if cell.native_type() != self.native {
            return Err(GraphError::type_mismatch(
                self.id,
                self.native.name(),
                cell.native_type().name(),
            ));
        }
        self.cells.insert(element, cell);
        Ok(())
    }

    pub fn clear(&mut self, element: ElementId) {
        self.cells.remove(&element);
    }

    /// Elements with an explicitly stored value.
    pub fn elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.cells.keys().copied()
    }
}
