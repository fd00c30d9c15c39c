//! Attribute schema types.
//!
//! An attribute is a typed column attached to one element type. The
//! attribute type name decides the native storage of its values.

use crate::Value;
use std::fmt;

/// The kind of element an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ElementType {
    Meta = 0,
    Graph = 1,
    Vertex = 2,
    Link = 3,
    Edge = 4,
    Transaction = 5,
}

impl ElementType {
    pub const ALL: [ElementType; 6] = [
        ElementType::Meta,
        ElementType::Graph,
        ElementType::Vertex,
        ElementType::Link,
        ElementType::Edge,
        ElementType::Transaction,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Look up an element type by ordinal. Out-of-range ordinals yield `None`.
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Meta => "meta",
            ElementType::Graph => "graph",
            ElementType::Vertex => "vertex",
            ElementType::Link => "link",
            ElementType::Edge => "edge",
            ElementType::Transaction => "transaction",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How values of an attribute are indexed by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum IndexType {
    #[default]
    None = 0,
    Unordered = 1,
    Ordered = 2,
}

impl IndexType {
    pub const ALL: [IndexType; 3] = [IndexType::None, IndexType::Unordered, IndexType::Ordered];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }
}

/// Native storage of an attribute's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
    Object,
}

impl NativeType {
    /// Resolve the native type for an attribute type name.
    ///
    /// Any name that is not a primitive is stored as an object.
    pub fn for_attribute_type(attribute_type: &str) -> Self {
        match attribute_type {
            "byte" => NativeType::Byte,
            "short" => NativeType::Short,
            "int" | "integer" => NativeType::Int,
            "long" => NativeType::Long,
            "float" => NativeType::Float,
            "double" => NativeType::Double,
            "boolean" | "bool" => NativeType::Boolean,
            "char" => NativeType::Char,
            _ => NativeType::Object,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NativeType::Byte => "byte",
            NativeType::Short => "short",
            NativeType::Int => "int",
            NativeType::Long => "long",
            NativeType::Float => "float",
            NativeType::Double => "double",
            NativeType::Boolean => "boolean",
            NativeType::Char => "char",
            NativeType::Object => "object",
        }
    }
}

/// Everything needed to create an attribute, and everything needed to
/// recreate it after removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSpec {
    pub element_type: ElementType,
    pub attribute_type: String,
    pub label: String,
    pub description: String,
    pub default_value: Value,
    pub merger_id: Option<String>,
}

impl AttributeSpec {
    /// Create a spec with an empty description, no default and no merger.
    pub fn new(
        element_type: ElementType,
        attribute_type: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            element_type,
            attribute_type: attribute_type.into(),
            label: label.into(),
            description: String::new(),
            default_value: Value::Null,
            merger_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, default_value: impl Into<Value>) -> Self {
        self.default_value = default_value.into();
        self
    }

    pub fn with_merger(mut self, merger_id: impl Into<String>) -> Self {
        self.merger_id = Some(merger_id.into());
        self
    }

    pub fn native_type(&self) -> NativeType {
        NativeType::for_attribute_type(&self.attribute_type)
    }
}
