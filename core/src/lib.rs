//! Retrace Core Types
//!
//! This crate provides the foundational types shared by every retrace crate:
//! - Identity types (VertexId, TransactionId, AttributeId, ElementId)
//! - Schema types (ElementType, IndexType, NativeType, AttributeSpec)
//! - The Value enum held by object attributes
//! - The mutation capability (GraphRead, GraphWrite, GraphOperation)
//! - Graph error types

mod attribute;
mod capability;
mod error;
mod id;
mod value;

pub use attribute::*;
pub use capability::*;
pub use error::*;
pub use id::*;
pub use value::*;
