//! Attribute values and schema descriptors.
//!
//! An attribute map is the flat, string-keyed representation of one API
//! record that downstream state handling consumes. A schema descriptor
//! declares which keys may appear in such a map, their types, and how an
//! absent source field is represented.

mod descriptor;
mod value;

pub use descriptor::{
    AttrMode, AttrSchema, AttrType, EmptyPolicy, FloatWidth, SchemaDescriptor, SchemaError,
};
pub use value::{narrow_f32, AttrValue, AttributeMap};
