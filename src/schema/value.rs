//! The tagged value type stored in attribute maps.

use serde::Serialize;
use std::collections::BTreeMap;

/// One projected record: attribute key to value.
///
/// A `BTreeMap` keeps iteration and serialization deterministic, which the
/// projection contract (structural equality of repeated projections)
/// depends on.
pub type AttributeMap = BTreeMap<String, AttrValue>;

/// A value held under one attribute key.
///
/// Nested records never appear as bare maps: a logically-singular nested
/// object is stored as a one-element [`AttrValue::Blocks`] list, matching
/// the block-list convention of the consuming schema engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// List of scalars, order-preserving. An empty source list stays an
    /// empty list; it is distinct from an absent field.
    List(Vec<AttrValue>),
    /// Nested block list. Singular nested records are wrapped as one block.
    Blocks(Vec<AttributeMap>),
}

impl AttrValue {
    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Null => "null",
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::List(_) => "list",
            AttrValue::Blocks(_) => "blocks",
        }
    }

    /// Render a scalar value the way filters compare it.
    ///
    /// Lists, blocks, and null have no scalar rendering and return `None`.
    pub fn render_scalar(&self) -> Option<String> {
        match self {
            AttrValue::Bool(b) => Some(b.to_string()),
            AttrValue::Int(i) => Some(i.to_string()),
            AttrValue::Float(f) => Some(f.to_string()),
            AttrValue::Str(s) => Some(s.clone()),
            AttrValue::Null | AttrValue::List(_) | AttrValue::Blocks(_) => None,
        }
    }

    pub fn str(value: impl Into<String>) -> Self {
        AttrValue::Str(value.into())
    }
}

/// Deterministic 64-to-32-bit float narrowing.
///
/// The round trip through `f32` uses IEEE-754 round-to-nearest-even, so the
/// result is identical across platforms and repeated calls. Attributes
/// declared 32-bit wide store exactly this narrowed value.
pub fn narrow_f32(value: f64) -> f64 {
    f64::from(value as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scalar() {
        assert_eq!(AttrValue::str("x").render_scalar(), Some("x".to_string()));
        assert_eq!(AttrValue::Int(3).render_scalar(), Some("3".to_string()));
        assert_eq!(AttrValue::Bool(true).render_scalar(), Some("true".to_string()));
        assert_eq!(AttrValue::Null.render_scalar(), None);
        assert_eq!(AttrValue::List(vec![]).render_scalar(), None);
    }

    #[test]
    fn test_narrowing_is_stable() {
        let v = 3.14159265;
        assert_eq!(narrow_f32(v), narrow_f32(v));
        assert_eq!(narrow_f32(v), f64::from(3.14159265_f64 as f32));
        // Values exactly representable in f32 survive unchanged
        assert_eq!(narrow_f32(64.0), 64.0);
        assert_eq!(narrow_f32(0.0), 0.0);
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let mut map = AttributeMap::new();
        map.insert("name".to_string(), AttrValue::str("VM.Standard2.1"));
        map.insert("gpus".to_string(), AttrValue::Int(0));
        map.insert("tags".to_string(), AttrValue::Null);

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["name"], "VM.Standard2.1");
        assert_eq!(json["gpus"], 0);
        assert!(json["tags"].is_null());
    }
}
