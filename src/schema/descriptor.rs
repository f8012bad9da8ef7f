//! Schema descriptors: the declarative definition of an attribute map.

use super::value::{AttrValue, AttributeMap};
use thiserror::Error;

/// Declared width of a float attribute.
///
/// `F32` marks attributes whose upstream type is a 32-bit float; projection
/// narrows the decoded 64-bit JSON number back through `f32` so the stored
/// value matches what the API actually carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

/// Declared type of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrType {
    Bool,
    Int,
    Float(FloatWidth),
    Str,
    StrList,
    IntList,
    /// Nested block list with an upper bound on items. Singular nested
    /// records use `max_items: 1`.
    Block { max_items: usize },
}

impl AttrType {
    fn name(&self) -> &'static str {
        match self {
            AttrType::Bool => "bool",
            AttrType::Int => "int",
            AttrType::Float(_) => "float",
            AttrType::Str => "string",
            AttrType::StrList => "list of string",
            AttrType::IntList => "list of int",
            AttrType::Block { .. } => "block list",
        }
    }
}

/// Whether an attribute is user-supplied or API-owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMode {
    Required,
    Optional,
    Computed,
}

/// Representation of an absent source field.
///
/// The policy is fixed per attribute so repeated reads of the same record
/// always produce the same map and never flip between representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// Zero scalar: `false`, `0`, `0.0`, `""`.
    Zero,
    /// Empty list (scalar lists and blocks).
    EmptyList,
    /// Explicit null marker.
    Null,
}

/// One attribute declaration.
///
/// Constructed only through the typed constructors below; the field
/// combinations they produce are the only valid ones.
#[derive(Debug, Clone)]
pub struct AttrSchema {
    pub key: &'static str,
    pub attr_type: AttrType,
    pub mode: AttrMode,
    pub empty: EmptyPolicy,
    /// Child descriptor, present exactly for `Block` attributes.
    pub block_schema: Option<SchemaDescriptor>,
}

impl AttrSchema {
    fn scalar(key: &'static str, attr_type: AttrType, mode: AttrMode) -> Self {
        let empty = match attr_type {
            AttrType::StrList | AttrType::IntList => EmptyPolicy::EmptyList,
            _ => EmptyPolicy::Zero,
        };
        Self {
            key,
            attr_type,
            mode,
            empty,
            block_schema: None,
        }
    }

    pub fn required(key: &'static str, attr_type: AttrType) -> Self {
        Self::scalar(key, attr_type, AttrMode::Required)
    }

    pub fn optional(key: &'static str, attr_type: AttrType) -> Self {
        Self::scalar(key, attr_type, AttrMode::Optional)
    }

    pub fn computed(key: &'static str, attr_type: AttrType) -> Self {
        Self::scalar(key, attr_type, AttrMode::Computed)
    }

    /// Nested block attribute carrying its own child schema.
    pub fn block(key: &'static str, max_items: usize, child: SchemaDescriptor) -> Self {
        Self {
            key,
            attr_type: AttrType::Block { max_items },
            mode: AttrMode::Computed,
            empty: EmptyPolicy::EmptyList,
            block_schema: Some(child),
        }
    }

    /// Switch the absent-field representation to an explicit null.
    ///
    /// Used for list attributes where "field absent" and "field present but
    /// empty" are both legitimate, distinguishable states.
    pub fn nullable(mut self) -> Self {
        self.empty = EmptyPolicy::Null;
        self
    }

    /// The sentinel value stored when the source field is absent.
    pub fn empty_value(&self) -> AttrValue {
        match self.empty {
            EmptyPolicy::Null => AttrValue::Null,
            EmptyPolicy::EmptyList => match self.attr_type {
                AttrType::Block { .. } => AttrValue::Blocks(Vec::new()),
                _ => AttrValue::List(Vec::new()),
            },
            EmptyPolicy::Zero => match self.attr_type {
                AttrType::Bool => AttrValue::Bool(false),
                AttrType::Int => AttrValue::Int(0),
                AttrType::Float(_) => AttrValue::Float(0.0),
                AttrType::Str => AttrValue::Str(String::new()),
                AttrType::StrList | AttrType::IntList => AttrValue::List(Vec::new()),
                AttrType::Block { .. } => AttrValue::Blocks(Vec::new()),
            },
        }
    }
}

/// Schema validation failures.
///
/// These indicate a descriptor/mapping mismatch introduced at development
/// time, not a runtime condition to recover from, so they carry enough
/// context to point at the offending attribute directly.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("attribute `{key}` is not declared in schema `{schema}`")]
    UndeclaredKey { schema: String, key: String },
    #[error("required attribute `{key}` is missing from schema `{schema}`")]
    MissingRequired { schema: String, key: String },
    #[error("attribute `{key}` expects {expected}, got {found}")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },
    #[error("block attribute `{key}` allows at most {max} item(s), got {got}")]
    TooManyItems { key: String, max: usize, got: usize },
}

/// The declarative definition of one record type's attribute map.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    name: &'static str,
    attrs: Vec<AttrSchema>,
}

impl SchemaDescriptor {
    pub fn new(name: &'static str, attrs: Vec<AttrSchema>) -> Self {
        Self { name, attrs }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn attrs(&self) -> &[AttrSchema] {
        &self.attrs
    }

    pub fn get(&self, key: &str) -> Option<&AttrSchema> {
        self.attrs.iter().find(|a| a.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attrs.iter().map(|a| a.key)
    }

    /// Check a fully-built attribute map against this descriptor.
    ///
    /// Every key in the map must be declared, every required attribute must
    /// be present, and every value must match its declared type. Block
    /// values are validated recursively against the child schema.
    pub fn validate(&self, map: &AttributeMap) -> Result<(), SchemaError> {
        for key in map.keys() {
            if self.get(key).is_none() {
                return Err(SchemaError::UndeclaredKey {
                    schema: self.name.to_string(),
                    key: key.clone(),
                });
            }
        }

        for attr in &self.attrs {
            let Some(value) = map.get(attr.key) else {
                if attr.mode == AttrMode::Required {
                    return Err(SchemaError::MissingRequired {
                        schema: self.name.to_string(),
                        key: attr.key.to_string(),
                    });
                }
                continue;
            };
            self.check_value(attr, value)?;
        }

        Ok(())
    }

    fn check_value(&self, attr: &AttrSchema, value: &AttrValue) -> Result<(), SchemaError> {
        // Null stands in for any absent non-required attribute.
        if matches!(value, AttrValue::Null) && attr.mode != AttrMode::Required {
            return Ok(());
        }

        let mismatch = || SchemaError::TypeMismatch {
            key: attr.key.to_string(),
            expected: attr.attr_type.name().to_string(),
            found: value.type_name().to_string(),
        };

        match (&attr.attr_type, value) {
            (AttrType::Bool, AttrValue::Bool(_)) => Ok(()),
            (AttrType::Int, AttrValue::Int(_)) => Ok(()),
            (AttrType::Float(_), AttrValue::Float(_)) => Ok(()),
            (AttrType::Str, AttrValue::Str(_)) => Ok(()),
            (AttrType::StrList, AttrValue::List(items)) => {
                if items.iter().all(|i| matches!(i, AttrValue::Str(_))) {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            (AttrType::IntList, AttrValue::List(items)) => {
                if items.iter().all(|i| matches!(i, AttrValue::Int(_))) {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            (AttrType::Block { max_items }, AttrValue::Blocks(blocks)) => {
                if blocks.len() > *max_items {
                    return Err(SchemaError::TooManyItems {
                        key: attr.key.to_string(),
                        max: *max_items,
                        got: blocks.len(),
                    });
                }
                if let Some(child) = &attr.block_schema {
                    for block in blocks {
                        child.validate(block)?;
                    }
                }
                Ok(())
            }
            _ => Err(mismatch()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> SchemaDescriptor {
        SchemaDescriptor::new(
            "sample",
            vec![
                AttrSchema::required("id", AttrType::Str),
                AttrSchema::computed("count", AttrType::Int),
                AttrSchema::computed("ratio", AttrType::Float(FloatWidth::F32)),
                AttrSchema::computed("labels", AttrType::StrList).nullable(),
                AttrSchema::block(
                    "options",
                    1,
                    SchemaDescriptor::new(
                        "sample_options",
                        vec![AttrSchema::computed("min", AttrType::Int)],
                    ),
                ),
            ],
        )
    }

    fn valid_map() -> AttributeMap {
        let mut inner = AttributeMap::new();
        inner.insert("min".to_string(), AttrValue::Int(1));

        let mut map = AttributeMap::new();
        map.insert("id".to_string(), AttrValue::str("ocid1.thing.oc1..abcd1234"));
        map.insert("count".to_string(), AttrValue::Int(2));
        map.insert("ratio".to_string(), AttrValue::Float(0.5));
        map.insert("labels".to_string(), AttrValue::List(vec![AttrValue::str("a")]));
        map.insert("options".to_string(), AttrValue::Blocks(vec![inner]));
        map
    }

    #[test]
    fn test_valid_map_passes() {
        assert_eq!(sample_schema().validate(&valid_map()), Ok(()));
    }

    #[test]
    fn test_undeclared_key_rejected() {
        let mut map = valid_map();
        map.insert("bogus".to_string(), AttrValue::Int(1));
        let err = sample_schema().validate(&map).unwrap_err();
        assert!(matches!(err, SchemaError::UndeclaredKey { .. }));
    }

    #[test]
    fn test_missing_required_rejected() {
        let mut map = valid_map();
        map.remove("id");
        let err = sample_schema().validate(&map).unwrap_err();
        assert!(matches!(err, SchemaError::MissingRequired { .. }));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut map = valid_map();
        map.insert("count".to_string(), AttrValue::str("two"));
        let err = sample_schema().validate(&map).unwrap_err();
        assert_eq!(
            err,
            SchemaError::TypeMismatch {
                key: "count".to_string(),
                expected: "int".to_string(),
                found: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_block_cardinality_enforced() {
        let mut inner = AttributeMap::new();
        inner.insert("min".to_string(), AttrValue::Int(1));
        let mut map = valid_map();
        map.insert(
            "options".to_string(),
            AttrValue::Blocks(vec![inner.clone(), inner]),
        );
        let err = sample_schema().validate(&map).unwrap_err();
        assert!(matches!(err, SchemaError::TooManyItems { max: 1, got: 2, .. }));
    }

    #[test]
    fn test_nested_block_validated_recursively() {
        let mut inner = AttributeMap::new();
        inner.insert("min".to_string(), AttrValue::str("one"));
        let mut map = valid_map();
        map.insert("options".to_string(), AttrValue::Blocks(vec![inner]));
        let err = sample_schema().validate(&map).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn test_null_accepted_for_optional_attrs() {
        let mut map = valid_map();
        map.insert("labels".to_string(), AttrValue::Null);
        assert_eq!(sample_schema().validate(&map), Ok(()));
    }

    #[test]
    fn test_empty_sentinels_follow_policy() {
        let schema = sample_schema();
        assert_eq!(
            schema.get("count").unwrap().empty_value(),
            AttrValue::Int(0)
        );
        assert_eq!(schema.get("labels").unwrap().empty_value(), AttrValue::Null);
        assert_eq!(
            schema.get("options").unwrap().empty_value(),
            AttrValue::Blocks(Vec::new())
        );
    }
}
