//! Generic record-to-attribute-map projection.
//!
//! One routine processes every resource type; the per-type knowledge lives
//! in a declarative table of [`FieldMapping`] rows next to each wire model.

use super::filter::FilterPredicate;
use crate::schema::{narrow_f32, AttrSchema, AttrType, AttrValue, AttributeMap, FloatWidth, SchemaDescriptor};

/// One row of a field-mapping table: which attribute key a record field
/// lands under, and how to pull it out of the record.
///
/// `extract` returns `None` when the source field is absent; the schema's
/// empty-sentinel policy then decides what is stored. Unknown enum values
/// pass through verbatim as strings - extraction never validates.
pub struct FieldMapping<R> {
    pub key: &'static str,
    pub extract: fn(&R) -> Option<AttrValue>,
}

/// Project one record into an attribute map.
///
/// Total and panic-free for any well-typed record: the output contains
/// exactly the keys the schema declares. Absent fields get the per-attribute
/// sentinel, and floats declared 32-bit are narrowed deterministically.
pub fn project<R>(
    record: &R,
    schema: &SchemaDescriptor,
    mappings: &[FieldMapping<R>],
) -> AttributeMap {
    let mut out = AttributeMap::new();
    for attr in schema.attrs() {
        let extracted = mappings
            .iter()
            .find(|m| m.key == attr.key)
            .and_then(|m| (m.extract)(record));
        let value = match extracted {
            Some(value) => coerce(attr, value),
            None => attr.empty_value(),
        };
        out.insert(attr.key.to_string(), value);
    }
    out
}

/// Project a list of records in input order, then drop entries a filter
/// rejects.
///
/// Order is significant downstream and is never changed here; there is no
/// deduplication. Filters run after full projection, so a predicate can
/// reference any projected key, including ones renamed or derived during
/// projection.
pub fn project_list<R>(
    records: &[R],
    schema: &SchemaDescriptor,
    mappings: &[FieldMapping<R>],
    filters: &[FilterPredicate],
) -> Vec<AttributeMap> {
    records
        .iter()
        .map(|record| project(record, schema, mappings))
        .filter(|map| filters.iter().all(|f| f.matches(map)))
        .collect()
}

/// Width coercion demanded by the schema. Everything else passes through.
fn coerce(attr: &AttrSchema, value: AttrValue) -> AttrValue {
    match (&attr.attr_type, value) {
        (AttrType::Float(FloatWidth::F32), AttrValue::Float(v)) => AttrValue::Float(narrow_f32(v)),
        (_, value) => value,
    }
}
