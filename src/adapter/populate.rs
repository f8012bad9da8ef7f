//! The inverse direction: read user-supplied attributes back into an
//! outgoing request object.

use crate::schema::{AttrValue, AttributeMap};
use thiserror::Error;

/// A failed type assertion while reading an attribute map.
///
/// This is a descriptor/request mismatch introduced at development time and
/// fails loudly; it is never downgraded to a default value.
#[derive(Debug, Error, PartialEq)]
pub enum PopulateError {
    #[error("attribute `{key}` expects {expected}, got {found}")]
    TypeMismatch {
        key: &'static str,
        expected: &'static str,
        found: String,
    },
}

/// One row of an inverse mapping table: which attribute key feeds which
/// request field.
///
/// `assign` must store an owned copy into the request - never a borrow of
/// the map's storage - so the request stays valid after the caller mutates
/// or drops the map.
pub struct FieldBinding<Q> {
    pub key: &'static str,
    pub assign: fn(&mut Q, &AttrValue) -> Result<(), PopulateError>,
}

/// Populate a request object from an attribute map.
///
/// A key absent from the map leaves the corresponding request field at its
/// default so the API's own default handling applies. Present keys are
/// type-checked and copied. Business-rule validation does not happen here.
pub fn populate<Q>(
    map: &AttributeMap,
    bindings: &[FieldBinding<Q>],
    request: &mut Q,
) -> Result<(), PopulateError> {
    for binding in bindings {
        if let Some(value) = map.get(binding.key) {
            (binding.assign)(request, value)?;
        }
    }
    Ok(())
}

fn mismatch(key: &'static str, expected: &'static str, value: &AttrValue) -> PopulateError {
    PopulateError::TypeMismatch {
        key,
        expected,
        found: value.type_name().to_string(),
    }
}

/// Assert a string attribute and return an owned copy.
pub fn expect_str(key: &'static str, value: &AttrValue) -> Result<String, PopulateError> {
    match value {
        AttrValue::Str(s) => Ok(s.clone()),
        other => Err(mismatch(key, "string", other)),
    }
}

pub fn expect_int(key: &'static str, value: &AttrValue) -> Result<i64, PopulateError> {
    match value {
        AttrValue::Int(i) => Ok(*i),
        other => Err(mismatch(key, "int", other)),
    }
}

pub fn expect_float(key: &'static str, value: &AttrValue) -> Result<f64, PopulateError> {
    match value {
        AttrValue::Float(f) => Ok(*f),
        other => Err(mismatch(key, "float", other)),
    }
}

pub fn expect_bool(key: &'static str, value: &AttrValue) -> Result<bool, PopulateError> {
    match value {
        AttrValue::Bool(b) => Ok(*b),
        other => Err(mismatch(key, "bool", other)),
    }
}

/// Assert a list of strings and return owned copies.
pub fn expect_str_list(key: &'static str, value: &AttrValue) -> Result<Vec<String>, PopulateError> {
    match value {
        AttrValue::List(items) => items
            .iter()
            .map(|item| expect_str(key, item))
            .collect(),
        other => Err(mismatch(key, "list of string", other)),
    }
}
