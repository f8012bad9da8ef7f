//! Post-projection filter predicates.

use crate::schema::AttributeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterParseError {
    #[error("filter `{0}` is not of the form key=value[,value...]")]
    Malformed(String),
}

/// Retain projected entries whose `key` renders to one of `values`.
///
/// Predicates are evaluated against the already-projected attribute map,
/// never against raw records, so any projected key works - including ones
/// that only exist post-projection.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPredicate {
    pub key: String,
    pub values: Vec<String>,
}

impl FilterPredicate {
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    /// Parse the CLI form `key=v1,v2`.
    pub fn parse(spec: &str) -> Result<Self, FilterParseError> {
        let Some((key, raw_values)) = spec.split_once('=') else {
            return Err(FilterParseError::Malformed(spec.to_string()));
        };
        let key = key.trim();
        let values: Vec<String> = raw_values
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if key.is_empty() || values.is_empty() {
            return Err(FilterParseError::Malformed(spec.to_string()));
        }
        Ok(Self::new(key, values))
    }

    /// An entry matches when the named key is present, renders as a scalar,
    /// and that rendering is in the allowed set. Missing keys and
    /// non-scalar values never match.
    pub fn matches(&self, map: &AttributeMap) -> bool {
        map.get(&self.key)
            .and_then(|value| value.render_scalar())
            .map(|rendered| self.values.iter().any(|allowed| *allowed == rendered))
            .unwrap_or(false)
    }
}

/// Apply every predicate in turn; an entry survives only if all match.
pub fn apply_filters(maps: Vec<AttributeMap>, filters: &[FilterPredicate]) -> Vec<AttributeMap> {
    if filters.is_empty() {
        return maps;
    }
    maps.into_iter()
        .filter(|map| filters.iter().all(|f| f.matches(map)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttrValue;

    fn entry(name: &str, state: &str) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert("name".to_string(), AttrValue::str(name));
        map.insert("state".to_string(), AttrValue::str(state));
        map
    }

    #[test]
    fn test_parse_single_value() {
        let f = FilterPredicate::parse("name=x").unwrap();
        assert_eq!(f.key, "name");
        assert_eq!(f.values, vec!["x"]);
    }

    #[test]
    fn test_parse_multiple_values() {
        let f = FilterPredicate::parse("state=RUNNING, STOPPED").unwrap();
        assert_eq!(f.values, vec!["RUNNING", "STOPPED"]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(FilterPredicate::parse("no-equals").is_err());
        assert!(FilterPredicate::parse("=value").is_err());
        assert!(FilterPredicate::parse("key=").is_err());
    }

    #[test]
    fn test_matches_membership() {
        let f = FilterPredicate::new("state", vec!["RUNNING".to_string(), "STOPPED".to_string()]);
        assert!(f.matches(&entry("a", "RUNNING")));
        assert!(f.matches(&entry("a", "STOPPED")));
        assert!(!f.matches(&entry("a", "TERMINATED")));
    }

    #[test]
    fn test_missing_key_never_matches() {
        let f = FilterPredicate::new("zone", vec!["x".to_string()]);
        assert!(!f.matches(&entry("a", "RUNNING")));
    }

    #[test]
    fn test_numeric_values_compare_by_rendering() {
        let f = FilterPredicate::new("gpus", vec!["2".to_string()]);
        let mut map = AttributeMap::new();
        map.insert("gpus".to_string(), AttrValue::Int(2));
        assert!(f.matches(&map));
    }

    #[test]
    fn test_apply_filters_requires_all() {
        let maps = vec![entry("a", "RUNNING"), entry("b", "RUNNING"), entry("a", "STOPPED")];
        let filters = vec![
            FilterPredicate::new("name", vec!["a".to_string()]),
            FilterPredicate::new("state", vec!["RUNNING".to_string()]),
        ];
        let kept = apply_filters(maps, &filters);
        assert_eq!(kept.len(), 1);
    }
}
