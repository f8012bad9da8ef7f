//! Resource Registry
//!
//! The explicit catalog of supported resource types. A `Registry` is an
//! owned value built once at startup and passed to whatever needs it -
//! there is no global state and no import-time side effects, so tests can
//! build a registry of their own without touching process-wide statics.

use crate::schema::SchemaDescriptor;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("resource `{key}` declares id attribute `{id_attr}` that its schema does not")]
    UnknownIdAttr { key: &'static str, id_attr: &'static str },
    #[error("resource `{key}` sweep-depends on unknown resource `{dep}`")]
    UnknownDependency { key: &'static str, dep: &'static str },
    #[error("sweep dependency cycle involving `{key}`")]
    DependencyCycle { key: &'static str },
}

/// Definition of one supported resource type.
#[derive(Debug, Clone)]
pub struct ResourceDef {
    /// Stable lookup key, e.g. `core_instances`.
    pub key: &'static str,
    pub display_name: &'static str,
    /// Attribute holding the resource identifier in projected maps.
    pub id_attr: &'static str,
    pub schema: SchemaDescriptor,
    /// Whether the sweeper knows how to delete leftovers of this type.
    pub sweepable: bool,
    /// Resources that must be swept before this one (children first).
    pub sweep_depends_on: &'static [&'static str],
}

/// The resource catalog.
pub struct Registry {
    resources: BTreeMap<&'static str, ResourceDef>,
}

impl Registry {
    /// Build the built-in catalog of core resources.
    pub fn core() -> Self {
        let defs = vec![
            ResourceDef {
                key: "core_shapes",
                display_name: "Compute Shapes",
                id_attr: "name",
                schema: super::shapes::schema(),
                sweepable: false,
                sweep_depends_on: &[],
            },
            ResourceDef {
                key: "core_instances",
                display_name: "Compute Instances",
                id_attr: "id",
                schema: super::instances::schema(),
                sweepable: true,
                sweep_depends_on: &[],
            },
            ResourceDef {
                key: "core_subnets",
                display_name: "Subnets",
                id_attr: "id",
                schema: super::network::subnet_schema(),
                sweepable: true,
                sweep_depends_on: &["core_instances"],
            },
            ResourceDef {
                key: "core_vcns",
                display_name: "Virtual Cloud Networks",
                id_attr: "id",
                schema: super::network::vcn_schema(),
                sweepable: true,
                sweep_depends_on: &["core_subnets"],
            },
        ];

        let mut resources = BTreeMap::new();
        for def in defs {
            resources.insert(def.key, def);
        }
        Self { resources }
    }

    pub fn get(&self, key: &str) -> Option<&ResourceDef> {
        self.resources.get(key)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceDef> {
        self.resources.values()
    }

    /// Check internal consistency: id attributes exist in their schemas and
    /// dependency edges point at known resources.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for def in self.resources.values() {
            if def.schema.get(def.id_attr).is_none() {
                return Err(RegistryError::UnknownIdAttr {
                    key: def.key,
                    id_attr: def.id_attr,
                });
            }
            for dep in def.sweep_depends_on {
                if !self.resources.contains_key(dep) {
                    return Err(RegistryError::UnknownDependency { key: def.key, dep });
                }
            }
        }
        self.sweep_order().map(|_| ())
    }

    /// Sweepable resources in dependency order: every resource appears
    /// after all resources it depends on (children are swept first).
    pub fn sweep_order(&self) -> Result<Vec<&'static str>, RegistryError> {
        let sweepable: Vec<&ResourceDef> = self
            .resources
            .values()
            .filter(|def| def.sweepable)
            .collect();

        let mut order: Vec<&'static str> = Vec::with_capacity(sweepable.len());
        let mut remaining: Vec<&ResourceDef> = sweepable;

        while !remaining.is_empty() {
            let ready_at = remaining.iter().position(|def| {
                def.sweep_depends_on
                    .iter()
                    .all(|dep| order.contains(dep) || self.get(dep).map_or(true, |d| !d.sweepable))
            });
            match ready_at {
                Some(idx) => order.push(remaining.remove(idx).key),
                None => {
                    return Err(RegistryError::DependencyCycle {
                        key: remaining[0].key,
                    })
                }
            }
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttrSchema, AttrType};

    #[test]
    fn test_core_registry_is_consistent() {
        let registry = Registry::core();
        assert_eq!(registry.validate(), Ok(()));
        assert!(registry.get("core_shapes").is_some());
        assert!(registry.get("core_instances").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_sweep_order_respects_dependencies() {
        let registry = Registry::core();
        let order = registry.sweep_order().unwrap();

        let pos = |key: &str| order.iter().position(|k| *k == key).unwrap();
        assert!(pos("core_instances") < pos("core_subnets"));
        assert!(pos("core_subnets") < pos("core_vcns"));
        // Non-sweepable resources never appear
        assert!(!order.contains(&"core_shapes"));
    }

    #[test]
    fn test_dependency_cycle_is_rejected() {
        fn def(key: &'static str, deps: &'static [&'static str]) -> ResourceDef {
            ResourceDef {
                key,
                display_name: key,
                id_attr: "id",
                schema: SchemaDescriptor::new(
                    "cyclic",
                    vec![AttrSchema::computed("id", AttrType::Str)],
                ),
                sweepable: true,
                sweep_depends_on: deps,
            }
        }

        let mut resources = BTreeMap::new();
        resources.insert("a", def("a", &["b"]));
        resources.insert("b", def("b", &["a"]));
        let registry = Registry { resources };

        assert!(matches!(
            registry.sweep_order(),
            Err(RegistryError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn test_validate_catches_bad_id_attr() {
        let mut resources = BTreeMap::new();
        resources.insert(
            "broken",
            ResourceDef {
                key: "broken",
                display_name: "Broken",
                id_attr: "missing",
                schema: SchemaDescriptor::new(
                    "broken",
                    vec![AttrSchema::computed("id", AttrType::Str)],
                ),
                sweepable: false,
                sweep_depends_on: &[],
            },
        );
        let registry = Registry { resources };
        assert!(matches!(
            registry.validate(),
            Err(RegistryError::UnknownIdAttr { .. })
        ));
    }
}
