//! Property-based tests using proptest
//!
//! These tests verify the projection contract over randomized records:
//! idempotence, exact key coverage, order preservation, filter semantics,
//! deterministic float narrowing, and aliasing-free request population.

use ociprov::adapter::{populate, project, project_list, FilterPredicate};
use ociprov::resource::instances::{LaunchDetails, LAUNCH_BINDINGS};
use ociprov::resource::shapes::{self, OcpuOptions, Shape, SHAPE_MAPPINGS};
use ociprov::schema::{narrow_f32, AttrValue, AttributeMap};
use proptest::prelude::*;

/// Generate arbitrary shape records for testing
fn arb_shape() -> impl Strategy<Value = Shape> {
    (
        "VM\\.[A-Z][a-z]{2,8}[0-9]\\.[0-9]", // shape name
        proptest::option::of(0.5f64..512.0),  // ocpus
        proptest::option::of(1.0f64..2048.0), // memory
        proptest::option::of(0i64..8),        // gpus
        proptest::option::of(any::<bool>()),  // is_flexible
        proptest::option::of(prop_oneof![
            Just("ALWAYS_FREE".to_string()),
            Just("LIMITED_FREE".to_string()),
            Just("PAID".to_string()),
            Just("SOME_FUTURE_MODEL".to_string()),
        ]),
        proptest::option::of((0.5f64..8.0, 8.0f64..128.0)),
    )
        .prop_map(
            |(name, ocpus, memory, gpus, is_flexible, billing, ocpu_range)| Shape {
                shape: name,
                processor_description: None,
                ocpus,
                memory_in_gbs: memory,
                networking_bandwidth_in_gbps: None,
                max_vnic_attachments: None,
                gpus,
                gpu_description: None,
                local_disks: None,
                local_disks_total_size_in_gbs: None,
                local_disk_description: None,
                is_live_migration_supported: None,
                is_flexible,
                billing_type: billing,
                ocpu_options: ocpu_range.map(|(min, max)| OcpuOptions {
                    min: Some(min),
                    max: Some(max),
                }),
                memory_options: None,
                networking_bandwidth_options: None,
                max_vnic_attachment_options: None,
            },
        )
}

/// Generate a list of shapes
fn arb_shape_list() -> impl Strategy<Value = Vec<Shape>> {
    prop::collection::vec(arb_shape(), 0..30)
}

proptest! {
    /// Projecting the same record twice yields structurally equal maps
    #[test]
    fn projection_is_idempotent(shape in arb_shape()) {
        let schema = shapes::schema();
        let first = project(&shape, &schema, SHAPE_MAPPINGS);
        let second = project(&shape, &schema, SHAPE_MAPPINGS);
        prop_assert_eq!(first, second);
    }

    /// A projected map contains exactly the schema's keys - no extras, no
    /// silently dropped attributes
    #[test]
    fn projection_covers_schema_exactly(shape in arb_shape()) {
        let schema = shapes::schema();
        let map = project(&shape, &schema, SHAPE_MAPPINGS);

        let mut expected: Vec<&str> = schema.keys().collect();
        expected.sort_unstable();
        let actual: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
        prop_assert_eq!(actual, expected);
    }

    /// Every projected map validates against its own schema
    #[test]
    fn projection_validates(shape in arb_shape()) {
        let schema = shapes::schema();
        let map = project(&shape, &schema, SHAPE_MAPPINGS);
        prop_assert!(schema.validate(&map).is_ok());
    }

    /// List projection preserves input order and length
    #[test]
    fn list_projection_preserves_order(records in arb_shape_list()) {
        let schema = shapes::schema();
        let maps = project_list(&records, &schema, SHAPE_MAPPINGS, &[]);

        prop_assert_eq!(maps.len(), records.len());
        for (map, record) in maps.iter().zip(&records) {
            prop_assert_eq!(map["name"].clone(), AttrValue::Str(record.shape.clone()));
        }
    }

    /// A filtered projection is the filtered subset of the unfiltered one
    #[test]
    fn filtered_projection_is_a_subset(records in arb_shape_list()) {
        let schema = shapes::schema();
        let unfiltered = project_list(&records, &schema, SHAPE_MAPPINGS, &[]);

        // Filter on the name of the first record, if any
        let Some(first) = records.first() else { return Ok(()); };
        let filter = FilterPredicate::new("name", vec![first.shape.clone()]);
        let filtered = project_list(&records, &schema, SHAPE_MAPPINGS, std::slice::from_ref(&filter));

        prop_assert!(filtered.len() <= unfiltered.len());
        for map in &filtered {
            prop_assert!(filter.matches(map));
            prop_assert!(unfiltered.contains(map));
        }
        // Nothing that matches was dropped
        let matching = unfiltered.iter().filter(|m| filter.matches(m)).count();
        prop_assert_eq!(filtered.len(), matching);
    }

    /// Filtering twice with the same predicate changes nothing
    #[test]
    fn filtering_is_idempotent(records in arb_shape_list(), value in "VM\\.[A-Z][a-z]{2,8}[0-9]\\.[0-9]") {
        let schema = shapes::schema();
        let filter = FilterPredicate::new("name", vec![value]);
        let once = project_list(&records, &schema, SHAPE_MAPPINGS, std::slice::from_ref(&filter));
        let twice: Vec<AttributeMap> = once
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        prop_assert_eq!(once, twice);
    }
}

/// Tests for deterministic float narrowing
mod narrowing_tests {
    use super::*;

    proptest! {
        /// Narrowing is a pure function: same input, same output
        #[test]
        fn narrowing_is_deterministic(value in -1.0e30f64..1.0e30) {
            prop_assert_eq!(narrow_f32(value), narrow_f32(value));
        }

        /// Narrowing matches a plain f32 round trip
        #[test]
        fn narrowing_matches_f32_round_trip(value in -1.0e30f64..1.0e30) {
            prop_assert_eq!(narrow_f32(value), f64::from(value as f32));
        }

        /// Narrowing is stable under repetition: a narrowed value narrows
        /// to itself
        #[test]
        fn narrowing_is_a_projection(value in -1.0e30f64..1.0e30) {
            let narrowed = narrow_f32(value);
            prop_assert_eq!(narrow_f32(narrowed), narrowed);
        }

        /// Projected f32-width attributes carry the narrowed value
        #[test]
        fn projected_floats_are_narrowed(memory in 0.1f64..4096.0) {
            let shape = Shape {
                memory_in_gbs: Some(memory),
                ..minimal_shape()
            };
            let map = project(&shape, &shapes::schema(), SHAPE_MAPPINGS);
            prop_assert_eq!(map["memory_in_gbs"].clone(), AttrValue::Float(narrow_f32(memory)));
        }
    }

    fn minimal_shape() -> Shape {
        Shape {
            shape: "VM.Standard2.1".to_string(),
            processor_description: None,
            ocpus: None,
            memory_in_gbs: None,
            networking_bandwidth_in_gbps: None,
            max_vnic_attachments: None,
            gpus: None,
            gpu_description: None,
            local_disks: None,
            local_disks_total_size_in_gbs: None,
            local_disk_description: None,
            is_live_migration_supported: None,
            is_flexible: None,
            billing_type: None,
            ocpu_options: None,
            memory_options: None,
            networking_bandwidth_options: None,
            max_vnic_attachment_options: None,
        }
    }
}

/// Tests for aliasing-free request population
mod populate_tests {
    use super::*;

    proptest! {
        /// Mutating the source map after populate never changes the request
        #[test]
        fn populate_never_aliases(name in "[a-z][a-z0-9-]{0,30}", replacement in "[a-z][a-z0-9-]{0,30}") {
            let mut map = AttributeMap::new();
            map.insert("display_name".to_string(), AttrValue::Str(name.clone()));

            let mut details = LaunchDetails::default();
            populate(&map, LAUNCH_BINDINGS, &mut details).unwrap();

            map.insert("display_name".to_string(), AttrValue::Str(replacement));
            map.clear();

            prop_assert_eq!(details.display_name.as_deref(), Some(name.as_str()));
        }

        /// Absent keys leave request fields at their defaults
        #[test]
        fn absent_keys_stay_default(shape_name in "VM\\.[A-Z][a-z]{2,8}[0-9]\\.[0-9]") {
            let mut map = AttributeMap::new();
            map.insert("shape".to_string(), AttrValue::Str(shape_name.clone()));

            let mut details = LaunchDetails::default();
            populate(&map, LAUNCH_BINDINGS, &mut details).unwrap();

            prop_assert_eq!(details.shape.as_deref(), Some(shape_name.as_str()));
            prop_assert_eq!(details.display_name, None);
            prop_assert_eq!(details.subnet_id, None);
            prop_assert_eq!(details.image_id, None);
        }
    }
}
