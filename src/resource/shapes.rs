//! Compute shapes data source
//!
//! Shapes are the richest read-only record in the catalog: a pile of
//! optional scalars plus four nested option blocks describing the
//! flexible-shape ranges. The wire field `shape` projects under the
//! attribute key `name`.

use crate::adapter::{project_list, FieldMapping, FilterPredicate};
use crate::oci::client::{build_query, decode_page, with_page, OciClient, Page};
use crate::resource::collect_pages;
use crate::schema::{
    narrow_f32, AttrSchema, AttrType, AttrValue, AttributeMap, FloatWidth, SchemaDescriptor,
};
use anyhow::Result;
use serde::Deserialize;

/// One compute shape as returned by the core services API.
///
/// Numeric range fields are 32-bit floats upstream; they arrive as JSON
/// doubles and are narrowed back during projection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub shape: String,
    pub processor_description: Option<String>,
    pub ocpus: Option<f64>,
    #[serde(rename = "memoryInGBs")]
    pub memory_in_gbs: Option<f64>,
    pub networking_bandwidth_in_gbps: Option<f64>,
    pub max_vnic_attachments: Option<i64>,
    pub gpus: Option<i64>,
    pub gpu_description: Option<String>,
    pub local_disks: Option<i64>,
    #[serde(rename = "localDisksTotalSizeInGBs")]
    pub local_disks_total_size_in_gbs: Option<f64>,
    pub local_disk_description: Option<String>,
    pub is_live_migration_supported: Option<bool>,
    pub is_flexible: Option<bool>,
    /// Enum-backed upstream; unknown values pass through verbatim.
    pub billing_type: Option<String>,
    pub ocpu_options: Option<OcpuOptions>,
    pub memory_options: Option<MemoryOptions>,
    pub networking_bandwidth_options: Option<NetworkingBandwidthOptions>,
    pub max_vnic_attachment_options: Option<MaxVnicAttachmentOptions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcpuOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemoryOptions {
    #[serde(rename = "minInGBs")]
    pub min_in_gbs: Option<f64>,
    #[serde(rename = "maxInGBs")]
    pub max_in_gbs: Option<f64>,
    #[serde(rename = "defaultPerOcpuInGBs")]
    pub default_per_ocpu_in_gbs: Option<f64>,
    #[serde(rename = "minPerOcpuInGBs")]
    pub min_per_ocpu_in_gbs: Option<f64>,
    #[serde(rename = "maxPerOcpuInGBs")]
    pub max_per_ocpu_in_gbs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkingBandwidthOptions {
    pub min_in_gbps: Option<f64>,
    pub max_in_gbps: Option<f64>,
    pub default_per_ocpu_in_gbps: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxVnicAttachmentOptions {
    pub min: Option<i64>,
    pub max_per_ocpu: Option<f64>,
    pub default_per_ocpu: Option<f64>,
}

fn ocpu_options_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "core_shapes_ocpu_options",
        vec![
            AttrSchema::computed("min", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("max", AttrType::Float(FloatWidth::F32)),
        ],
    )
}

fn memory_options_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "core_shapes_memory_options",
        vec![
            AttrSchema::computed("min_in_gbs", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("max_in_gbs", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("default_per_ocpu_in_gbs", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("min_per_ocpu_in_gbs", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("max_per_ocpu_in_gbs", AttrType::Float(FloatWidth::F32)),
        ],
    )
}

fn networking_bandwidth_options_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "core_shapes_networking_bandwidth_options",
        vec![
            AttrSchema::computed("min_in_gbps", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("max_in_gbps", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("default_per_ocpu_in_gbps", AttrType::Float(FloatWidth::F32)),
        ],
    )
}

fn max_vnic_attachment_options_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "core_shapes_max_vnic_attachment_options",
        vec![
            AttrSchema::computed("min", AttrType::Int),
            AttrSchema::computed("max_per_ocpu", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("default_per_ocpu", AttrType::Float(FloatWidth::F32)),
        ],
    )
}

/// Schema for projected shape records.
pub fn schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "core_shapes",
        vec![
            AttrSchema::computed("name", AttrType::Str),
            AttrSchema::computed("processor_description", AttrType::Str),
            AttrSchema::computed("ocpus", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("memory_in_gbs", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("networking_bandwidth_in_gbps", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("max_vnic_attachments", AttrType::Int),
            AttrSchema::computed("gpus", AttrType::Int),
            AttrSchema::computed("gpu_description", AttrType::Str),
            AttrSchema::computed("local_disks", AttrType::Int),
            AttrSchema::computed("local_disks_total_size_in_gbs", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("local_disk_description", AttrType::Str),
            AttrSchema::computed("is_live_migration_supported", AttrType::Bool),
            AttrSchema::computed("is_flexible", AttrType::Bool),
            AttrSchema::computed("billing_type", AttrType::Str),
            AttrSchema::block("ocpu_options", 1, ocpu_options_schema()),
            AttrSchema::block("memory_options", 1, memory_options_schema()),
            AttrSchema::block("networking_bandwidth_options", 1, networking_bandwidth_options_schema()),
            AttrSchema::block("max_vnic_attachment_options", 1, max_vnic_attachment_options_schema()),
        ],
    )
}

// Option-block floats are all 32-bit upstream; narrow here since these maps
// are built directly rather than through `project`.
fn float_entry(map: &mut AttributeMap, key: &str, value: Option<f64>) {
    map.insert(
        key.to_string(),
        AttrValue::Float(value.map(narrow_f32).unwrap_or(0.0)),
    );
}

fn ocpu_options_to_map(options: &OcpuOptions) -> AttributeMap {
    let mut map = AttributeMap::new();
    float_entry(&mut map, "min", options.min);
    float_entry(&mut map, "max", options.max);
    map
}

fn memory_options_to_map(options: &MemoryOptions) -> AttributeMap {
    let mut map = AttributeMap::new();
    float_entry(&mut map, "min_in_gbs", options.min_in_gbs);
    float_entry(&mut map, "max_in_gbs", options.max_in_gbs);
    float_entry(&mut map, "default_per_ocpu_in_gbs", options.default_per_ocpu_in_gbs);
    float_entry(&mut map, "min_per_ocpu_in_gbs", options.min_per_ocpu_in_gbs);
    float_entry(&mut map, "max_per_ocpu_in_gbs", options.max_per_ocpu_in_gbs);
    map
}

fn networking_bandwidth_options_to_map(options: &NetworkingBandwidthOptions) -> AttributeMap {
    let mut map = AttributeMap::new();
    float_entry(&mut map, "min_in_gbps", options.min_in_gbps);
    float_entry(&mut map, "max_in_gbps", options.max_in_gbps);
    float_entry(&mut map, "default_per_ocpu_in_gbps", options.default_per_ocpu_in_gbps);
    map
}

fn max_vnic_attachment_options_to_map(options: &MaxVnicAttachmentOptions) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(
        "min".to_string(),
        options.min.map(AttrValue::Int).unwrap_or(AttrValue::Int(0)),
    );
    float_entry(&mut map, "max_per_ocpu", options.max_per_ocpu);
    float_entry(&mut map, "default_per_ocpu", options.default_per_ocpu);
    map
}

/// Field-mapping table for shape records.
pub static SHAPE_MAPPINGS: &[FieldMapping<Shape>] = &[
    FieldMapping {
        key: "name",
        extract: |s: &Shape| Some(AttrValue::Str(s.shape.clone())),
    },
    FieldMapping {
        key: "processor_description",
        extract: |s: &Shape| s.processor_description.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "ocpus",
        extract: |s: &Shape| s.ocpus.map(AttrValue::Float),
    },
    FieldMapping {
        key: "memory_in_gbs",
        extract: |s: &Shape| s.memory_in_gbs.map(AttrValue::Float),
    },
    FieldMapping {
        key: "networking_bandwidth_in_gbps",
        extract: |s: &Shape| s.networking_bandwidth_in_gbps.map(AttrValue::Float),
    },
    FieldMapping {
        key: "max_vnic_attachments",
        extract: |s: &Shape| s.max_vnic_attachments.map(AttrValue::Int),
    },
    FieldMapping {
        key: "gpus",
        extract: |s: &Shape| s.gpus.map(AttrValue::Int),
    },
    FieldMapping {
        key: "gpu_description",
        extract: |s: &Shape| s.gpu_description.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "local_disks",
        extract: |s: &Shape| s.local_disks.map(AttrValue::Int),
    },
    FieldMapping {
        key: "local_disks_total_size_in_gbs",
        extract: |s: &Shape| s.local_disks_total_size_in_gbs.map(AttrValue::Float),
    },
    FieldMapping {
        key: "local_disk_description",
        extract: |s: &Shape| s.local_disk_description.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "is_live_migration_supported",
        extract: |s: &Shape| s.is_live_migration_supported.map(AttrValue::Bool),
    },
    FieldMapping {
        key: "is_flexible",
        extract: |s: &Shape| s.is_flexible.map(AttrValue::Bool),
    },
    FieldMapping {
        key: "billing_type",
        extract: |s: &Shape| s.billing_type.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "ocpu_options",
        extract: |s: &Shape| {
            s.ocpu_options
                .as_ref()
                .map(|o| AttrValue::Blocks(vec![ocpu_options_to_map(o)]))
        },
    },
    FieldMapping {
        key: "memory_options",
        extract: |s: &Shape| {
            s.memory_options
                .as_ref()
                .map(|o| AttrValue::Blocks(vec![memory_options_to_map(o)]))
        },
    },
    FieldMapping {
        key: "networking_bandwidth_options",
        extract: |s: &Shape| {
            s.networking_bandwidth_options
                .as_ref()
                .map(|o| AttrValue::Blocks(vec![networking_bandwidth_options_to_map(o)]))
        },
    },
    FieldMapping {
        key: "max_vnic_attachment_options",
        extract: |s: &Shape| {
            s.max_vnic_attachment_options
                .as_ref()
                .map(|o| AttrValue::Blocks(vec![max_vnic_attachment_options_to_map(o)]))
        },
    },
];

/// Fetch one page of shapes for a compartment.
pub async fn list_shapes_page(
    client: &OciClient,
    compartment: &str,
    page: Option<String>,
) -> Result<Page<Shape>> {
    let query = build_query(&with_page(
        vec![("compartmentId", compartment.to_string())],
        page,
    ));
    let url = client.core_url(&format!("shapes{}", query));
    let response = client.get(&url).await?;
    decode_page(response)
}

/// Fetch every shape in the compartment and project the full listing.
pub async fn read_shapes(
    client: &OciClient,
    compartment: &str,
    filters: &[FilterPredicate],
) -> Result<Vec<AttributeMap>> {
    let records = collect_pages(|page| list_shapes_page(client, compartment, page)).await?;
    tracing::debug!("Fetched {} shapes", records.len());
    Ok(project_list(&records, &schema(), SHAPE_MAPPINGS, filters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::project;
    use crate::schema::narrow_f32;

    fn bare_shape(name: &str) -> Shape {
        Shape {
            shape: name.to_string(),
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

    #[test]
    fn test_projection_of_sparse_shape() {
        // A shape with no GPUs projects a zero, not a missing key
        let shape = Shape {
            memory_in_gbs: Some(64.0),
            ..bare_shape("VM.Standard2.1")
        };

        let map = project(&shape, &schema(), SHAPE_MAPPINGS);
        assert_eq!(map["name"], AttrValue::str("VM.Standard2.1"));
        assert_eq!(map["memory_in_gbs"], AttrValue::Float(64.0));
        assert_eq!(map["gpus"], AttrValue::Int(0));
        assert_eq!(map["ocpu_options"], AttrValue::Blocks(Vec::new()));
    }

    #[test]
    fn test_projection_matches_schema_exactly() {
        let map = project(&bare_shape("VM.Standard.E4.Flex"), &schema(), SHAPE_MAPPINGS);
        let schema = schema();
        assert_eq!(map.len(), schema.attrs().len());
        assert_eq!(schema.validate(&map), Ok(()));
    }

    #[test]
    fn test_nested_options_project_as_single_block() {
        let shape = Shape {
            is_flexible: Some(true),
            ocpu_options: Some(OcpuOptions {
                min: Some(1.0),
                max: Some(64.0),
            }),
            ..bare_shape("VM.Standard.E4.Flex")
        };

        let map = project(&shape, &schema(), SHAPE_MAPPINGS);
        let AttrValue::Blocks(blocks) = &map["ocpu_options"] else {
            panic!("expected blocks");
        };
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["min"], AttrValue::Float(1.0));
        assert_eq!(blocks[0]["max"], AttrValue::Float(64.0));
    }

    #[test]
    fn test_float_fields_narrow_to_declared_width() {
        let shape = Shape {
            networking_bandwidth_in_gbps: Some(24.599999999),
            ..bare_shape("VM.Standard2.1")
        };
        let map = project(&shape, &schema(), SHAPE_MAPPINGS);
        assert_eq!(
            map["networking_bandwidth_in_gbps"],
            AttrValue::Float(narrow_f32(24.599999999))
        );
    }

    #[test]
    fn test_unknown_billing_type_passes_through() {
        let shape = Shape {
            billing_type: Some("SOME_NEW_BILLING_MODEL".to_string()),
            ..bare_shape("VM.Standard2.1")
        };
        let map = project(&shape, &schema(), SHAPE_MAPPINGS);
        assert_eq!(map["billing_type"], AttrValue::str("SOME_NEW_BILLING_MODEL"));
    }

    #[test]
    fn test_wire_decoding_is_camel_case() {
        let json = serde_json::json!({
            "shape": "VM.Standard2.1",
            "memoryInGBs": 15.0,
            "ocpuOptions": {"min": 1.0, "max": 2.0},
            "somethingUnknown": true
        });
        let shape: Shape = serde_json::from_value(json).unwrap();
        assert_eq!(shape.shape, "VM.Standard2.1");
        assert_eq!(shape.memory_in_gbs, Some(15.0));
        assert_eq!(shape.ocpu_options.unwrap().max, Some(2.0));
    }
}
