//! Compute instances
//!
//! Instance records flow both directions: list/get responses project into
//! attribute maps, and user-supplied attributes populate a
//! [`LaunchDetails`] request.

use crate::adapter::{
    expect_str, project, project_list, FieldBinding, FieldMapping, FilterPredicate,
};
use crate::oci::client::{build_query, decode_page, with_page, OciClient, Page};
use crate::resource::collect_pages;
use crate::schema::{
    AttrSchema, AttrType, AttrValue, AttributeMap, FloatWidth, SchemaDescriptor,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One compute instance as returned by the core services API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub compartment_id: String,
    pub display_name: Option<String>,
    pub availability_domain: Option<String>,
    pub fault_domain: Option<String>,
    pub shape: Option<String>,
    /// Enum-backed upstream (PROVISIONING, RUNNING, TERMINATED, ...);
    /// unknown values pass through verbatim.
    pub lifecycle_state: Option<String>,
    pub region: Option<String>,
    pub time_created: Option<String>,
    pub shape_config: Option<ShapeConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeConfig {
    pub ocpus: Option<f64>,
    #[serde(rename = "memoryInGBs")]
    pub memory_in_gbs: Option<f64>,
    pub vcpus: Option<i64>,
}

/// Request body for launching an instance. Fields left `None` fall back to
/// the API's own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
}

fn shape_config_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "core_instances_shape_config",
        vec![
            AttrSchema::computed("ocpus", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("memory_in_gbs", AttrType::Float(FloatWidth::F32)),
            AttrSchema::computed("vcpus", AttrType::Int),
        ],
    )
}

/// Schema for projected instance records.
pub fn schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "core_instances",
        vec![
            AttrSchema::computed("id", AttrType::Str),
            AttrSchema::required("compartment_id", AttrType::Str),
            AttrSchema::optional("display_name", AttrType::Str),
            AttrSchema::optional("availability_domain", AttrType::Str),
            AttrSchema::computed("fault_domain", AttrType::Str),
            AttrSchema::optional("shape", AttrType::Str),
            AttrSchema::computed("state", AttrType::Str),
            AttrSchema::computed("region", AttrType::Str),
            AttrSchema::computed("time_created", AttrType::Str),
            AttrSchema::block("shape_config", 1, shape_config_schema()),
        ],
    )
}

fn shape_config_to_map(config: &ShapeConfig) -> AttributeMap {
    use crate::schema::narrow_f32;
    let mut map = AttributeMap::new();
    map.insert(
        "ocpus".to_string(),
        AttrValue::Float(config.ocpus.map(narrow_f32).unwrap_or(0.0)),
    );
    map.insert(
        "memory_in_gbs".to_string(),
        AttrValue::Float(config.memory_in_gbs.map(narrow_f32).unwrap_or(0.0)),
    );
    map.insert(
        "vcpus".to_string(),
        AttrValue::Int(config.vcpus.unwrap_or(0)),
    );
    map
}

/// Field-mapping table for instance records. The wire field
/// `lifecycleState` lands under the attribute key `state`.
pub static INSTANCE_MAPPINGS: &[FieldMapping<Instance>] = &[
    FieldMapping {
        key: "id",
        extract: |i: &Instance| Some(AttrValue::Str(i.id.clone())),
    },
    FieldMapping {
        key: "compartment_id",
        extract: |i: &Instance| Some(AttrValue::Str(i.compartment_id.clone())),
    },
    FieldMapping {
        key: "display_name",
        extract: |i: &Instance| i.display_name.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "availability_domain",
        extract: |i: &Instance| i.availability_domain.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "fault_domain",
        extract: |i: &Instance| i.fault_domain.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "shape",
        extract: |i: &Instance| i.shape.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "state",
        extract: |i: &Instance| i.lifecycle_state.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "region",
        extract: |i: &Instance| i.region.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "time_created",
        extract: |i: &Instance| i.time_created.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "shape_config",
        extract: |i: &Instance| {
            i.shape_config
                .as_ref()
                .map(|c| AttrValue::Blocks(vec![shape_config_to_map(c)]))
        },
    },
];

/// Inverse table: attribute map to launch request.
pub static LAUNCH_BINDINGS: &[FieldBinding<LaunchDetails>] = &[
    FieldBinding {
        key: "availability_domain",
        assign: |q: &mut LaunchDetails, v| {
            q.availability_domain = Some(expect_str("availability_domain", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "compartment_id",
        assign: |q: &mut LaunchDetails, v| {
            q.compartment_id = Some(expect_str("compartment_id", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "display_name",
        assign: |q: &mut LaunchDetails, v| {
            q.display_name = Some(expect_str("display_name", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "shape",
        assign: |q: &mut LaunchDetails, v| {
            q.shape = Some(expect_str("shape", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "subnet_id",
        assign: |q: &mut LaunchDetails, v| {
            q.subnet_id = Some(expect_str("subnet_id", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "image_id",
        assign: |q: &mut LaunchDetails, v| {
            q.image_id = Some(expect_str("image_id", v)?);
            Ok(())
        },
    },
];

/// Fetch one page of instances for a compartment.
pub async fn list_instances_page(
    client: &OciClient,
    compartment: &str,
    page: Option<String>,
) -> Result<Page<Instance>> {
    let query = build_query(&with_page(
        vec![("compartmentId", compartment.to_string())],
        page,
    ));
    let url = client.core_url(&format!("instances{}", query));
    let response = client.get(&url).await?;
    decode_page(response)
}

/// Fetch every instance in the compartment and project the full listing.
pub async fn read_instances(
    client: &OciClient,
    compartment: &str,
    filters: &[FilterPredicate],
) -> Result<Vec<AttributeMap>> {
    let records = collect_pages(|page| list_instances_page(client, compartment, page)).await?;
    tracing::debug!("Fetched {} instances", records.len());
    Ok(project_list(&records, &schema(), INSTANCE_MAPPINGS, filters))
}

/// Fetch a single instance by OCID.
pub async fn get_instance(client: &OciClient, id: &str) -> Result<Instance> {
    let url = client.core_url(&format!("instances/{}", id));
    let response = client.get(&url).await?;
    serde_json::from_value(response.body).context("Failed to decode instance")
}

/// Fetch and project a single instance.
pub async fn read_instance(client: &OciClient, id: &str) -> Result<AttributeMap> {
    let instance = get_instance(client, id).await?;
    Ok(project(&instance, &schema(), INSTANCE_MAPPINGS))
}

/// Launch an instance from a populated request.
pub async fn launch_instance(client: &OciClient, details: &LaunchDetails) -> Result<Instance> {
    let url = client.core_url("instances");
    let body = serde_json::to_value(details)?;
    let response = client.post(&url, Some(&body)).await?;
    serde_json::from_value(response.body).context("Failed to decode launched instance")
}

/// Terminate an instance. The API returns 204 and transitions the record
/// to TERMINATING; callers poll until it is gone.
pub async fn terminate_instance(client: &OciClient, id: &str) -> Result<()> {
    let url = client.core_url(&format!("instances/{}", id));
    client.delete(&url).await?;
    Ok(())
}
