//! Virtual cloud networks and subnets
//!
//! VCNs carry the one list-of-scalar field in the catalog (`cidr_blocks`),
//! which keeps "absent" and "present but empty" as distinct projected
//! states.

use crate::adapter::{
    expect_str, expect_str_list, project, project_list, FieldBinding, FieldMapping,
    FilterPredicate,
};
use crate::oci::client::{build_query, decode_page, with_page, OciClient, Page};
use crate::resource::collect_pages;
use crate::schema::{AttrSchema, AttrType, AttrValue, AttributeMap, SchemaDescriptor};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vcn {
    pub id: String,
    pub compartment_id: String,
    pub display_name: Option<String>,
    pub cidr_block: Option<String>,
    pub cidr_blocks: Option<Vec<String>>,
    pub dns_label: Option<String>,
    pub lifecycle_state: Option<String>,
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,
    pub vcn_id: String,
    pub compartment_id: String,
    pub display_name: Option<String>,
    pub cidr_block: Option<String>,
    pub availability_domain: Option<String>,
    pub prohibit_public_ip_on_vnic: Option<bool>,
    pub lifecycle_state: Option<String>,
    pub time_created: Option<String>,
}

/// Request body for creating a VCN.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVcnDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_blocks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_label: Option<String>,
}

/// Request body for creating a subnet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubnetDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcn_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_domain: Option<String>,
}

/// Schema for projected VCN records.
pub fn vcn_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "core_vcns",
        vec![
            AttrSchema::computed("id", AttrType::Str),
            AttrSchema::required("compartment_id", AttrType::Str),
            AttrSchema::optional("display_name", AttrType::Str),
            AttrSchema::optional("cidr_block", AttrType::Str),
            AttrSchema::optional("cidr_blocks", AttrType::StrList).nullable(),
            AttrSchema::optional("dns_label", AttrType::Str),
            AttrSchema::computed("state", AttrType::Str),
            AttrSchema::computed("time_created", AttrType::Str),
        ],
    )
}

/// Schema for projected subnet records.
pub fn subnet_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "core_subnets",
        vec![
            AttrSchema::computed("id", AttrType::Str),
            AttrSchema::required("compartment_id", AttrType::Str),
            AttrSchema::required("vcn_id", AttrType::Str),
            AttrSchema::optional("display_name", AttrType::Str),
            AttrSchema::optional("cidr_block", AttrType::Str),
            AttrSchema::optional("availability_domain", AttrType::Str),
            AttrSchema::optional("prohibit_public_ip_on_vnic", AttrType::Bool),
            AttrSchema::computed("state", AttrType::Str),
            AttrSchema::computed("time_created", AttrType::Str),
        ],
    )
}

pub static VCN_MAPPINGS: &[FieldMapping<Vcn>] = &[
    FieldMapping {
        key: "id",
        extract: |v: &Vcn| Some(AttrValue::Str(v.id.clone())),
    },
    FieldMapping {
        key: "compartment_id",
        extract: |v: &Vcn| Some(AttrValue::Str(v.compartment_id.clone())),
    },
    FieldMapping {
        key: "display_name",
        extract: |v: &Vcn| v.display_name.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "cidr_block",
        extract: |v: &Vcn| v.cidr_block.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "cidr_blocks",
        extract: |v: &Vcn| {
            v.cidr_blocks.as_ref().map(|blocks| {
                AttrValue::List(blocks.iter().cloned().map(AttrValue::Str).collect())
            })
        },
    },
    FieldMapping {
        key: "dns_label",
        extract: |v: &Vcn| v.dns_label.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "state",
        extract: |v: &Vcn| v.lifecycle_state.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "time_created",
        extract: |v: &Vcn| v.time_created.clone().map(AttrValue::Str),
    },
];

pub static SUBNET_MAPPINGS: &[FieldMapping<Subnet>] = &[
    FieldMapping {
        key: "id",
        extract: |s: &Subnet| Some(AttrValue::Str(s.id.clone())),
    },
    FieldMapping {
        key: "compartment_id",
        extract: |s: &Subnet| Some(AttrValue::Str(s.compartment_id.clone())),
    },
    FieldMapping {
        key: "vcn_id",
        extract: |s: &Subnet| Some(AttrValue::Str(s.vcn_id.clone())),
    },
    FieldMapping {
        key: "display_name",
        extract: |s: &Subnet| s.display_name.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "cidr_block",
        extract: |s: &Subnet| s.cidr_block.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "availability_domain",
        extract: |s: &Subnet| s.availability_domain.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "prohibit_public_ip_on_vnic",
        extract: |s: &Subnet| s.prohibit_public_ip_on_vnic.map(AttrValue::Bool),
    },
    FieldMapping {
        key: "state",
        extract: |s: &Subnet| s.lifecycle_state.clone().map(AttrValue::Str),
    },
    FieldMapping {
        key: "time_created",
        extract: |s: &Subnet| s.time_created.clone().map(AttrValue::Str),
    },
];

pub static CREATE_VCN_BINDINGS: &[FieldBinding<CreateVcnDetails>] = &[
    FieldBinding {
        key: "compartment_id",
        assign: |q: &mut CreateVcnDetails, v| {
            q.compartment_id = Some(expect_str("compartment_id", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "display_name",
        assign: |q: &mut CreateVcnDetails, v| {
            q.display_name = Some(expect_str("display_name", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "cidr_block",
        assign: |q: &mut CreateVcnDetails, v| {
            q.cidr_block = Some(expect_str("cidr_block", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "cidr_blocks",
        assign: |q: &mut CreateVcnDetails, v| {
            q.cidr_blocks = Some(expect_str_list("cidr_blocks", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "dns_label",
        assign: |q: &mut CreateVcnDetails, v| {
            q.dns_label = Some(expect_str("dns_label", v)?);
            Ok(())
        },
    },
];

pub static CREATE_SUBNET_BINDINGS: &[FieldBinding<CreateSubnetDetails>] = &[
    FieldBinding {
        key: "compartment_id",
        assign: |q: &mut CreateSubnetDetails, v| {
            q.compartment_id = Some(expect_str("compartment_id", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "vcn_id",
        assign: |q: &mut CreateSubnetDetails, v| {
            q.vcn_id = Some(expect_str("vcn_id", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "display_name",
        assign: |q: &mut CreateSubnetDetails, v| {
            q.display_name = Some(expect_str("display_name", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "cidr_block",
        assign: |q: &mut CreateSubnetDetails, v| {
            q.cidr_block = Some(expect_str("cidr_block", v)?);
            Ok(())
        },
    },
    FieldBinding {
        key: "availability_domain",
        assign: |q: &mut CreateSubnetDetails, v| {
            q.availability_domain = Some(expect_str("availability_domain", v)?);
            Ok(())
        },
    },
];

pub async fn list_vcns_page(
    client: &OciClient,
    compartment: &str,
    page: Option<String>,
) -> Result<Page<Vcn>> {
    let query = build_query(&with_page(
        vec![("compartmentId", compartment.to_string())],
        page,
    ));
    let url = client.core_url(&format!("vcns{}", query));
    let response = client.get(&url).await?;
    decode_page(response)
}

pub async fn read_vcns(
    client: &OciClient,
    compartment: &str,
    filters: &[FilterPredicate],
) -> Result<Vec<AttributeMap>> {
    let records = collect_pages(|page| list_vcns_page(client, compartment, page)).await?;
    tracing::debug!("Fetched {} vcns", records.len());
    Ok(project_list(&records, &vcn_schema(), VCN_MAPPINGS, filters))
}

pub async fn get_vcn(client: &OciClient, id: &str) -> Result<Vcn> {
    let url = client.core_url(&format!("vcns/{}", id));
    let response = client.get(&url).await?;
    serde_json::from_value(response.body).context("Failed to decode vcn")
}

pub async fn read_vcn(client: &OciClient, id: &str) -> Result<AttributeMap> {
    let vcn = get_vcn(client, id).await?;
    Ok(project(&vcn, &vcn_schema(), VCN_MAPPINGS))
}

/// Create a VCN from a populated request.
pub async fn create_vcn(client: &OciClient, details: &CreateVcnDetails) -> Result<Vcn> {
    let url = client.core_url("vcns");
    let body = serde_json::to_value(details)?;
    let response = client.post(&url, Some(&body)).await?;
    serde_json::from_value(response.body).context("Failed to decode created vcn")
}

pub async fn delete_vcn(client: &OciClient, id: &str) -> Result<()> {
    let url = client.core_url(&format!("vcns/{}", id));
    client.delete(&url).await?;
    Ok(())
}

pub async fn list_subnets_page(
    client: &OciClient,
    compartment: &str,
    page: Option<String>,
) -> Result<Page<Subnet>> {
    let query = build_query(&with_page(
        vec![("compartmentId", compartment.to_string())],
        page,
    ));
    let url = client.core_url(&format!("subnets{}", query));
    let response = client.get(&url).await?;
    decode_page(response)
}

pub async fn read_subnets(
    client: &OciClient,
    compartment: &str,
    filters: &[FilterPredicate],
) -> Result<Vec<AttributeMap>> {
    let records = collect_pages(|page| list_subnets_page(client, compartment, page)).await?;
    tracing::debug!("Fetched {} subnets", records.len());
    Ok(project_list(&records, &subnet_schema(), SUBNET_MAPPINGS, filters))
}

pub async fn get_subnet(client: &OciClient, id: &str) -> Result<Subnet> {
    let url = client.core_url(&format!("subnets/{}", id));
    let response = client.get(&url).await?;
    serde_json::from_value(response.body).context("Failed to decode subnet")
}

pub async fn read_subnet(client: &OciClient, id: &str) -> Result<AttributeMap> {
    let subnet = get_subnet(client, id).await?;
    Ok(project(&subnet, &subnet_schema(), SUBNET_MAPPINGS))
}

/// Create a subnet from a populated request.
pub async fn create_subnet(client: &OciClient, details: &CreateSubnetDetails) -> Result<Subnet> {
    let url = client.core_url("subnets");
    let body = serde_json::to_value(details)?;
    let response = client.post(&url, Some(&body)).await?;
    serde_json::from_value(response.body).context("Failed to decode created subnet")
}

pub async fn delete_subnet(client: &OciClient, id: &str) -> Result<()> {
    let url = client.core_url(&format!("subnets/{}", id));
    client.delete(&url).await?;
    Ok(())
}
