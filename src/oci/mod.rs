//! OCI API interaction module
//!
//! This module provides the core functionality for talking to Oracle Cloud
//! Infrastructure REST endpoints: credential discovery, the HTTP wrapper,
//! and the service client with its endpoint builders.
//!
//! # Module Structure
//!
//! - [`auth`] - credential discovery from `~/.oci/config` and the session token cache
//! - [`client`] - main OCI client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use crate::oci::client::OciClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = OciClient::from_profile("DEFAULT", None).await?;
//!     let page = client.get(&client.core_url("shapes?compartmentId=...")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
