//! OCI Client
//!
//! Main client for interacting with OCI APIs, combining authentication,
//! HTTP functionality, and per-service endpoint construction.

use super::auth::{self, OciCredentials};
use super::http::{ApiResponse, OciHttpClient};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// API version shared by the core (IaaS) endpoints
pub const CORE_API_VERSION: &str = "20160918";

/// API version for the identity endpoints
pub const IDENTITY_API_VERSION: &str = "20160918";

/// One page of a list response: the decoded items plus the token for the
/// next page, if any. A `None` token means the listing is complete.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<String>,
}

/// Main OCI client
#[derive(Clone)]
pub struct OciClient {
    pub credentials: OciCredentials,
    pub http: OciHttpClient,
    pub region: String,
    pub tenancy: String,
    endpoint_override: Option<String>,
}

impl OciClient {
    /// Create a client from explicit parts.
    pub fn new(credentials: OciCredentials, region: &str, tenancy: &str) -> Result<Self> {
        let http = OciHttpClient::new()?;
        Ok(Self {
            credentials,
            http,
            region: region.to_string(),
            tenancy: tenancy.to_string(),
            endpoint_override: None,
        })
    }

    /// Create a client from a profile in the OCI configuration file.
    pub async fn from_profile(profile: &str, region_override: Option<&str>) -> Result<Self> {
        let data = auth::load_profile(profile)?;

        let region = region_override
            .map(|r| r.to_string())
            .or_else(auth::default_region)
            .or(data.region)
            .context("No region configured. Set OCI_CLI_REGION or add one to the profile")?;
        if !auth::validate_region(&region) {
            anyhow::bail!("Invalid region format: {}", region);
        }

        let tenancy = data
            .tenancy
            .context("Profile has no tenancy OCID")?;

        let token_file = data
            .security_token_file
            .context("Profile has no security_token_file. Run 'oci session authenticate'")?;

        Self::new(OciCredentials::from_token_file(token_file), &region, &tenancy)
    }

    /// Route every service endpoint to a fixed base URL.
    ///
    /// Used to point the whole client at a mock server; the URL must parse
    /// and use http(s).
    pub fn with_endpoint_override(mut self, endpoint: &str) -> Result<Self> {
        let parsed = url::Url::parse(endpoint)
            .with_context(|| format!("Invalid endpoint override: {}", endpoint))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Endpoint override must be http or https: {}", endpoint);
        }
        self.endpoint_override = Some(endpoint.trim_end_matches('/').to_string());
        Ok(self)
    }

    /// Get the current bearer token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to an OCI API
    pub async fn get(&self, url: &str) -> Result<ApiResponse> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to an OCI API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    /// Make a DELETE request to an OCI API
    pub async fn delete(&self, url: &str) -> Result<ApiResponse> {
        let token = self.get_token().await?;
        self.http.delete(url, &token).await
    }

    /// Switch to a different region
    pub fn switch_region(&mut self, region: &str) {
        self.region = region.to_string();
    }

    // =========================================================================
    // Core (IaaS) API helpers
    // =========================================================================

    fn core_endpoint(&self) -> String {
        match &self.endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://iaas.{}.oraclecloud.com", self.region),
        }
    }

    /// Build a core-services API URL
    pub fn core_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.core_endpoint(), CORE_API_VERSION, path)
    }

    // =========================================================================
    // Identity API helpers
    // =========================================================================

    fn identity_endpoint(&self) -> String {
        match &self.endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://identity.{}.oraclecloud.com", self.region),
        }
    }

    /// Build an identity API URL
    pub fn identity_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.identity_endpoint(), IDENTITY_API_VERSION, path)
    }
}

/// Build a query string from key/value pairs, percent-encoding values.
pub fn build_query(params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let encoded: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect();
    format!("?{}", encoded.join("&"))
}

/// Append the page token to a query parameter list, if one is set.
pub fn with_page(mut params: Vec<(&str, String)>, page: Option<String>) -> Vec<(&str, String)> {
    if let Some(token) = page {
        params.push(("page", token));
    }
    params
}

/// Decode a list response body (a bare JSON array) into one typed page.
pub fn decode_page<T: DeserializeOwned>(response: ApiResponse) -> Result<Page<T>> {
    let items: Vec<T> =
        serde_json::from_value(response.body).context("Failed to decode list response items")?;
    Ok(Page {
        items,
        next_page: response.next_page,
    })
}

/// Format an OCI API error for display
pub fn format_oci_error(error: &anyhow::Error) -> String {
    super::http::format_oci_error(error)
}
