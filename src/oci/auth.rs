//! OCI Authentication
//!
//! Handles credential discovery from the OCI CLI configuration file
//! (`~/.oci/config`) and session-token based authentication. Request
//! signing is intentionally not implemented here; the session token is
//! sent as a bearer credential and its lifecycle (creation, refresh via
//! `oci session authenticate`) belongs to the external tooling.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Where the bearer token comes from.
#[derive(Clone)]
enum TokenSource {
    /// Session token file referenced by the profile (`security_token_file`).
    File(PathBuf),
    /// Fixed token, used by tests and mock-endpoint runs.
    Static(String),
}

/// OCI credentials holder with token caching
#[derive(Clone)]
pub struct OciCredentials {
    source: TokenSource,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl OciCredentials {
    /// Credentials backed by a session token file.
    pub fn from_token_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: TokenSource::File(path.into()),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Credentials with a fixed token. Used against mock endpoints where no
    /// real session exists.
    pub fn from_static(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Static(token.into()),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a bearer token for API calls
    /// Security: checks token expiry before returning cached token
    pub async fn get_token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, reloading");
            }
        }

        let token = match &self.source {
            TokenSource::Static(token) => token.clone(),
            TokenSource::File(path) => {
                let raw = tokio::fs::read_to_string(path).await.with_context(|| {
                    format!(
                        "Failed to read session token from {}. Run 'oci session authenticate'",
                        path.display()
                    )
                })?;
                let token = raw.trim().to_string();
                if token.is_empty() {
                    anyhow::bail!(
                        "Session token file {} is empty. Run 'oci session authenticate'",
                        path.display()
                    );
                }
                token
            }
        };

        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;
        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "Token cached, expires in ~{} minutes",
            (DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }

    /// Force a reload of the token on the next call
    pub async fn refresh_token(&self) -> Result<String> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }
        self.get_token().await
    }
}

/// One parsed profile from the OCI configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileData {
    pub tenancy: Option<String>,
    pub region: Option<String>,
    pub security_token_file: Option<PathBuf>,
    pub compartment: Option<String>,
}

/// Get the OCI configuration file path
pub fn oci_config_file() -> Option<PathBuf> {
    // Check OCI_CLI_CONFIG_FILE environment variable first
    if let Ok(path) = std::env::var("OCI_CLI_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    // Default to ~/.oci/config
    dirs::home_dir().map(|p| p.join(".oci").join("config"))
}

/// Parse one profile section out of an OCI config file.
///
/// The file is INI-shaped: `[PROFILE]` headers followed by `key=value`
/// lines. Comments and unknown keys are skipped.
pub fn parse_profile(content: &str, profile: &str) -> Option<ProfileData> {
    let mut in_section = false;
    let mut found = false;
    let mut data = ProfileData::default();

    for line in content.lines() {
        let line = line.trim();
        // Security: skip comments and empty lines
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_section = line[1..line.len() - 1].trim() == profile;
            found = found || in_section;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "tenancy" => data.tenancy = Some(value.to_string()),
            "region" => data.region = Some(value.to_string()),
            "security_token_file" => data.security_token_file = Some(expand_home(value)),
            "compartment" => data.compartment = Some(value.to_string()),
            _ => {}
        }
    }

    found.then_some(data)
}

/// Load a profile from the configuration file on disk.
pub fn load_profile(profile: &str) -> Result<ProfileData> {
    let path = oci_config_file().context("Could not determine home directory")?;
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read OCI config at {}", path.display()))?;
    parse_profile(&content, profile)
        .with_context(|| format!("Profile [{}] not found in {}", profile, path.display()))
}

fn expand_home(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(value)
}

/// Validate an OCID
/// OCIDs are dot-separated: `ocid1.<type>.<realm>.[region].[...].<unique id>`
/// The region part may be empty (tenancy-level OCIDs).
pub fn validate_ocid(ocid: &str) -> bool {
    let parts: Vec<&str> = ocid.split('.').collect();
    if parts.len() < 5 {
        return false;
    }
    if parts[0] != "ocid1" {
        return false;
    }
    // Type and realm must be present
    if parts[1].is_empty() || parts[2].is_empty() {
        return false;
    }
    // The unique suffix carries the entropy
    let unique = parts[parts.len() - 1];
    unique.len() >= 8 && unique.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Validate a region identifier format (e.g., us-ashburn-1)
pub fn validate_region(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 {
        return false;
    }
    parts
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}

/// Get the default profile name
pub fn default_profile() -> String {
    std::env::var("OCI_CLI_PROFILE").unwrap_or_else(|_| "DEFAULT".to_string())
}

/// Get the default region from the environment
/// Security: validates region format before returning
pub fn default_region() -> Option<String> {
    if let Ok(region) = std::env::var("OCI_CLI_REGION") {
        if validate_region(&region) {
            return Some(region);
        }
        tracing::warn!("Invalid region format in OCI_CLI_REGION");
    }
    None
}

/// Get the default compartment from the environment
/// Security: validates OCID format before returning
pub fn default_compartment() -> Option<String> {
    if let Ok(compartment) = std::env::var("OCI_CLI_COMPARTMENT") {
        if validate_ocid(&compartment) {
            return Some(compartment);
        }
        tracing::warn!("Invalid OCID format in OCI_CLI_COMPARTMENT");
    }
    None
}

/// Commonly available commercial-realm regions
pub fn known_regions() -> Vec<String> {
    vec![
        // Americas
        "us-ashburn-1".to_string(),
        "us-phoenix-1".to_string(),
        "us-chicago-1".to_string(),
        "us-sanjose-1".to_string(),
        "ca-toronto-1".to_string(),
        "ca-montreal-1".to_string(),
        "sa-saopaulo-1".to_string(),
        "sa-santiago-1".to_string(),
        // Europe
        "eu-frankfurt-1".to_string(),
        "eu-amsterdam-1".to_string(),
        "eu-zurich-1".to_string(),
        "eu-madrid-1".to_string(),
        "eu-paris-1".to_string(),
        "uk-london-1".to_string(),
        // Asia / Pacific
        "ap-tokyo-1".to_string(),
        "ap-osaka-1".to_string(),
        "ap-seoul-1".to_string(),
        "ap-singapore-1".to_string(),
        "ap-mumbai-1".to_string(),
        "ap-sydney-1".to_string(),
        "ap-melbourne-1".to_string(),
        // Middle East
        "me-dubai-1".to_string(),
        "me-jeddah-1".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = "\
# OCI CLI config
[DEFAULT]
user=ocid1.user.oc1..aaaaexampleuser
tenancy=ocid1.tenancy.oc1..aaaaexampletenancy
region=us-ashburn-1
security_token_file=/tmp/token

[dev]
tenancy=ocid1.tenancy.oc1..bbbbexampletenancy
region=eu-frankfurt-1
compartment=ocid1.compartment.oc1..ccccexample1
";

    #[test]
    fn test_parse_default_profile() {
        let data = parse_profile(SAMPLE_CONFIG, "DEFAULT").unwrap();
        assert_eq!(data.tenancy.as_deref(), Some("ocid1.tenancy.oc1..aaaaexampletenancy"));
        assert_eq!(data.region.as_deref(), Some("us-ashburn-1"));
        assert_eq!(data.security_token_file, Some(PathBuf::from("/tmp/token")));
        assert_eq!(data.compartment, None);
    }

    #[test]
    fn test_parse_named_profile() {
        let data = parse_profile(SAMPLE_CONFIG, "dev").unwrap();
        assert_eq!(data.region.as_deref(), Some("eu-frankfurt-1"));
        assert_eq!(data.compartment.as_deref(), Some("ocid1.compartment.oc1..ccccexample1"));
    }

    #[test]
    fn test_parse_missing_profile() {
        assert_eq!(parse_profile(SAMPLE_CONFIG, "prod"), None);
    }

    #[test]
    fn test_validate_ocid() {
        assert!(validate_ocid("ocid1.instance.oc1.iad.anexampleinstance1"));
        // Tenancy OCIDs have an empty region part
        assert!(validate_ocid("ocid1.tenancy.oc1..aaaaexampletenancy"));
        assert!(!validate_ocid("ocid2.instance.oc1.iad.anexample1"));
        assert!(!validate_ocid("ocid1.instance.oc1"));
        assert!(!validate_ocid("not-an-ocid"));
        assert!(!validate_ocid("ocid1.instance.oc1.iad.short"));
    }

    #[test]
    fn test_validate_region() {
        assert!(validate_region("us-ashburn-1"));
        assert!(validate_region("eu-frankfurt-1"));
        assert!(!validate_region("ashburn"));
        assert!(!validate_region("US-Ashburn-1"));
        assert!(!validate_region("us--1"));
    }

    #[test]
    fn test_known_regions() {
        let regions = known_regions();
        assert!(!regions.is_empty());
        assert!(regions.contains(&"us-ashburn-1".to_string()));
        assert!(regions.iter().all(|r| validate_region(r)));
    }

    #[tokio::test]
    async fn test_static_credentials_cache() {
        let creds = OciCredentials::from_static("token-1");
        assert_eq!(creds.get_token().await.unwrap(), "token-1");
        assert_eq!(creds.refresh_token().await.unwrap(), "token-1");
    }
}
