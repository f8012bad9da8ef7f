//! Configuration Management
//!
//! Handles persistent configuration storage for ociprov.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Last used OCI config profile
    #[serde(default)]
    pub profile: Option<String>,
    /// Last used region
    #[serde(default)]
    pub region: Option<String>,
    /// Last used compartment OCID
    #[serde(default)]
    pub compartment: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ociprov").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective profile (CLI > config > OCI_CLI_PROFILE > DEFAULT)
    pub fn effective_profile(&self, cli: Option<&str>) -> String {
        cli.map(|p| p.to_string())
            .or_else(|| self.profile.clone())
            .unwrap_or_else(crate::oci::auth::default_profile)
    }

    /// Get effective region (CLI > config > environment)
    pub fn effective_region(&self, cli: Option<&str>) -> Option<String> {
        cli.map(|r| r.to_string())
            .or_else(|| self.region.clone())
            .or_else(crate::oci::auth::default_region)
    }

    /// Get effective compartment (CLI > config > environment)
    pub fn effective_compartment(&self, cli: Option<&str>) -> Option<String> {
        cli.map(|c| c.to_string())
            .or_else(|| self.compartment.clone())
            .or_else(crate::oci::auth::default_compartment)
    }

    /// Set compartment and save
    pub fn set_compartment(&mut self, compartment: &str) -> Result<()> {
        self.compartment = Some(compartment.to_string());
        self.save()
    }
}
