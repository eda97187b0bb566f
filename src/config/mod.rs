//! Configuration module for ppmm-ai
//! Handles loading and parsing of `.ppmm-ai.toml` configuration files.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Default configuration file name
pub const CONFIG_FILE: &str = ".ppmm-ai.toml";

pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";
pub const DEFAULT_OSV_URL: &str = "https://api.osv.dev/v1/query";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Package index settings
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Vulnerability advisory lookups
    #[serde(default)]
    pub advisories: AdvisorySettings,

    /// Source scanning settings
    #[serde(default)]
    pub scan: ScanSettings,
}

/// Package index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Base URL of a PyPI-compatible JSON API
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Vulnerability advisory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorySettings {
    /// Query OSV for vulnerability counts in the dashboard
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_osv_url")]
    pub api_url: String,

    #[serde(default = "default_ecosystem")]
    pub ecosystem: String,
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_osv_url(),
            ecosystem: default_ecosystem(),
        }
    }
}

/// Source scanning settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Extra directory names to skip (in addition to venvs, caches and .git)
    #[serde(default)]
    pub exclude_dirs: Vec<String>,

    /// Keep standard-library modules in the detected set
    #[serde(default)]
    pub include_stdlib: bool,

    /// Module name → distribution name overrides
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

fn default_index_url() -> String {
    DEFAULT_INDEX_URL.to_string()
}

fn default_osv_url() -> String {
    DEFAULT_OSV_URL.to_string()
}

fn default_ecosystem() -> String {
    "PyPI".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("ppmm-ai/{}", crate::VERSION)
}

impl ToolConfig {
    /// Load configuration from a project root, falling back to defaults
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from(&root.join(CONFIG_FILE))
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ToolConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let header = "# ppmm-ai configuration\n# Registry, advisory and source-scan settings\n\n";
        let full_content = format!("{}{}", header, content);

        fs::write(path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Create a default configuration file
    pub fn create_default(path: &Path) -> Result<Self> {
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "registry.timeout_seconds",
                "must be greater than zero",
            ));
        }

        Url::parse(&self.registry.index_url).map_err(|e| {
            ConfigError::invalid("registry.index_url", format!("{}: {}", self.registry.index_url, e))
        })?;

        if self.advisories.enabled {
            Url::parse(&self.advisories.api_url).map_err(|e| {
                ConfigError::invalid("advisories.api_url", format!("{}: {}", self.advisories.api_url, e))
            })?;
        }

        if let Some((module, _)) = self
            .scan
            .aliases
            .iter()
            .find(|(_, package)| package.trim().is_empty())
        {
            return Err(ConfigError::invalid(
                "scan.aliases",
                format!("alias for '{}' has an empty package name", module),
            ));
        }

        Ok(())
    }
}
