//! CLI subcommands

pub mod analyze;
pub mod config;
pub mod dashboard;
pub mod generate;
pub mod pins;
pub mod resolve;
pub mod upgrade;
pub mod versions;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use ppmm_ai::{OutputFormat, PypiClient, ToolConfig};

/// Load `.ppmm-ai.toml` from the project root (defaults when absent)
pub fn load_config(root: &Path) -> Result<ToolConfig> {
    let config = ToolConfig::load(root)?;
    config.validate()?;
    Ok(config)
}

/// PyPI client for the configured index
pub fn registry_client(config: &ToolConfig) -> Result<PypiClient> {
    PypiClient::new(&config.registry)
        .with_context(|| format!("Failed to set up registry client for {}", config.registry.index_url))
}

/// Progress bar over a registry sweep; hidden in JSON mode
pub fn sweep_progress(len: usize, format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue.bold} [{pos}/{len}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
