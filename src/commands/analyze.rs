//! Detect the third-party packages a project imports

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use ppmm_ai::output::{CommandOutput, OutputFormat};
use ppmm_ai::scan::detect_packages;

use super::load_config;

pub fn run(root: &Path, format: OutputFormat) -> Result<()> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let config = load_config(root)?;
    let packages = detect_packages(root, &config.scan);

    if format == OutputFormat::Json {
        let output = CommandOutput::new("analyze").with_data(serde_json::json!({
            "path": root.display().to_string(),
            "packages": packages,
        }));
        println!("{}", output.to_json()?);
        return Ok(());
    }

    println!("{}", "Detected packages:".bold());
    if packages.is_empty() {
        println!("  {}", "No third-party imports found".dimmed());
    } else {
        for package in &packages {
            println!("  {} {}", "•".cyan(), package);
        }
    }

    Ok(())
}
