//! Generate requirement files from detected imports

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use ppmm_ai::output::{CommandOutput, OutputFormat};
use ppmm_ai::registry::PackageRegistry;
use ppmm_ai::requirement::compatible_range_line;
use ppmm_ai::scan::detect_packages;

use super::{load_config, registry_client, sweep_progress};

pub fn run(root: &Path, format: OutputFormat) -> Result<()> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let config = load_config(root)?;
    let packages = detect_packages(root, &config.scan);
    let registry = registry_client(&config)?;

    let pb = sweep_progress(packages.len(), format);
    let mut lines = Vec::with_capacity(packages.len());
    let mut unknown = Vec::new();

    for package in &packages {
        pb.set_message(package.clone());
        let latest = registry.latest_version(package);
        if latest.is_none() {
            unknown.push(package.clone());
        }
        lines.push(compatible_range_line(package, latest.as_deref()));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let (main, dev) = ppmm_ai::project::write_generated_requirements(root, &lines)?;

    if format == OutputFormat::Json {
        let warnings = unknown
            .iter()
            .map(|p| format!("No release information for {}", p))
            .collect();
        let output = CommandOutput::new("gen")
            .with_warnings(warnings)
            .with_data(serde_json::json!({
                "requirements": lines,
                "files": [main.display().to_string(), dev.display().to_string()],
            }));
        println!("{}", output.to_json()?);
        return Ok(());
    }

    for line in &lines {
        println!("  {}", line);
    }
    for package in &unknown {
        println!("{} No release information for {}", "⚠".yellow(), package.cyan());
    }
    println!();
    println!(
        "{} Generated {} and {}",
        "✓".green().bold(),
        main.display().to_string().cyan(),
        dev.display().to_string().cyan()
    );

    Ok(())
}
