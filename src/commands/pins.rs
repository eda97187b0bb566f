//! Show the project's current pins

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use ppmm_ai::output::{CommandOutput, OutputFormat};
use ppmm_ai::project::{read_current_pins, PROJECT_CONFIG_FILE, REQUIREMENTS_FILE};

pub fn run(root: &Path, format: OutputFormat) -> Result<()> {
    let pins = read_current_pins(root);

    if format == OutputFormat::Json {
        let output = CommandOutput::new("pins").with_data(serde_json::json!({
            "path": root.display().to_string(),
            "pins": pins,
        }));
        println!("{}", output.to_json()?);
        return Ok(());
    }

    if pins.is_empty() {
        println!(
            "{} No pins found in {} or {}",
            "⚠".yellow(),
            PROJECT_CONFIG_FILE.cyan(),
            REQUIREMENTS_FILE.cyan()
        );
        return Ok(());
    }

    println!("{}", "Current pins:".bold());
    for (package, version) in pins.iter() {
        if version.is_empty() {
            println!("  {} {}", package.cyan(), "(unpinned)".dimmed());
        } else {
            println!("  {} {}", package.cyan(), version);
        }
    }

    Ok(())
}
