//! Configuration commands for ppmm-ai
//! Provides `ppmm-ai config init` and `ppmm-ai config validate` subcommands.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use ppmm_ai::config::{ToolConfig, CONFIG_FILE};
use ppmm_ai::output::{CommandOutput, OutputFormat};

/// Config subcommand action
#[derive(Debug, Clone)]
pub enum ConfigAction {
    Init { force: bool },
    Validate,
}

/// Run the config command
pub fn run(action: ConfigAction, root: &Path, format: OutputFormat) -> Result<()> {
    match action {
        ConfigAction::Init { force } => run_init(force, root, format),
        ConfigAction::Validate => run_validate(root, format),
    }
}

/// Create default .ppmm-ai.toml configuration file
fn run_init(force: bool, root: &Path, format: OutputFormat) -> Result<()> {
    let path = root.join(CONFIG_FILE);
    let shown = path.display().to_string();

    if path.exists() && !force {
        if format == OutputFormat::Json {
            let output = CommandOutput::new("config init")
                .with_success(false)
                .with_data(serde_json::json!({
                    "error": "Config file already exists",
                    "path": shown,
                    "hint": "Use --force to overwrite"
                }));
            println!("{}", output.to_json()?);
        } else {
            println!("{} {} already exists", "Error:".red().bold(), shown.cyan());
            println!("Use {} to overwrite.", "--force".cyan());
        }
        return Ok(());
    }

    let config = ToolConfig::create_default(&path)?;

    if format == OutputFormat::Json {
        let output = CommandOutput::new("config init").with_data(serde_json::json!({
            "path": shown,
            "created": true,
            "config": config,
        }));
        println!("{}", output.to_json()?);
    } else {
        println!("{} Created {}", "✓".green().bold(), shown.cyan());
        println!();
        println!("You can customize:");
        println!("  • {} - Package index URL and timeouts", "[registry]".cyan());
        println!("  • {} - OSV vulnerability lookups", "[advisories]".cyan());
        println!("  • {} - Excluded directories and module aliases", "[scan]".cyan());
    }

    Ok(())
}

/// Validate the configuration file
fn run_validate(root: &Path, format: OutputFormat) -> Result<()> {
    let path = root.join(CONFIG_FILE);
    let shown = path.display().to_string();

    if !path.exists() {
        if format == OutputFormat::Json {
            let output = CommandOutput::new("config validate")
                .with_success(false)
                .with_data(serde_json::json!({
                    "error": "Config file not found",
                    "path": shown,
                    "hint": "Run `ppmm-ai config init` to create one"
                }));
            println!("{}", output.to_json()?);
        } else {
            println!("{} {} not found", "Error:".red().bold(), shown.cyan());
            println!("Run {} to create one.", "ppmm-ai config init".cyan());
        }
        return Ok(());
    }

    let checked = ToolConfig::load_from(&path).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match checked {
        Ok(config) => {
            if format == OutputFormat::Json {
                let output = CommandOutput::new("config validate").with_data(serde_json::json!({
                    "path": shown,
                    "valid": true,
                    "index_url": config.registry.index_url,
                    "advisories": config.advisories.enabled,
                    "aliases": config.scan.aliases.len()
                }));
                println!("{}", output.to_json()?);
            } else {
                println!("{} {} is valid", "✓".green().bold(), shown.cyan());
                println!();
                println!("  {} Index: {}", "→".cyan(), config.registry.index_url);
                if !config.advisories.enabled {
                    println!("  {} Vulnerability lookups disabled", "→".cyan());
                }
                if !config.scan.exclude_dirs.is_empty() {
                    println!(
                        "  {} excluded directories: {}",
                        config.scan.exclude_dirs.len(),
                        config.scan.exclude_dirs.join(", ").dimmed()
                    );
                }
                if !config.scan.aliases.is_empty() {
                    println!("  {} module aliases", config.scan.aliases.len());
                }
            }
        }
        Err(e) => {
            if format == OutputFormat::Json {
                let output = CommandOutput::new("config validate")
                    .with_success(false)
                    .with_data(serde_json::json!({
                        "path": shown,
                        "valid": false,
                        "error": format!("{:#}", e)
                    }));
                println!("{}", output.to_json()?);
            }
            return Err(e.context(format!("{} is invalid", shown)));
        }
    }

    Ok(())
}
