//! Check an upgrade against the project's pins

use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use ppmm_ai::config::ScanSettings;
use ppmm_ai::output::{
    approximation_warning, describe_conflict, describe_resolution, CommandOutput, OutputFormat,
};
use ppmm_ai::project::read_current_pins;
use ppmm_ai::resolver::{plan_upgrade, UpgradePlan};
use ppmm_ai::scan::{breaking_change_for, find_impacted_files};

use super::{load_config, registry_client};

/// Source files touched by a known breaking change of the upgraded package
#[derive(Debug, Clone, serde::Serialize)]
pub struct Impact {
    pub summary: String,
    pub files: Vec<PathBuf>,
}

pub fn run(package: &str, root: &Path, format: OutputFormat) -> Result<()> {
    let config = load_config(root)?;
    let pins = read_current_pins(root);
    let registry = registry_client(&config)?;

    if format == OutputFormat::Text {
        println!(
            "Checking {} against {} pin(s)...",
            package.cyan(),
            pins.len()
        );
        println!();
    }

    let plan = plan_upgrade(&registry, package, &pins)?;
    let impact = impact_of(package, root, &config.scan);

    if format == OutputFormat::Json {
        let output = CommandOutput::new("upgrade")
            .with_success(!plan.has_conflicts())
            .with_warnings(approximation_warning(&plan).into_iter().collect())
            .with_data(serde_json::json!({
                "plan": plan,
                "impact": impact,
            }));
        println!("{}", output.to_json()?);
        return Ok(());
    }

    print_plan(&plan);
    if let Some(impact) = &impact {
        print_impact(impact);
    }

    Ok(())
}

/// Breaking-change impact for `package`, if one is known
pub fn impact_of(package: &str, root: &Path, settings: &ScanSettings) -> Option<Impact> {
    let change = breaking_change_for(package)?;
    Some(Impact {
        summary: change.summary.to_string(),
        files: find_impacted_files(root, change, settings),
    })
}

/// Text rendering of an upgrade plan
pub fn print_plan(plan: &UpgradePlan) {
    if let Some(warning) = approximation_warning(plan) {
        println!("{} {}", "⚠".yellow(), warning);
    }

    println!(
        "{} {} upgrade target {}",
        "✓".green(),
        plan.package.cyan(),
        plan.target_version.green()
    );

    if !plan.has_conflicts() {
        println!("{} No conflicts with current pins", "✓".green());
        return;
    }

    println!();
    println!("{} Found {} conflict(s):", "⚠".yellow(), plan.conflicts.len());
    for conflict in &plan.conflicts {
        println!("  {} {}", "⚠".yellow(), describe_conflict(conflict));
    }

    println!();
    println!("{}", "Suggested resolutions:".bold());
    for resolution in &plan.resolutions {
        let line = describe_resolution(resolution);
        if resolution.needs_manual_review() {
            println!("  {} {}", "✗".red(), line.yellow());
        } else {
            println!("  {} {}", "→".cyan(), line);
        }
    }
}

fn print_impact(impact: &Impact) {
    println!();
    println!("{} Known breaking change: {}", "⚠".yellow(), impact.summary);
    if impact.files.is_empty() {
        println!("  {}", "No affected files found".dimmed());
    }
    for file in &impact.files {
        println!("  {} {}", "•".red(), file.display());
    }
}
