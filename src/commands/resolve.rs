//! Resolve upgrade conflicts and write requirements-resolved.txt

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use ppmm_ai::output::{approximation_warning, CommandOutput, OutputFormat};
use ppmm_ai::project::{read_current_pins, write_resolved_requirements, RESOLVED_REQUIREMENTS_FILE};
use ppmm_ai::resolver::plan_upgrade;

use super::upgrade::print_plan;
use super::{load_config, registry_client};

pub fn run(package: &str, root: &Path, dry_run: bool, format: OutputFormat) -> Result<()> {
    let config = load_config(root)?;
    let pins = read_current_pins(root);
    let registry = registry_client(&config)?;

    if format == OutputFormat::Text {
        println!("Analyzing dependency conflicts for {}...", package.cyan());
        println!();
    }

    let plan = plan_upgrade(&registry, package, &pins)?;
    let merged = plan.merged_pins(&pins);
    let unresolved: Vec<&str> = plan
        .resolutions
        .iter()
        .filter(|r| r.needs_manual_review())
        .map(|r| r.package.as_str())
        .collect();

    let written = if dry_run {
        None
    } else {
        Some(write_resolved_requirements(root, &merged)?)
    };

    if format == OutputFormat::Json {
        let mut warnings: Vec<String> = approximation_warning(&plan).into_iter().collect();
        warnings.extend(
            unresolved
                .iter()
                .map(|p| format!("{} needs manual review", p)),
        );
        let output = CommandOutput::new("resolve")
            .with_success(unresolved.is_empty())
            .with_warnings(warnings)
            .with_data(serde_json::json!({
                "plan": plan,
                "resolved": merged,
                "dry_run": dry_run,
                "written": written.as_ref().map(|p| p.display().to_string()),
            }));
        println!("{}", output.to_json()?);
        return Ok(());
    }

    print_plan(&plan);
    println!();

    match written {
        Some(path) => println!(
            "{} Wrote {} package(s) to {}",
            "✓".green().bold(),
            merged.len(),
            path.display().to_string().cyan()
        ),
        None => {
            println!(
                "{}",
                format!("Dry run - {} would contain:", RESOLVED_REQUIREMENTS_FILE).yellow()
            );
            for line in merged.to_requirement_lines() {
                println!("  {}", line);
            }
        }
    }

    if !unresolved.is_empty() {
        println!(
            "{} Manual review needed for: {}",
            "⚠".yellow(),
            unresolved.join(", ")
        );
    }

    Ok(())
}
