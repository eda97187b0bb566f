//! List available versions of a package on the index

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use ppmm_ai::output::{CommandOutput, OutputFormat};
use ppmm_ai::registry::PackageRegistry;
use ppmm_ai::requirement::parse_constraint_list;
use ppmm_ai::version::{format_constraints, satisfies_all, Constraint};

use super::{load_config, registry_client};

pub fn run(
    package: &str,
    constraint: Option<&str>,
    limit: usize,
    show_all: bool,
    root: &Path,
    format: OutputFormat,
) -> Result<()> {
    let constraints = match constraint {
        Some(list) => {
            let parsed = parse_constraint_list(list);
            if parsed.is_empty() {
                bail!("No valid constraint in '{}' (expected e.g. \">=1.5,<2.5\")", list);
            }
            parsed
        }
        None => Vec::new(),
    };

    if format != OutputFormat::Json {
        println!("Searching versions for {}...", package.cyan());
        println!();
    }

    let config = load_config(root)?;
    let registry = registry_client(&config)?;

    let known = registry.versions(package);
    if known.is_empty() {
        bail!("No versions found for '{}'", package);
    }
    let latest = registry.latest_version(package);
    let total = known.len();

    let display_versions = newest_matching(known, &constraints, limit, show_all);

    if format == OutputFormat::Json {
        let output = CommandOutput::new("versions").with_data(serde_json::json!({
            "package": package,
            "constraint": constraint,
            "latest": latest,
            "versions": display_versions,
            "total_available": total,
        }));
        println!("{}", output.to_json()?);
        return Ok(());
    }

    println!("{}", "Available Versions:".bold());
    if display_versions.is_empty() {
        println!("  {}", "No versions found matching criteria".dimmed());
    } else {
        for v in &display_versions {
            if latest.as_deref() == Some(v.as_str()) {
                println!("  {} {}", v.green(), "(latest)".dimmed());
            } else {
                println!("  {}", v);
            }
        }
    }

    if !constraints.is_empty() {
        println!();
        let shown = format_constraints(&constraints);
        if display_versions.is_empty() {
            println!("{} No versions match constraint '{}'", "⚠".yellow(), shown);
            println!("  Try a different constraint or use --all to see all versions");
        } else {
            println!(
                "{} {} versions match constraint '{}'",
                "✓".green(),
                display_versions.len(),
                shown
            );
        }
    }

    println!();
    println!("{}", "Usage:".dimmed());
    if let Some(newest) = display_versions.first() {
        println!("  pip install {}=={}", package, newest);
    }

    Ok(())
}

/// Versions newest first, filtered and truncated
fn newest_matching(
    mut versions: Vec<String>,
    constraints: &[Constraint],
    limit: usize,
    show_all: bool,
) -> Vec<String> {
    versions.reverse();
    let matching = versions.into_iter().filter(|v| satisfies_all(v, constraints));
    if show_all {
        matching.collect()
    } else {
        matching.take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_newest_matching() {
        let known = versions(&["1.0", "1.5", "2.0", "2.5"]);
        let constraints = parse_constraint_list(">=1.5,<2.5");
        assert_eq!(
            newest_matching(known.clone(), &constraints, 10, false),
            vec!["2.0", "1.5"]
        );
        assert_eq!(newest_matching(known.clone(), &[], 2, false), vec!["2.5", "2.0"]);
        assert_eq!(newest_matching(known, &[], 1, true).len(), 4);
    }
}
