//! Dependency health report

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use ppmm_ai::output::{render_health_markdown, CommandOutput, HealthRow, OutputFormat};
use ppmm_ai::project::{read_current_pins, write_lines, HEALTH_REPORT_FILE};
use ppmm_ai::registry::{NoAdvisories, OsvClient, PackageRegistry, VulnerabilitySource};
use ppmm_ai::version::VersionKey;

use super::{load_config, registry_client, sweep_progress};

pub fn run(root: &Path, format: OutputFormat) -> Result<()> {
    let config = load_config(root)?;
    let pins = read_current_pins(root);
    let registry = registry_client(&config)?;

    let advisories: Box<dyn VulnerabilitySource> = if config.advisories.enabled {
        Box::new(OsvClient::new(&config.advisories, &config.registry)?)
    } else {
        Box::new(NoAdvisories)
    };

    let pb = sweep_progress(pins.len(), format);
    let mut rows = Vec::with_capacity(pins.len());
    for (package, current) in pins.iter() {
        pb.set_message(package.to_string());
        rows.push(health_row(&registry, advisories.as_ref(), package, current));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let report = root.join(HEALTH_REPORT_FILE);
    write_lines(&report, &render_health_markdown(&rows))?;

    if format == OutputFormat::Json {
        let output = CommandOutput::new("dashboard").with_data(serde_json::json!({
            "report": report.display().to_string(),
            "packages": rows,
        }));
        println!("{}", output.to_json()?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("  {}", "No pinned packages found".dimmed());
    }
    for row in &rows {
        let status = if row.status.is_empty() {
            "up to date".green()
        } else {
            row.status.yellow()
        };
        let vulns = if row.vulns > 0 {
            format!("{} vulns", row.vulns).red()
        } else {
            "no known vulns".dimmed()
        };
        println!(
            "  {} {} → {} ({}, {})",
            row.package.cyan(),
            display_or_dash(&row.current),
            display_or_dash(&row.latest),
            status,
            vulns
        );
    }
    println!();
    println!(
        "{} Dashboard written to {}",
        "✓".green().bold(),
        report.display().to_string().cyan()
    );

    Ok(())
}

fn health_row<R: PackageRegistry>(
    registry: &R,
    advisories: &dyn VulnerabilitySource,
    package: &str,
    current: &str,
) -> HealthRow {
    let latest = registry.latest_version(package).unwrap_or_default();
    let outdated = !latest.is_empty()
        && !current.is_empty()
        && VersionKey::parse(&latest) > VersionKey::parse(current);

    HealthRow {
        package: package.to_string(),
        current: current.to_string(),
        latest,
        status: if outdated { "outdated".to_string() } else { String::new() },
        vulns: advisories.vulnerability_count(package),
    }
}

fn display_or_dash(version: &str) -> &str {
    if version.is_empty() {
        "-"
    } else {
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppmm_ai::registry::InMemoryRegistry;

    struct FixedAdvisories(usize);

    impl VulnerabilitySource for FixedAdvisories {
        fn vulnerability_count(&self, _package: &str) -> usize {
            self.0
        }
    }

    #[test]
    fn test_health_row_outdated() {
        let registry = InMemoryRegistry::new()
            .with_release("requests", "2.0.0", &[])
            .with_release("requests", "2.31.0", &[]);

        let row = health_row(&registry, &FixedAdvisories(2), "requests", "2.0.0");
        assert_eq!(row.latest, "2.31.0");
        assert_eq!(row.status, "outdated");
        assert_eq!(row.vulns, 2);
    }

    #[test]
    fn test_health_row_unknown_or_unpinned() {
        let registry = InMemoryRegistry::new().with_release("numpy", "1.26.0", &[]);

        let unpinned = health_row(&registry, &NoAdvisories, "numpy", "");
        assert_eq!(unpinned.latest, "1.26.0");
        assert_eq!(unpinned.status, "");

        let unknown = health_row(&registry, &NoAdvisories, "ghost", "1.0");
        assert_eq!(unknown.latest, "");
        assert_eq!(unknown.status, "");
    }
}
