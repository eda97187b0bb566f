use chrono::Utc;
use clap::ValueEnum;
use serde::Serialize;

use crate::registry::RequirementSource;
use crate::resolver::{Conflict, Resolution, UpgradePlan};
use crate::version::format_constraints;

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Standardized output structure for all commands
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub command: String,
    pub success: bool,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandOutput {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            success: true,
            timestamp: Utc::now().to_rfc3339(),
            warnings: Vec::new(),
            data: None,
        }
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One row of the dependency health table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRow {
    pub package: String,
    pub current: String,
    pub latest: String,
    /// `"outdated"` or empty
    pub status: String,
    pub vulns: usize,
}

/// Markdown table written to `dependency-health.md`
pub fn render_health_markdown(rows: &[HealthRow]) -> Vec<String> {
    let mut lines = vec![
        "# Dependency Health".to_string(),
        String::new(),
        "| Package | Current | Latest | Status | Vulns |".to_string(),
        "|---|---|---|---|---|".to_string(),
    ];
    lines.extend(rows.iter().map(|r| {
        format!(
            "| {} | {} | {} | {} | {} |",
            r.package, r.current, r.latest, r.status, r.vulns
        )
    }));
    lines
}

/// `"<dep> requires <constraints> while current is <pin>"`
pub fn describe_conflict(conflict: &Conflict) -> String {
    format!(
        "{} requires {} while current is {}",
        conflict.dependency,
        format_constraints(&conflict.required),
        conflict.current
    )
}

/// `"<package> → <version>"` or `"<package> → manual review"`
pub fn describe_resolution(resolution: &Resolution) -> String {
    format!(
        "{} → {}",
        resolution.package,
        resolution.suggested.as_deref().unwrap_or("manual review")
    )
}

/// Warning text when requirements of a different release had to be used
pub fn approximation_warning(plan: &UpgradePlan) -> Option<String> {
    if plan.requirement_source != RequirementSource::LatestFallback {
        return None;
    }
    Some(format!(
        "Requirements of {} {} were unavailable; used the latest release's metadata instead",
        plan.package, plan.target_version
    ))
}
