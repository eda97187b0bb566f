//! Project pins and generated requirement files
//!
//! Pins come from `project.toml` (`[packages]` table) and `requirements.txt`, the
//! latter taking precedence. Both are read leniently: bad entries are skipped.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PROJECT_CONFIG_FILE: &str = "project.toml";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const DEV_REQUIREMENTS_FILE: &str = "requirements-dev.txt";
pub const RESOLVED_REQUIREMENTS_FILE: &str = "requirements-resolved.txt";
pub const HEALTH_REPORT_FILE: &str = "dependency-health.md";

static REQUIREMENTS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_.+-]+)(?:==([A-Za-z0-9_.+-]+))?").expect("valid requirements pattern")
});

/// Package name → pinned version; an empty version means "unpinned"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CurrentPins(BTreeMap<String, String>);

impl CurrentPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: &str, version: &str) {
        self.0.insert(package.to_string(), version.to_string());
    }

    /// Pinned version, or `None` when absent or unpinned
    pub fn pinned(&self, package: &str) -> Option<&str> {
        self.0
            .get(package)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn contains(&self, package: &str) -> bool {
        self.0.contains_key(package)
    }

    /// Entries sorted by package name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `name==version` lines (or bare `name` when unpinned), sorted by name
    pub fn to_requirement_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(name, version)| {
                if version.is_empty() {
                    name.to_string()
                } else {
                    format!("{}=={}", name, version)
                }
            })
            .collect()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for CurrentPins {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut pins = Self::new();
        for (package, version) in iter {
            pins.insert(package, version);
        }
        pins
    }
}

/// Read the current pins of the project rooted at `root`
pub fn read_current_pins(root: &Path) -> CurrentPins {
    let mut pins = CurrentPins::new();

    let config_path = root.join(PROJECT_CONFIG_FILE);
    if let Some(content) = read_optional(&config_path) {
        merge_project_toml(&mut pins, &content, &config_path);
    }

    let requirements_path = root.join(REQUIREMENTS_FILE);
    if let Some(content) = read_optional(&requirements_path) {
        merge_requirements_txt(&mut pins, &content);
    }

    debug!("Read {} pins from {}", pins.len(), root.display());
    pins
}

fn read_optional(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            warn!("Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

/// Non-empty string entries of the `[packages]` table
fn merge_project_toml(pins: &mut CurrentPins, content: &str, path: &Path) {
    let document: toml::Value = match toml::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring unparsable {}: {}", path.display(), e);
            return;
        }
    };

    let Some(packages) = document.get("packages").and_then(|p| p.as_table()) else {
        return;
    };

    for (name, value) in packages {
        match value.as_str().map(str::trim) {
            Some(version) if !version.is_empty() => pins.insert(name, version),
            Some(_) => {}
            None => debug!("Skipping non-string pin for {} in {}", name, path.display()),
        }
    }
}

/// `name` or `name==version` lines; comments and unmatched lines are skipped
fn merge_requirements_txt(pins: &mut CurrentPins, content: &str) {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(caps) = REQUIREMENTS_LINE.captures(line) else {
            debug!("Skipping requirements line '{}'", line);
            continue;
        };

        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let version = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        pins.insert(name, version);
    }
}

/// Write lines as a newline-terminated file
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write `requirements-resolved.txt` for the merged pins
pub fn write_resolved_requirements(root: &Path, pins: &CurrentPins) -> Result<PathBuf> {
    let path = root.join(RESOLVED_REQUIREMENTS_FILE);
    write_lines(&path, &pins.to_requirement_lines())?;
    Ok(path)
}

/// Write `requirements.txt` in detection order and `requirements-dev.txt` sorted
pub fn write_generated_requirements(root: &Path, lines: &[String]) -> Result<(PathBuf, PathBuf)> {
    let main = root.join(REQUIREMENTS_FILE);
    write_lines(&main, lines)?;

    let mut sorted = lines.to_vec();
    sorted.sort();
    let dev = root.join(DEV_REQUIREMENTS_FILE);
    write_lines(&dev, &sorted)?;

    Ok((main, dev))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pinned_ignores_empty() {
        let pins: CurrentPins = [("requests", "2.0.0"), ("numpy", "")].into_iter().collect();
        assert_eq!(pins.pinned("requests"), Some("2.0.0"));
        assert_eq!(pins.pinned("numpy"), None);
        assert!(pins.contains("numpy"));
        assert_eq!(pins.pinned("flask"), None);
    }

    #[test]
    fn test_requirement_lines() {
        let pins: CurrentPins = [("zeta", "1.0"), ("alpha", "")].into_iter().collect();
        assert_eq!(pins.to_requirement_lines(), vec!["alpha", "zeta==1.0"]);
    }

    #[test]
    fn test_read_project_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            r#"
[project]
name = "demo"
version = "0.1.0"

[packages]
requests = "2.31.0"
numpy = ""
weird = 3
"#,
        )
        .unwrap();

        let pins = read_current_pins(dir.path());
        assert_eq!(pins.pinned("requests"), Some("2.31.0"));
        assert!(!pins.contains("numpy"));
        assert!(!pins.contains("weird"));
    }

    #[test]
    fn test_requirements_txt_overrides_project_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[packages]\nrequests = \"2.0.0\"\nflask = \"2.3.0\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(REQUIREMENTS_FILE),
            "# pinned\nrequests==2.31.0\n\nnumpy\npandas (>=2.1.0,<3.0.0)\n==broken\n",
        )
        .unwrap();

        let pins = read_current_pins(dir.path());
        assert_eq!(pins.pinned("requests"), Some("2.31.0"));
        assert_eq!(pins.pinned("flask"), Some("2.3.0"));
        assert!(pins.contains("numpy"));
        assert_eq!(pins.pinned("numpy"), None);
        assert_eq!(pins.pinned("pandas"), None);
        assert_eq!(pins.len(), 4);
    }

    #[test]
    fn test_unparsable_project_toml_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG_FILE), "[packages\nrequests = ").unwrap();
        assert!(read_current_pins(dir.path()).is_empty());
    }

    #[test]
    fn test_write_generated_requirements() {
        let dir = TempDir::new().unwrap();
        let lines = vec!["requests (>=2.31.0,<3.0.0)".to_string(), "numpy".to_string()];
        let (main, dev) = write_generated_requirements(dir.path(), &lines).unwrap();

        assert_eq!(
            fs::read_to_string(main).unwrap(),
            "requests (>=2.31.0,<3.0.0)\nnumpy\n"
        );
        assert_eq!(
            fs::read_to_string(dev).unwrap(),
            "numpy\nrequests (>=2.31.0,<3.0.0)\n"
        );
    }

    #[test]
    fn test_write_resolved_requirements() {
        let dir = TempDir::new().unwrap();
        let pins: CurrentPins = [("pandas", "2.1.0"), ("numpy", "1.26.0"), ("pytz", "")]
            .into_iter()
            .collect();

        let path = write_resolved_requirements(dir.path(), &pins).unwrap();
        assert_eq!(path, dir.path().join(RESOLVED_REQUIREMENTS_FILE));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "numpy==1.26.0\npandas==2.1.0\npytz\n"
        );
    }
}
