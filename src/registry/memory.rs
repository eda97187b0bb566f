//! Fixture-backed registry

use std::collections::BTreeMap;

use super::{sort_versions, DeclaredRequirements, PackageRegistry};
use crate::version::VersionKey;

#[derive(Debug, Clone, Default)]
struct PackageEntry {
    latest: Option<String>,
    releases: BTreeMap<String, Option<Vec<String>>>,
}

/// In-memory package index: package → versions → declared requirements
///
/// A release registered with [`with_release_without_metadata`] exists in the version
/// list but has no per-version metadata, which exercises the latest-release fallback.
///
/// [`with_release_without_metadata`]: InMemoryRegistry::with_release_without_metadata
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    packages: BTreeMap<String, PackageEntry>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a release together with its requirement declarations
    pub fn with_release(mut self, package: &str, version: &str, requirements: &[&str]) -> Self {
        let reqs = requirements.iter().map(|r| r.to_string()).collect();
        self.entry(package)
            .releases
            .insert(version.to_string(), Some(reqs));
        self
    }

    /// Add a release whose own metadata cannot be retrieved
    pub fn with_release_without_metadata(mut self, package: &str, version: &str) -> Self {
        self.entry(package).releases.insert(version.to_string(), None);
        self
    }

    /// Override the version reported as latest (defaults to the highest release)
    pub fn with_latest(mut self, package: &str, version: &str) -> Self {
        self.entry(package).latest = Some(version.to_string());
        self
    }

    fn entry(&mut self, package: &str) -> &mut PackageEntry {
        self.packages.entry(package.to_string()).or_default()
    }

    fn latest_of(entry: &PackageEntry) -> Option<String> {
        entry.latest.clone().or_else(|| {
            entry
                .releases
                .keys()
                .max_by_key(|v| VersionKey::parse(v))
                .cloned()
        })
    }
}

impl PackageRegistry for InMemoryRegistry {
    fn versions(&self, package: &str) -> Vec<String> {
        let Some(entry) = self.packages.get(package) else {
            return Vec::new();
        };
        let mut versions: Vec<String> = entry.releases.keys().cloned().collect();
        sort_versions(&mut versions);
        versions
    }

    fn latest_version(&self, package: &str) -> Option<String> {
        self.packages.get(package).and_then(Self::latest_of)
    }

    fn requirements(&self, package: &str, version: &str) -> DeclaredRequirements {
        let Some(entry) = self.packages.get(package) else {
            return DeclaredRequirements::unavailable();
        };

        if let Some(Some(reqs)) = entry.releases.get(version) {
            return DeclaredRequirements::exact(reqs.clone());
        }

        let latest_reqs = Self::latest_of(entry)
            .and_then(|latest| entry.releases.get(&latest).cloned().flatten());

        match latest_reqs {
            Some(reqs) => DeclaredRequirements::latest_fallback(reqs),
            None => DeclaredRequirements::unavailable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RequirementSource;

    fn fixture() -> InMemoryRegistry {
        InMemoryRegistry::new()
            .with_release("requests", "2.31.0", &["urllib3 (>=1.21.1,<3)"])
            .with_release("requests", "2.9.0", &[])
            .with_release_without_metadata("requests", "2.10.0")
    }

    #[test]
    fn test_versions_are_ascending() {
        assert_eq!(
            fixture().versions("requests"),
            vec!["2.9.0", "2.10.0", "2.31.0"]
        );
        assert!(fixture().versions("missing").is_empty());
    }

    #[test]
    fn test_latest_defaults_to_highest() {
        assert_eq!(fixture().latest_version("requests").as_deref(), Some("2.31.0"));
        let pinned = fixture().with_latest("requests", "2.9.0");
        assert_eq!(pinned.latest_version("requests").as_deref(), Some("2.9.0"));
        assert_eq!(fixture().latest_version("missing"), None);
    }

    #[test]
    fn test_requirements_fallback() {
        let registry = fixture();

        let exact = registry.requirements("requests", "2.9.0");
        assert_eq!(exact.source, RequirementSource::Exact);
        assert!(exact.requirements.is_empty());

        let fallback = registry.requirements("requests", "2.10.0");
        assert_eq!(fallback.source, RequirementSource::LatestFallback);
        assert_eq!(fallback.requirements, vec!["urllib3 (>=1.21.1,<3)"]);

        let missing = registry.requirements("nope", "1.0");
        assert_eq!(missing.source, RequirementSource::Unavailable);
    }
}
