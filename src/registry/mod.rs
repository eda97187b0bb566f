//! Package registry access
//!
//! The resolver only talks to [`PackageRegistry`]. [`PypiClient`] is the HTTP
//! implementation, [`InMemoryRegistry`] a fixture-backed one for tests and offline use.
//! Lookups never fail: any transport or decoding problem degrades to "no data".

pub mod memory;
pub mod osv;
pub mod pypi;

use serde::Serialize;

pub use memory::InMemoryRegistry;
pub use osv::{NoAdvisories, OsvClient, VulnerabilitySource};
pub use pypi::PypiClient;

/// Where a set of declared requirements came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementSource {
    /// Metadata of the exact requested version
    Exact,
    /// The exact version was unavailable; these are the latest release's requirements
    LatestFallback,
    /// Nothing could be retrieved
    Unavailable,
}

/// Requirement strings declared by one package version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredRequirements {
    pub requirements: Vec<String>,
    pub source: RequirementSource,
}

impl DeclaredRequirements {
    pub fn exact(requirements: Vec<String>) -> Self {
        Self {
            requirements,
            source: RequirementSource::Exact,
        }
    }

    pub fn latest_fallback(requirements: Vec<String>) -> Self {
        Self {
            requirements,
            source: RequirementSource::LatestFallback,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            requirements: Vec::new(),
            source: RequirementSource::Unavailable,
        }
    }

    /// True when the requirements are not those of the requested version
    pub fn is_approximate(&self) -> bool {
        self.source == RequirementSource::LatestFallback
    }
}

/// Narrow query interface over a package index
pub trait PackageRegistry {
    /// Known versions, ascending by [`VersionKey`](crate::version::VersionKey); empty on failure
    fn versions(&self, package: &str) -> Vec<String>;

    /// Latest published version, if the package exists
    fn latest_version(&self, package: &str) -> Option<String>;

    /// Requirement declarations of `package` at `version`
    fn requirements(&self, package: &str, version: &str) -> DeclaredRequirements;
}

impl<R: PackageRegistry + ?Sized> PackageRegistry for &R {
    fn versions(&self, package: &str) -> Vec<String> {
        (**self).versions(package)
    }

    fn latest_version(&self, package: &str) -> Option<String> {
        (**self).latest_version(package)
    }

    fn requirements(&self, package: &str, version: &str) -> DeclaredRequirements {
        (**self).requirements(package, version)
    }
}

/// Sort version strings ascending by [`VersionKey`](crate::version::VersionKey)
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by_cached_key(|v| crate::version::VersionKey::parse(v));
}
