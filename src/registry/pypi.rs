//! PyPI JSON API client

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::{sort_versions, DeclaredRequirements, PackageRegistry};
use crate::config::RegistrySettings;
use crate::error::RegistryError;

/// `GET /pypi/<project>/json` and `GET /pypi/<project>/<version>/json`
#[derive(Debug, Deserialize)]
struct ProjectResponse {
    info: ProjectInfo,
    #[serde(default)]
    releases: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
}

/// Blocking client for a PyPI-compatible JSON index
#[derive(Debug, Clone)]
pub struct PypiClient {
    client: Client,
    index_url: String,
}

impl PypiClient {
    pub fn new(settings: &RegistrySettings) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| RegistryError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            index_url: settings.index_url.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let invalid = || RegistryError::InvalidUrl {
            url: self.index_url.clone(),
        };

        let mut url = Url::parse(&self.index_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments)
            .push("json");
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, package: &str) -> Result<T, RegistryError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .map_err(|e| RegistryError::network(format!("Failed to fetch {}", url), e))?;

        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .map_err(|e| RegistryError::network(format!("Failed to parse {}", url), e)),
            StatusCode::NOT_FOUND => Err(RegistryError::NotFound {
                name: package.to_string(),
            }),
            status => Err(RegistryError::Status {
                status,
                url: url.to_string(),
            }),
        }
    }

    fn fetch_project(&self, package: &str) -> Result<ProjectResponse, RegistryError> {
        let url = self.endpoint(&[package])?;
        self.get_json(url, package)
    }

    fn fetch_release(&self, package: &str, version: &str) -> Result<ProjectResponse, RegistryError> {
        let url = self.endpoint(&[package, version])?;
        self.get_json(url, package)
    }

    /// Project metadata, with failures logged and dropped
    fn project_or_none(&self, package: &str) -> Option<ProjectResponse> {
        match self.fetch_project(package) {
            Ok(project) => Some(project),
            Err(RegistryError::NotFound { .. }) => {
                debug!("{} is not on the index", package);
                None
            }
            Err(e) => {
                warn!("Registry lookup for {} failed: {}", package, e);
                None
            }
        }
    }
}

impl PackageRegistry for PypiClient {
    fn versions(&self, package: &str) -> Vec<String> {
        let Some(project) = self.project_or_none(package) else {
            return Vec::new();
        };
        let mut versions: Vec<String> = project.releases.into_keys().collect();
        sort_versions(&mut versions);
        versions
    }

    fn latest_version(&self, package: &str) -> Option<String> {
        self.project_or_none(package)?
            .info
            .version
            .filter(|v| !v.is_empty())
    }

    fn requirements(&self, package: &str, version: &str) -> DeclaredRequirements {
        match self.fetch_release(package, version) {
            Ok(release) => {
                return DeclaredRequirements::exact(release.info.requires_dist.unwrap_or_default())
            }
            Err(e) => debug!("No metadata for {} {}: {}", package, version, e),
        }

        let Some(project) = self.project_or_none(package) else {
            return DeclaredRequirements::unavailable();
        };

        let requirements = project.info.requires_dist.unwrap_or_default();
        if project.info.version.as_deref() == Some(version) {
            DeclaredRequirements::exact(requirements)
        } else {
            warn!(
                "Using latest release requirements of {} in place of {}",
                package, version
            );
            DeclaredRequirements::latest_fallback(requirements)
        }
    }
}
