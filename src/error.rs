//! Error types for ppmm-ai
//!
//! Data-quality problems (bad declarations, unreachable registry) never surface here;
//! they are recovered where they happen. These types cover the few failures that do
//! reach a caller.

use thiserror::Error;

/// Failure of a top-level resolution attempt
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Package not found: {name}")]
    PackageNotFound { name: String },
}

/// Failure inside a registry client
///
/// Clients log these and degrade to "no data"; they are not returned from the
/// [`PackageRegistry`](crate::registry::PackageRegistry) trait.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid registry URL '{url}'")]
    InvalidUrl { url: String },

    #[error("Package '{name}' not found")]
    NotFound { name: String },

    #[error("Registry returned status {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },
}

impl RegistryError {
    pub fn network(message: String, source: reqwest::Error) -> Self {
        Self::Network { message, source }
    }
}

/// Configuration file problems
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration field '{field}' is invalid: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
