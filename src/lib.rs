//! ppmm-ai - Python dependency conflict detection and resolution
//!
//! Given a project's pinned dependencies and a package to upgrade, finds the pins
//! that violate the upgrade target's declared requirements and suggests the newest
//! registry versions that satisfy them. Also scans Python sources for imports,
//! generates requirement files and renders a dependency health report.

pub mod config;
pub mod error;
pub mod output;
pub mod project;
pub mod registry;
pub mod requirement;
pub mod resolver;
pub mod scan;
pub mod version;

// Re-export main types for convenience
pub use config::ToolConfig;
pub use error::{ConfigError, RegistryError, ResolveError};
pub use output::{CommandOutput, OutputFormat};
pub use project::{read_current_pins, CurrentPins};
pub use registry::{
    DeclaredRequirements, InMemoryRegistry, PackageRegistry, PypiClient, RequirementSource,
};
pub use requirement::Requirement;
pub use resolver::{
    best_candidate, check_compatibility, detect_conflicts, plan_upgrade, suggest_resolutions,
    CompatibilityReport, Conflict, Resolution, UpgradePlan,
};
pub use version::{satisfies, Constraint, Operator, VersionKey};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
