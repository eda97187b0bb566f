//! Conflict detection and resolution
//!
//! Only direct conflicts are considered: the requirements declared by one upgrade
//! target are checked against the project's current pins, and each violated
//! dependency gets the highest registry version that satisfies every constraint the
//! target declared for it. No transitive closure is computed.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ResolveError;
use crate::project::CurrentPins;
use crate::registry::{PackageRegistry, RequirementSource};
use crate::requirement::Requirement;
use crate::version::{satisfies_all, Constraint, VersionKey};

/// A pinned dependency that violates the upgrade target's declared requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub dependency: String,
    pub current: String,
    /// Every constraint declared for the dependency, not only the violated ones
    pub required: Vec<Constraint>,
}

/// Suggested replacement for a conflicting dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub package: String,
    /// `None` means no known version satisfies all constraints: manual review
    pub suggested: Option<String>,
}

impl Resolution {
    pub fn needs_manual_review(&self) -> bool {
        self.suggested.is_none()
    }
}

/// Conflicts of one candidate release, plus where its requirements came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityReport {
    pub source: RequirementSource,
    pub conflicts: Vec<Conflict>,
}

/// Outcome of analysing an upgrade of one package to its latest release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradePlan {
    pub package: String,
    pub target_version: String,
    pub requirement_source: RequirementSource,
    pub conflicts: Vec<Conflict>,
    pub resolutions: Vec<Resolution>,
}

impl UpgradePlan {
    /// Pins after applying the upgrade and every available suggestion
    pub fn merged_pins(&self, pins: &CurrentPins) -> CurrentPins {
        let mut merged = pins.clone();
        merged.insert(&self.package, &self.target_version);
        for resolution in &self.resolutions {
            if let Some(version) = &resolution.suggested {
                merged.insert(&resolution.package, version);
            }
        }
        merged
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Find declared requirements violated by the current pins
///
/// Unparsable declarations and unpinned dependencies are skipped. A dependency is
/// reported once, with its full constraint list, as soon as any constraint fails.
pub fn detect_conflicts<S: AsRef<str>>(requirements: &[S], pins: &CurrentPins) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for declaration in requirements {
        let Some(requirement) = Requirement::parse(declaration.as_ref()) else {
            debug!("Skipping unparsable requirement '{}'", declaration.as_ref());
            continue;
        };

        let Some(current) = pins.pinned(&requirement.name) else {
            continue;
        };

        if !satisfies_all(current, &requirement.constraints) {
            conflicts.push(Conflict {
                dependency: requirement.name,
                current: current.to_string(),
                required: requirement.constraints,
            });
        }
    }

    conflicts
}

/// Check one candidate release of `package` against the current pins
pub fn check_compatibility<R: PackageRegistry>(
    registry: &R,
    package: &str,
    version: &str,
    pins: &CurrentPins,
) -> CompatibilityReport {
    let declared = registry.requirements(package, version);
    let conflicts = detect_conflicts(&declared.requirements, pins);

    CompatibilityReport {
        source: declared.source,
        conflicts,
    }
}

/// Highest version (by [`VersionKey`]) satisfying every constraint
pub fn best_candidate<'a>(versions: &'a [String], constraints: &[Constraint]) -> Option<&'a str> {
    versions
        .iter()
        .filter(|v| satisfies_all(v, constraints))
        .max_by_key(|v| VersionKey::parse(v))
        .map(String::as_str)
}

/// Suggest a replacement version for every conflict, in order
pub fn suggest_resolutions<R: PackageRegistry>(registry: &R, conflicts: &[Conflict]) -> Vec<Resolution> {
    conflicts
        .iter()
        .map(|conflict| {
            let versions = registry.versions(&conflict.dependency);
            let suggested = best_candidate(&versions, &conflict.required).map(str::to_string);

            if suggested.is_none() {
                info!(
                    "No release of {} satisfies {} ({} known versions)",
                    conflict.dependency,
                    crate::version::format_constraints(&conflict.required),
                    versions.len()
                );
            }

            Resolution {
                package: conflict.dependency.clone(),
                suggested,
            }
        })
        .collect()
}

/// Analyse upgrading `package` to its latest release
///
/// Fails only when the registry does not know the package.
pub fn plan_upgrade<R: PackageRegistry>(
    registry: &R,
    package: &str,
    pins: &CurrentPins,
) -> Result<UpgradePlan, ResolveError> {
    let target_version = registry
        .latest_version(package)
        .ok_or_else(|| ResolveError::PackageNotFound {
            name: package.to_string(),
        })?;

    debug!("Upgrade target for {} is {}", package, target_version);

    let report = check_compatibility(registry, package, &target_version, pins);
    let resolutions = suggest_resolutions(registry, &report.conflicts);

    Ok(UpgradePlan {
        package: package.to_string(),
        target_version,
        requirement_source: report.source,
        conflicts: report.conflicts,
        resolutions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use crate::version::Operator;

    fn pins(entries: &[(&str, &str)]) -> CurrentPins {
        entries.iter().copied().collect()
    }

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_detect_reports_full_constraint_list() {
        let conflicts = detect_conflicts(&["foo (>=2.0,<3.0)"], &pins(&[("foo", "1.5")]));
        assert_eq!(
            conflicts,
            vec![Conflict {
                dependency: "foo".to_string(),
                current: "1.5".to_string(),
                required: vec![
                    Constraint::new(Operator::Ge, "2.0"),
                    Constraint::new(Operator::Lt, "3.0"),
                ],
            }]
        );
    }

    #[test]
    fn test_detect_skips_unpinned_and_unparsable() {
        let requirements = ["foo (>=2.0)", "bar (>=1.0)", "baz<2 ; extra == 'x'", "qux (<1.0)"];
        let current = pins(&[("bar", ""), ("baz", "5.0"), ("qux", "0.9")]);
        assert!(detect_conflicts(&requirements, &current).is_empty());
    }

    #[test]
    fn test_detect_is_case_sensitive() {
        let conflicts = detect_conflicts(&["Jinja2 (>=3.0)"], &pins(&[("jinja2", "2.11")]));
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_best_candidate_is_maximal() {
        let known = versions(&["1.0", "1.5", "2.0", "2.5"]);
        let constraints = vec![
            Constraint::new(Operator::Ge, "1.5"),
            Constraint::new(Operator::Lt, "2.5"),
        ];
        assert_eq!(best_candidate(&known, &constraints), Some("2.0"));

        // Input order does not matter
        let shuffled = versions(&["2.0", "2.5", "1.0", "1.5"]);
        assert_eq!(best_candidate(&shuffled, &constraints), Some("2.0"));
    }

    #[test]
    fn test_best_candidate_skips_non_ascii_digits() {
        let known = versions(&["1.0", "2.0", "\u{0661}.0"]);
        let constraints = vec![Constraint::new(Operator::Ge, "1.0")];
        assert_eq!(best_candidate(&known, &constraints), Some("2.0"));
    }

    #[test]
    fn test_best_candidate_none() {
        let known = versions(&["1.0", "1.1"]);
        let constraints = vec![Constraint::new(Operator::Ge, "2.0")];
        assert_eq!(best_candidate(&known, &constraints), None);
        assert_eq!(best_candidate(&[], &constraints), None);
    }

    #[test]
    fn test_plan_upgrade() {
        let registry = InMemoryRegistry::new()
            .with_release("web", "3.0.0", &["foo (>=2.0,<3.0)", "bar (~=1.0)"])
            .with_release("foo", "1.5", &[])
            .with_release("foo", "2.4.1", &[])
            .with_release("foo", "3.0", &[])
            .with_release("bar", "1.2", &[]);

        let current = pins(&[("foo", "1.5"), ("bar", "1.1"), ("web", "2.0.0")]);
        let plan = plan_upgrade(&registry, "web", &current).unwrap();

        assert_eq!(plan.target_version, "3.0.0");
        assert_eq!(plan.requirement_source, RequirementSource::Exact);
        assert_eq!(plan.conflicts.len(), 1);
        assert_eq!(
            plan.resolutions,
            vec![Resolution {
                package: "foo".to_string(),
                suggested: Some("2.4.1".to_string()),
            }]
        );

        let merged = plan.merged_pins(&current);
        assert_eq!(merged.pinned("web"), Some("3.0.0"));
        assert_eq!(merged.pinned("foo"), Some("2.4.1"));
        assert_eq!(merged.pinned("bar"), Some("1.1"));
    }

    #[test]
    fn test_plan_upgrade_unknown_package() {
        let registry = InMemoryRegistry::new();
        let err = plan_upgrade(&registry, "ghost", &CurrentPins::default()).unwrap_err();
        assert!(matches!(err, ResolveError::PackageNotFound { ref name } if name == "ghost"));
    }
}
