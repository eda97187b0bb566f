//! Conflict detection and resolution through the public API
//!
//! All registry data comes from `InMemoryRegistry`; no network access.

use ppmm_ai::registry::{InMemoryRegistry, PackageRegistry, RequirementSource};
use ppmm_ai::resolver::{
    best_candidate, check_compatibility, detect_conflicts, plan_upgrade, suggest_resolutions,
    Conflict,
};
use ppmm_ai::version::{satisfies, Constraint, Operator, VersionKey};
use ppmm_ai::{CurrentPins, ResolveError};

fn pins(entries: &[(&str, &str)]) -> CurrentPins {
    entries.iter().copied().collect()
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Version ordering and operators
// ============================================================================

#[test]
fn test_version_ordering() {
    assert!(VersionKey::parse("2.1.0") > VersionKey::parse("2.0.9"));
    assert!(VersionKey::parse("1.10") > VersionKey::parse("1.9.9"));
    assert!(VersionKey::parse("0.0.1") > VersionKey::parse("latest"));
}

#[test]
fn test_equality_is_string_identity() {
    assert!(!satisfies("1.0", "==", "1.0.0"));
    assert!(!satisfies("1.0", ">=", "1.0.0"));
    assert!(satisfies("1.0.0", ">=", "1.0"));
    assert!(satisfies("2.31.0", "==", "2.31.0"));
}

#[test]
fn test_unknown_operator_fails_open() {
    assert!(satisfies("1.0", "!=", "1.0"));
    assert!(satisfies("1.0", "===", "2.0"));
}

#[test]
fn test_compatible_release() {
    assert!(satisfies("1.4", "~=", "1.2"));
    assert!(!satisfies("2.0", "~=", "1.2"));
    assert!(!satisfies("1.1", "~=", "1.2"));
}

// ============================================================================
// Detection
// ============================================================================

#[test]
fn test_unpinned_dependencies_never_conflict() {
    let current = pins(&[("foo", "")]);
    assert!(detect_conflicts(&["foo (>=99.0)"], &current).is_empty());
    assert!(detect_conflicts(&["bar (>=99.0)"], &current).is_empty());
}

#[test]
fn test_conflict_carries_every_constraint() {
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
fn test_detection_is_idempotent() {
    let requirements = ["foo (>=2.0,<3.0)", "bar (==1.0)", "baz", "garbage ((("];
    let current = pins(&[("foo", "1.5"), ("bar", "1.0.0"), ("baz", "0.1")]);

    let first = detect_conflicts(&requirements, &current);
    let second = detect_conflicts(&requirements, &current);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_resolution_is_maximal() {
    let constraints = vec![
        Constraint::new(Operator::Ge, "1.5"),
        Constraint::new(Operator::Lt, "2.5"),
    ];
    let known = strings(&["1.0", "1.5", "2.0", "2.5"]);
    assert_eq!(best_candidate(&known, &constraints), Some("2.0"));
}

#[test]
fn test_no_candidate_means_manual_review() {
    let registry = InMemoryRegistry::new()
        .with_release("foo", "1.0", &[])
        .with_release("foo", "1.1", &[]);
    let conflicts = vec![Conflict {
        dependency: "foo".to_string(),
        current: "0.9".to_string(),
        required: vec![Constraint::new(Operator::Ge, "2.0")],
    }];

    let resolutions = suggest_resolutions(&registry, &conflicts);
    assert_eq!(resolutions.len(), 1);
    assert!(resolutions[0].needs_manual_review());
}

#[test]
fn test_unknown_dependency_needs_manual_review() {
    let registry = InMemoryRegistry::new();
    let conflicts = detect_conflicts(&["ghost (>=1.0)"], &pins(&[("ghost", "0.1")]));

    let resolutions = suggest_resolutions(&registry, &conflicts);
    assert_eq!(resolutions[0].package, "ghost");
    assert_eq!(resolutions[0].suggested, None);
}

// ============================================================================
// Upgrade planning
// ============================================================================

#[test]
fn test_plan_upgrade_unknown_package() {
    let registry = InMemoryRegistry::new().with_release("requests", "2.31.0", &[]);
    let err = plan_upgrade(&registry, "reqeusts", &CurrentPins::new()).unwrap_err();
    assert!(matches!(err, ResolveError::PackageNotFound { .. }));
    assert_eq!(err.to_string(), "Package not found: reqeusts");
}

#[test]
fn test_plan_upgrade_end_to_end() {
    let registry = InMemoryRegistry::new()
        .with_release("pandas", "1.5.3", &["numpy (>=1.21.0)"])
        .with_release(
            "pandas",
            "2.1.0",
            &["numpy (>=1.22.4)", "python-dateutil (>=2.8.2)", "pytz (>=2020.1)"],
        )
        .with_release("numpy", "1.21.0", &[])
        .with_release("numpy", "1.24.4", &[])
        .with_release("numpy", "1.26.0", &[])
        .with_release("python-dateutil", "2.8.2", &[]);

    let current = pins(&[
        ("pandas", "1.5.3"),
        ("numpy", "1.21.0"),
        ("python-dateutil", "2.8.2"),
        ("pytz", ""),
    ]);

    let plan = plan_upgrade(&registry, "pandas", &current).unwrap();
    assert_eq!(plan.target_version, "2.1.0");
    assert_eq!(plan.requirement_source, RequirementSource::Exact);
    assert_eq!(plan.conflicts.len(), 1);
    assert_eq!(plan.conflicts[0].dependency, "numpy");
    assert_eq!(plan.resolutions[0].suggested.as_deref(), Some("1.26.0"));

    let merged = plan.merged_pins(&current);
    assert_eq!(
        merged.to_requirement_lines(),
        vec!["numpy==1.26.0", "pandas==2.1.0", "python-dateutil==2.8.2", "pytz"]
    );
}

#[test]
fn test_missing_version_metadata_falls_back_to_latest() {
    let registry = InMemoryRegistry::new()
        .with_release("lib", "2.0", &["dep (>=5.0)"])
        .with_release_without_metadata("lib", "1.0");

    let declared = registry.requirements("lib", "1.0");
    assert_eq!(declared.source, RequirementSource::LatestFallback);
    assert_eq!(declared.requirements, vec!["dep (>=5.0)"]);

    let report = check_compatibility(&registry, "lib", "1.0", &pins(&[("dep", "4.0")]));
    assert_eq!(report.source, RequirementSource::LatestFallback);
    assert_eq!(report.conflicts.len(), 1);
}

#[test]
fn test_unresolvable_conflict_keeps_current_pin() {
    let registry = InMemoryRegistry::new()
        .with_release("web", "3.0", &["engine (>=9.0)"])
        .with_release("engine", "1.0", &[]);
    let current = pins(&[("engine", "1.0")]);

    let plan = plan_upgrade(&registry, "web", &current).unwrap();
    assert!(plan.has_conflicts());
    assert!(plan.resolutions[0].needs_manual_review());

    let merged = plan.merged_pins(&current);
    assert_eq!(merged.pinned("engine"), Some("1.0"));
    assert_eq!(merged.pinned("web"), Some("3.0"));
}
