//! Parsing of registry-declared dependency strings
//!
//! Registry metadata is free text, so parsing is lenient: a declaration that does not
//! look like `name (op version, ...)` yields `None`, and clauses inside the parentheses
//! that are not `op version` are dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::version::{Constraint, Operator};

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9_.+-]+)\s*(\(([^)]+)\))?\s*$").expect("valid declaration pattern")
});

static CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(==|>=|<=|>|<|~=)\s*([A-Za-z0-9_.+-]+)$").expect("valid clause pattern")
});

static LEADING_RELEASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)").expect("valid release pattern"));

/// A dependency name with its (possibly empty) list of constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: String,
    pub constraints: Vec<Constraint>,
}

impl Requirement {
    /// Parse a single declaration such as `"urllib3 (>=1.21.1,<3)"`
    pub fn parse(declaration: &str) -> Option<Self> {
        let caps = DECLARATION.captures(declaration)?;
        let name = caps.get(1)?.as_str().to_string();

        let constraints = caps
            .get(3)
            .map(|group| parse_constraint_list(group.as_str()))
            .unwrap_or_default();

        Some(Self { name, constraints })
    }
}

/// Parse a comma-separated constraint list like `">=1.5, <2.5"`
///
/// Clauses that are not `op version` are skipped.
pub fn parse_constraint_list(list: &str) -> Vec<Constraint> {
    list.split(',')
        .filter_map(|clause| {
            let caps = CLAUSE.captures(clause.trim())?;
            let op = Operator::parse(caps.get(1)?.as_str())?;
            Some(Constraint::new(op, caps.get(2)?.as_str()))
        })
        .collect()
}

/// Build a requirements line for a freshly detected package
///
/// `X.Y.Z` releases become `pkg (>=X.Y.0,<X+1.0.0)`, other versions are pinned
/// exactly, and packages without a known release are listed bare.
pub fn compatible_range_line(package: &str, latest: Option<&str>) -> String {
    let Some(latest) = latest else {
        return package.to_string();
    };

    let Some(caps) = LEADING_RELEASE.captures(latest) else {
        return format!("{}=={}", package, latest);
    };

    let major: Option<u64> = caps.get(1).and_then(|m| m.as_str().parse().ok());
    let minor: Option<u64> = caps.get(2).and_then(|m| m.as_str().parse().ok());

    match (major, minor) {
        (Some(major), Some(minor)) => format!(
            "{} (>={}.{}.0,<{}.0.0)",
            package,
            major,
            minor,
            major.saturating_add(1)
        ),
        _ => format!("{}=={}", package, latest),
    }
}
