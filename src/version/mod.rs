//! Version ordering and constraint evaluation
//!
//! Versions are compared through [`VersionKey`], a lenient `(major, minor, patch, raw)`
//! tuple. Anything without a leading numeric group collapses to `(0, 0, 0, raw)` and
//! therefore ranks below every real release.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

static VERSION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?").expect("valid version pattern"));

/// Comparable key for a version string
///
/// Ordering is `(major, minor, patch)` first. On a numeric tie, strings without a
/// numeric prefix lose, then `raw` decides, so `"1.0"` sorts just below `"1.0.0"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionKey {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub raw: String,
    numeric: bool,
}

impl VersionKey {
    pub fn parse(version: &str) -> Self {
        let Some(caps) = VERSION_PREFIX.captures(version) else {
            return Self {
                major: 0,
                minor: 0,
                patch: 0,
                raw: version.to_string(),
                numeric: false,
            };
        };

        // Digits that overflow u64 saturate instead of failing the parse
        let group = |i: usize| -> u64 {
            caps.get(i)
                .map(|m| m.as_str().parse().unwrap_or(u64::MAX))
                .unwrap_or(0)
        };

        Self {
            major: group(1),
            minor: group(2),
            patch: group(3),
            raw: version.to_string(),
            numeric: true,
        }
    }

    /// True when the string had no leading numeric group
    pub fn is_unversioned(&self) -> bool {
        !self.numeric
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then(self.numeric.cmp(&other.numeric))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Comparison operator of a single constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "~=")]
    Compatible,
}

impl Operator {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "==" => Some(Operator::Eq),
            ">=" => Some(Operator::Ge),
            "<=" => Some(Operator::Le),
            ">" => Some(Operator::Gt),
            "<" => Some(Operator::Lt),
            "~=" => Some(Operator::Compatible),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Compatible => "~=",
        }
    }

    /// Evaluate `version <op> target`
    pub fn matches(&self, version: &str, target: &str) -> bool {
        let a = VersionKey::parse(version);
        let b = VersionKey::parse(target);

        match self {
            // Exact pins are string identity, everything else is numeric ordering
            Operator::Eq => version == target,
            Operator::Ge => a >= b,
            Operator::Le => a <= b,
            Operator::Gt => a > b,
            Operator::Lt => a < b,
            // Simplified compatible release: same major and not older than the target.
            // Minor-level pinning of `~=X.Y.Z` is not enforced.
            Operator::Compatible => a.major == b.major && a >= b,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operator + version pair restricting a dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Constraint {
    pub op: Operator,
    pub version: String,
}

impl Constraint {
    pub fn new(op: Operator, version: &str) -> Self {
        Self {
            op,
            version: version.to_string(),
        }
    }

    pub fn is_satisfied_by(&self, version: &str) -> bool {
        self.op.matches(version, &self.version)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// Check `version <operator> target` where the operator is free text
///
/// Operators outside `==, >=, <=, >, <, ~=` are treated as satisfied.
pub fn satisfies(version: &str, operator: &str, target: &str) -> bool {
    match Operator::parse(operator) {
        Some(op) => op.matches(version, target),
        None => true,
    }
}

/// True when `version` satisfies every constraint
pub fn satisfies_all(version: &str, constraints: &[Constraint]) -> bool {
    constraints.iter().all(|c| c.is_satisfied_by(version))
}

/// Render constraints the way they appear in requirement declarations
pub fn format_constraints(constraints: &[Constraint]) -> String {
    constraints
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_key_parse() {
        let key = VersionKey::parse("2.31.0");
        assert_eq!((key.major, key.minor, key.patch), (2, 31, 0));

        let key = VersionKey::parse("1.5");
        assert_eq!((key.major, key.minor, key.patch), (1, 5, 0));

        let key = VersionKey::parse("3.0.0rc1");
        assert_eq!((key.major, key.minor, key.patch), (3, 0, 0));
        assert_eq!(key.raw, "3.0.0rc1");
    }

    #[test]
    fn test_unversioned_sorts_lowest() {
        let dev = VersionKey::parse("dev");
        assert!(dev.is_unversioned());
        assert_eq!((dev.major, dev.minor, dev.patch), (0, 0, 0));
        assert!(dev < VersionKey::parse("0.0.1"));
        assert!(dev < VersionKey::parse("0"));
        assert!(!VersionKey::parse("0.0.0").is_unversioned());
    }

    #[test]
    fn test_non_ascii_digits_are_unversioned() {
        let arabic = VersionKey::parse("\u{0661}.0");
        assert!(arabic.is_unversioned());
        assert_eq!(arabic.major, 0);
        assert!(arabic < VersionKey::parse("0.1"));
    }

    #[test]
    fn test_ordering() {
        assert!(VersionKey::parse("2.1.0") > VersionKey::parse("2.0.9"));
        assert!(VersionKey::parse("10.0") > VersionKey::parse("9.9.9"));
        assert!(VersionKey::parse("1.0") < VersionKey::parse("1.0.0"));
    }

    #[test]
    fn test_overflowing_digits_saturate() {
        let key = VersionKey::parse("99999999999999999999999.1");
        assert_eq!(key.major, u64::MAX);
        assert_eq!(key.minor, 1);
    }

    #[test]
    fn test_equality_is_string_identity() {
        assert!(satisfies("1.0", "==", "1.0"));
        assert!(!satisfies("1.0", "==", "1.0.0"));
        assert!(!satisfies("1.0", ">=", "1.0.0"));
        assert!(satisfies("1.0.0", ">=", "1.0"));
    }

    #[test]
    fn test_range_operators() {
        assert!(satisfies("2.0", ">", "1.9"));
        assert!(!satisfies("1.9", ">", "1.9"));
        assert!(satisfies("1.9", "<=", "1.9"));
        assert!(satisfies("1.8.5", "<", "1.9"));
        assert!(!satisfies("2.0", "<", "2.0"));
    }

    #[test]
    fn test_compatible_release() {
        assert!(satisfies("1.4.5", "~=", "1.4.2"));
        // Minor drift within the same major is accepted
        assert!(satisfies("1.9.0", "~=", "1.4.2"));
        assert!(!satisfies("2.0.0", "~=", "1.4.2"));
        assert!(!satisfies("1.4.1", "~=", "1.4.2"));
    }

    #[test]
    fn test_unknown_operator_fails_open() {
        assert!(satisfies("1.0", "!=", "1.0"));
        assert!(satisfies("1.0", "===", "2.0"));
    }

    #[test]
    fn test_format_constraints() {
        let constraints = vec![
            Constraint::new(Operator::Ge, "2.0"),
            Constraint::new(Operator::Lt, "3.0"),
        ];
        assert_eq!(format_constraints(&constraints), ">=2.0, <3.0");
        assert!(satisfies_all("2.5", &constraints));
        assert!(!satisfies_all("3.0", &constraints));
    }
}
