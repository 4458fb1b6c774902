//! Version pattern matching for manifest default versions.
//!
//! `default_versions` entries in a buildpack manifest name either an exact
//! version (`2.4.1`) or a line with a wildcard (`2.4.x`, `2.x`). Missing
//! trailing components behave like wildcards, so `2.4` matches the whole
//! `2.4` line.
//!
//! # Examples
//!
//! ```
//! use brats_manifest::VersionPattern;
//!
//! let pattern = VersionPattern::parse("2.4.x").unwrap();
//! assert!(pattern.matches("2.4.1"));
//! assert!(pattern.matches("2.4.10"));
//! assert!(!pattern.matches("2.5.0"));
//! ```

use crate::error::{Error, Result};

/// A parsed version pattern with optional wildcard components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPattern {
    /// `None` marks a wildcard component.
    components: [Option<u64>; 3],
    raw: String,
}

impl VersionPattern {
    /// Parse a pattern such as `2.4.1`, `2.4.x`, `2.x` or `2.4`.
    pub fn parse(pattern: &str) -> Result<Self> {
        let raw = pattern.trim().to_string();
        if raw.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: raw,
                reason: "empty pattern".to_string(),
            });
        }

        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() > 3 {
            return Err(Error::InvalidPattern {
                pattern: raw.clone(),
                reason: "more than three components".to_string(),
            });
        }

        let mut components = [None; 3];
        let mut seen_wildcard = false;
        for (slot, part) in components.iter_mut().zip(parts.iter()) {
            if matches!(*part, "x" | "X" | "*") {
                seen_wildcard = true;
                continue;
            }
            if seen_wildcard {
                return Err(Error::InvalidPattern {
                    pattern: raw.clone(),
                    reason: "number after wildcard".to_string(),
                });
            }
            *slot = Some(part.parse::<u64>().map_err(|e| Error::InvalidPattern {
                pattern: raw.clone(),
                reason: e.to_string(),
            })?);
        }

        if components[0].is_none() {
            return Err(Error::InvalidPattern {
                pattern: raw,
                reason: "major version must be a number".to_string(),
            });
        }

        Ok(Self { components, raw })
    }

    /// Whether every component is pinned.
    pub fn is_exact(&self) -> bool {
        self.components.iter().all(Option::is_some)
    }

    /// Check whether a concrete version falls inside this pattern.
    ///
    /// Pre-release and unparseable versions never match.
    pub fn matches(&self, version: &str) -> bool {
        let Some(parsed) = normalize_version(version) else {
            return false;
        };

        if !parsed.pre.is_empty() {
            return false;
        }

        let actual = [parsed.major, parsed.minor, parsed.patch];
        self.components
            .iter()
            .zip(actual.iter())
            .all(|(expected, actual)| expected.is_none_or(|e| e == *actual))
    }

    /// Return the original pattern string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for VersionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Normalize a version string to semver by appending `.0` for a missing patch.
pub(crate) fn normalize_version(s: &str) -> Option<semver::Version> {
    let s = s.trim();
    if let Ok(v) = semver::Version::parse(s) {
        return Some(v);
    }
    semver::Version::parse(&format!("{s}.0")).ok()
}

/// Whether two versions share a `major.minor` line.
pub(crate) fn same_line(a: &semver::Version, b: &semver::Version) -> bool {
    a.major == b.major && a.minor == b.minor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2.4.x", "2.4.1", true)]
    #[case("2.4.x", "2.4.10", true)]
    #[case("2.4.x", "2.5.0", false)]
    #[case("2.x", "2.5.3", true)]
    #[case("2.x", "3.0.0", false)]
    #[case("2.4", "2.4.7", true)]
    #[case("2.4.1", "2.4.1", true)]
    #[case("2.4.1", "2.4.2", false)]
    #[case("2.4.x", "not-a-version", false)]
    fn test_matches(#[case] pattern: &str, #[case] version: &str, #[case] expected: bool) {
        let p = VersionPattern::parse(pattern).unwrap();
        assert_eq!(p.matches(version), expected, "{pattern} vs {version}");
    }

    #[test]
    fn test_prerelease_never_matches() {
        let wildcard = VersionPattern::parse("2.5.x").unwrap();
        assert!(!wildcard.matches("2.5.0-preview1"));
        assert!(VersionPattern::parse("2.5.0-preview1").is_err());
    }

    #[test]
    fn test_is_exact() {
        assert!(VersionPattern::parse("2.4.1").unwrap().is_exact());
        assert!(!VersionPattern::parse("2.4.x").unwrap().is_exact());
        assert!(!VersionPattern::parse("2.4").unwrap().is_exact());
    }

    #[rstest]
    #[case("")]
    #[case("x")]
    #[case("2.x.1")]
    #[case("1.2.3.4")]
    #[case("two.four")]
    fn test_parse_rejects(#[case] pattern: &str) {
        assert!(VersionPattern::parse(pattern).is_err());
    }

    #[test]
    fn test_normalize_two_part() {
        let v = normalize_version("2.4").unwrap();
        assert_eq!(v, semver::Version::new(2, 4, 0));
    }

    #[test]
    fn test_display() {
        let p = VersionPattern::parse("2.4.x").unwrap();
        assert_eq!(p.to_string(), "2.4.x");
    }
}
