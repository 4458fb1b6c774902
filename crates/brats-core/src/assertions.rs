//! Assertion Set
//!
//! A [`Check`] pairs a probe (the push log or an HTTP GET) with an
//! expectation. Checks never abort: evaluating one yields either success or
//! an [`AssertionFailure`] naming the check, the probe, what was expected
//! and what was observed.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::deploy::DeployedApp;
use crate::error::{Error, Result};

/// Observed values longer than this are cut down to their tail in reports
const MAX_OBSERVED_LEN: usize = 2000;

/// Where a check reads its observed value from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Output captured by the most recent push
    Log,
    /// Body or status of `GET <path>`
    Get(String),
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Probe::Log => write!(f, "log"),
            Probe::Get(path) => write!(f, "GET {path}"),
        }
    }
}

/// What the observed value must satisfy
#[derive(Debug, Clone)]
pub enum Expectation {
    Contains(String),
    NotContains(String),
    Matches(Regex),
    NotMatches(Regex),
    /// The response status equals the given code
    Status(u16),
    /// The body is a non-empty bcrypt hash of the given plaintext
    BcryptOf(String),
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expectation::Contains(s) => write!(f, "contains {s:?}"),
            Expectation::NotContains(s) => write!(f, "does not contain {s:?}"),
            Expectation::Matches(re) => write!(f, "matches /{re}/"),
            Expectation::NotMatches(re) => write!(f, "does not match /{re}/"),
            Expectation::Status(code) => write!(f, "status {code}"),
            Expectation::BcryptOf(plain) => write!(f, "bcrypt hash of {plain:?}"),
        }
    }
}

/// A failed check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    pub check: String,
    pub probe: String,
    pub expected: String,
    pub observed: String,
}

impl std::fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): expected {}, observed {:?}",
            self.check, self.probe, self.expected, self.observed
        )
    }
}

/// One behavioral check against a deployed application
#[derive(Debug, Clone)]
pub struct Check {
    pub name: String,
    pub probe: Probe,
    pub expectation: Expectation,
}

impl Check {
    pub fn log_contains(name: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probe: Probe::Log,
            expectation: Expectation::Contains(needle.into()),
        }
    }

    pub fn log_lacks(name: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probe: Probe::Log,
            expectation: Expectation::NotContains(needle.into()),
        }
    }

    pub fn log_matches(name: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            probe: Probe::Log,
            expectation: Expectation::Matches(compile(pattern)?),
        })
    }

    pub fn log_does_not_match(name: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            probe: Probe::Log,
            expectation: Expectation::NotMatches(compile(pattern)?),
        })
    }

    pub fn body_contains(
        name: impl Into<String>,
        path: impl Into<String>,
        needle: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            probe: Probe::Get(path.into()),
            expectation: Expectation::Contains(needle.into()),
        }
    }

    pub fn status(name: impl Into<String>, path: impl Into<String>, code: u16) -> Self {
        Self {
            name: name.into(),
            probe: Probe::Get(path.into()),
            expectation: Expectation::Status(code),
        }
    }

    pub fn bcrypt_of(
        name: impl Into<String>,
        path: impl Into<String>,
        plaintext: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            probe: Probe::Get(path.into()),
            expectation: Expectation::BcryptOf(plaintext.into()),
        }
    }

    /// Probe `app` and compare against the expectation.
    pub fn evaluate(&self, app: &DeployedApp<'_>) -> std::result::Result<(), AssertionFailure> {
        let (status, observed) = match &self.probe {
            Probe::Log => (None, app.log().to_string()),
            Probe::Get(path) => match app.get(path, &BTreeMap::new()) {
                Ok(response) => (Some(response.status), response.body),
                Err(e) => return Err(self.failure(format!("request failed: {e}"))),
            },
        };

        let ok = match &self.expectation {
            Expectation::Contains(needle) => observed.contains(needle.as_str()),
            Expectation::NotContains(needle) => !observed.contains(needle.as_str()),
            Expectation::Matches(re) => re.is_match(&observed),
            Expectation::NotMatches(re) => !re.is_match(&observed),
            Expectation::Status(code) => {
                return if status == Some(*code) {
                    Ok(())
                } else {
                    Err(self.failure(format!("status {}", status.unwrap_or_default())))
                };
            }
            Expectation::BcryptOf(plaintext) => {
                let hash = observed.trim();
                !hash.is_empty() && bcrypt::verify(plaintext, hash).unwrap_or(false)
            }
        };

        if ok {
            Ok(())
        } else {
            Err(self.failure(excerpt(&observed)))
        }
    }

    fn failure(&self, observed: String) -> AssertionFailure {
        AssertionFailure {
            check: self.name.clone(),
            probe: self.probe.to_string(),
            expected: self.expectation.to_string(),
            observed,
        }
    }
}

/// Evaluate every check, collecting all failures.
pub fn evaluate_all(checks: &[Check], app: &DeployedApp<'_>) -> Vec<AssertionFailure> {
    checks
        .iter()
        .filter_map(|check| {
            let result = check.evaluate(app);
            match &result {
                Ok(()) => tracing::debug!(check = %check.name, "Check passed"),
                Err(failure) => tracing::warn!(check = %check.name, "Check failed: {}", failure),
            }
            result.err()
        })
        .collect()
}

/// The fixed battery run against every runtime version deployment.
pub fn runtime_assertions(runtime: &str, version: &str) -> Vec<Check> {
    vec![
        Check::log_contains(
            "installs the correct version",
            format!("Installing {runtime} {version}"),
        ),
        Check::body_contains("reports the installed version", "/version", version),
        Check::body_contains("runs a simple webserver", "/", "Hello, World"),
        Check::body_contains("parses XML with nokogiri", "/nokogiri", "Hello, World"),
        Check::body_contains("supports EventMachine", "/em", "Hello, EventMachine"),
        Check::bcrypt_of("encrypts with bcrypt", "/bcrypt", "Hello, bcrypt"),
        Check::body_contains("supports bson", "/bson", "00040000"),
        Check::body_contains(
            "supports postgres",
            "/pg",
            "could not connect to server: No such file or directory",
        ),
        Check::body_contains(
            "supports mysql2",
            "/mysql2",
            "Unknown MySQL server host 'testing'",
        ),
    ]
}

/// Pattern of the warning printed when a newer patch release is available.
pub fn upgrade_warning_pattern(runtime: &str) -> String {
    format!(
        "WARNING.*A newer version of {} is available in this buildpack",
        regex::escape(runtime)
    )
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn excerpt(observed: &str) -> String {
    if observed.len() <= MAX_OBSERVED_LEN {
        return observed.to_string();
    }
    let mut start = observed.len() - MAX_OBSERVED_LEN;
    while !observed.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &observed[start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_runtime_assertions_cover_the_battery() {
        let checks = runtime_assertions("ruby", "2.4.1");
        let probes: Vec<String> = checks.iter().map(|c| c.probe.to_string()).collect();
        assert_eq!(
            probes,
            vec![
                "log",
                "GET /version",
                "GET /",
                "GET /nokogiri",
                "GET /em",
                "GET /bcrypt",
                "GET /bson",
                "GET /pg",
                "GET /mysql2",
            ]
        );
        assert!(matches!(
            &checks[0].expectation,
            Expectation::Contains(s) if s == "Installing ruby 2.4.1"
        ));
    }

    #[test]
    fn test_upgrade_warning_pattern_matches_buildpack_output() {
        let re = Regex::new(&upgrade_warning_pattern("ruby")).unwrap();
        assert!(re.is_match(
            "**WARNING** A newer version of ruby is available in this buildpack. Please adjust your app"
        ));
        assert!(!re.is_match("-----> Installing ruby 2.4.2"));
    }

    #[test]
    fn test_upgrade_warning_pattern_escapes_runtime() {
        let pattern = upgrade_warning_pattern("c++");
        assert!(Regex::new(&pattern).is_ok());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Check::log_matches("bad", "(").unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }

    #[rstest]
    #[case(Expectation::Status(404), "status 404")]
    #[case(Expectation::Contains("Hello".into()), "contains \"Hello\"")]
    #[case(Expectation::NotContains("changed".into()), "does not contain \"changed\"")]
    #[case(Expectation::BcryptOf("Hello, bcrypt".into()), "bcrypt hash of \"Hello, bcrypt\"")]
    fn test_expectation_display(#[case] expectation: Expectation, #[case] expected: &str) {
        assert_eq!(expectation.to_string(), expected);
    }

    #[test]
    fn test_excerpt_keeps_tail() {
        let long = format!("{}END", "x".repeat(MAX_OBSERVED_LEN * 2));
        let cut = excerpt(&long);
        assert!(cut.starts_with("..."));
        assert!(cut.ends_with("END"));
        assert_eq!(cut.len(), MAX_OBSERVED_LEN + 3);
    }

    #[test]
    fn test_failure_display() {
        let failure = AssertionFailure {
            check: "supports bson".into(),
            probe: "GET /bson".into(),
            expected: "contains \"00040000\"".into(),
            observed: "".into(),
        };
        assert_eq!(
            failure.to_string(),
            "supports bson (GET /bson): expected contains \"00040000\", observed \"\""
        );
    }
}
