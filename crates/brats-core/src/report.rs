//! Case outcomes and suite reports

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assertions::AssertionFailure;
use crate::error::Error;

/// Outcome of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum CaseOutcome {
    /// Every check passed
    Passed,
    /// The app deployed but at least one check failed
    Failed(Vec<AssertionFailure>),
    /// The case could not run to its checks (deployment or fixture failure)
    Errored(String),
    /// The scenario is declared but not implemented or not runnable here
    Pending(String),
}

impl CaseOutcome {
    /// Fold a scenario result into an outcome.
    pub fn from_result(result: Result<Vec<AssertionFailure>, Error>) -> Self {
        match result {
            Ok(failures) if failures.is_empty() => CaseOutcome::Passed,
            Ok(failures) => CaseOutcome::Failed(failures),
            Err(e) => CaseOutcome::Errored(e.to_string()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaseOutcome::Passed => "PASS",
            CaseOutcome::Failed(_) => "FAIL",
            CaseOutcome::Errored(_) => "ERROR",
            CaseOutcome::Pending(_) => "PENDING",
        }
    }

    /// Whether this outcome fails the suite. Pending cases do not.
    pub fn is_failure(&self) -> bool {
        matches!(self, CaseOutcome::Failed(_) | CaseOutcome::Errored(_))
    }
}

/// Record of one executed case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub outcome: CaseOutcome,
    pub elapsed_ms: u64,
}

/// Record of a whole suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            cases: Vec::new(),
        }
    }

    pub fn push(&mut self, case: CaseReport) {
        self.cases.push(case);
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Failed(_)))
    }

    pub fn errored(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Errored(_)))
    }

    pub fn pending(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Pending(_)))
    }

    /// True when no case failed or errored.
    pub fn is_success(&self) -> bool {
        !self.cases.iter().any(|c| c.outcome.is_failure())
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn count(&self, pred: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.cases.iter().filter(|c| pred(&c.outcome)).count()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for case in &self.cases {
            writeln!(
                f,
                "[{:>7}] {} ({} ms)",
                case.outcome.label(),
                case.name,
                case.elapsed_ms
            )?;
            match &case.outcome {
                CaseOutcome::Failed(failures) => {
                    for failure in failures {
                        writeln!(f, "          - {failure}")?;
                    }
                }
                CaseOutcome::Errored(message) | CaseOutcome::Pending(message) => {
                    writeln!(f, "          {message}")?;
                }
                CaseOutcome::Passed => {}
            }
        }
        write!(
            f,
            "{} cases: {} passed, {} failed, {} errored, {} pending",
            self.cases.len(),
            self.passed(),
            self.failed(),
            self.errored(),
            self.pending()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn failure() -> AssertionFailure {
        AssertionFailure {
            check: "supports bson".into(),
            probe: "GET /bson".into(),
            expected: "contains \"00040000\"".into(),
            observed: "".into(),
        }
    }

    fn report(outcomes: Vec<CaseOutcome>) -> SuiteReport {
        let mut report = SuiteReport::new(Utc::now());
        for (i, outcome) in outcomes.into_iter().enumerate() {
            report.push(CaseReport {
                name: format!("case {i}"),
                outcome,
                elapsed_ms: 1,
            });
        }
        report
    }

    #[test]
    fn test_from_result() {
        assert_eq!(CaseOutcome::from_result(Ok(vec![])), CaseOutcome::Passed);
        assert_eq!(
            CaseOutcome::from_result(Ok(vec![failure()])),
            CaseOutcome::Failed(vec![failure()])
        );
        let errored = CaseOutcome::from_result(Err(Error::fixture(
            PathBuf::from("/tmp/app"),
            "missing Gemfile",
        )));
        assert!(matches!(errored, CaseOutcome::Errored(ref m) if m.contains("missing Gemfile")));
    }

    #[test]
    fn test_pending_is_not_failure() {
        let r = report(vec![
            CaseOutcome::Passed,
            CaseOutcome::Pending("not yet implemented".into()),
        ]);
        assert!(r.is_success());
        assert_eq!(r.passed(), 1);
        assert_eq!(r.pending(), 1);
    }

    #[test]
    fn test_counts_and_success() {
        let r = report(vec![
            CaseOutcome::Passed,
            CaseOutcome::Failed(vec![failure()]),
            CaseOutcome::Errored("push rejected".into()),
        ]);
        assert!(!r.is_success());
        assert_eq!((r.passed(), r.failed(), r.errored()), (1, 1, 1));
    }

    #[test]
    fn test_empty_report_is_success() {
        assert!(report(vec![]).is_success());
    }

    #[test]
    fn test_display_lists_failures() {
        let r = report(vec![CaseOutcome::Failed(vec![failure()])]);
        let text = r.to_string();
        assert!(text.contains("[   FAIL] case 0"));
        assert!(text.contains("supports bson (GET /bson)"));
        assert!(text.ends_with("1 cases: 0 passed, 1 failed, 0 errored, 0 pending"));
    }

    #[test]
    fn test_json_tags_status() {
        let r = report(vec![CaseOutcome::Pending("disabled".into())]);
        let json: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert_eq!(json["cases"][0]["outcome"]["status"], "pending");
        assert_eq!(json["cases"][0]["outcome"]["detail"], "disabled");
    }
}
