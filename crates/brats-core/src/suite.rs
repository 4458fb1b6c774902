//! Suite registry and runner
//!
//! [`Suite::build`] turns the configuration and the manifest into an ordered,
//! read-only list of [`TestCase`]s: one per manifest version plus the
//! auxiliary scenarios. [`Suite::run`] executes them one after another and
//! folds every outcome into a [`SuiteReport`]. A failing or panicking case
//! never stops the cases after it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use brats_cutlass::{Packager, Platform};
use brats_manifest::Manifest;
use chrono::Utc;

use crate::buildpacks::BuildpackSet;
use crate::config::SuiteConfig;
use crate::matrix;
use crate::report::{CaseOutcome, CaseReport, SuiteReport};
use crate::scenarios;
use crate::version_change;

/// Reason recorded for scenarios that are declared but not implemented
pub const NOT_IMPLEMENTED: &str = "not yet implemented";

/// Everything a case needs at run time, borrowed for the whole run
#[derive(Clone, Copy)]
pub struct SuiteContext<'a> {
    pub config: &'a SuiteConfig,
    pub platform: &'a dyn Platform,
    pub packager: &'a dyn Packager,
    pub buildpacks: &'a BuildpackSet,
}

/// What a case does when it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseKind {
    /// Deploy one manifest version and run the Assertion Set
    RuntimeVersion { version: String },
    /// Re-register a changed archive and expect the version-change notice
    VersionChange,
    /// Expect the upgrade warning for a version with a newer patch
    NotLatestPatch { version: String },
    /// Expect no upgrade warning for the latest patch of a line
    LatestPatch { version: String },
    ProfileScriptRuns { version: String },
    ProfileScriptHidden { version: String },
    /// Stage with the unbuilt buildpack reference
    UnbuiltBuildpack { reference: String },
    /// Declared but not runnable
    Pending { reason: String },
    /// Could not be set up from the configuration or manifest
    Misconfigured { message: String },
}

/// One registered case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub kind: CaseKind,
}

impl TestCase {
    pub fn new(name: impl Into<String>, kind: CaseKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    fn pending(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            name,
            CaseKind::Pending {
                reason: reason.into(),
            },
        )
    }

    fn misconfigured(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            name,
            CaseKind::Misconfigured {
                message: message.into(),
            },
        )
    }

    /// Run the case to an outcome. Errors become [`CaseOutcome::Errored`].
    pub fn execute(&self, ctx: &SuiteContext<'_>) -> CaseOutcome {
        let result = match &self.kind {
            CaseKind::RuntimeVersion { version } => matrix::run_runtime_version(ctx, version),
            CaseKind::VersionChange => version_change::run_version_change(ctx),
            CaseKind::NotLatestPatch { version } => scenarios::run_not_latest_patch(ctx, version),
            CaseKind::LatestPatch { version } => scenarios::run_latest_patch(ctx, version),
            CaseKind::ProfileScriptRuns { version } => {
                scenarios::run_profile_script_runs(ctx, version)
            }
            CaseKind::ProfileScriptHidden { version } => {
                scenarios::run_profile_script_hidden(ctx, version)
            }
            CaseKind::UnbuiltBuildpack { reference } => scenarios::run_unbuilt(ctx, reference),
            CaseKind::Pending { reason } => return CaseOutcome::Pending(reason.clone()),
            CaseKind::Misconfigured { message } => return CaseOutcome::Errored(message.clone()),
        };
        CaseOutcome::from_result(result)
    }
}

/// The ordered list of cases for one buildpack
#[derive(Debug, Clone, Default)]
pub struct Suite {
    cases: Vec<TestCase>,
}

impl Suite {
    /// Register every case for `config.runtime` against `manifest`.
    pub fn build(config: &SuiteConfig, manifest: &Manifest) -> Self {
        let runtime = config.runtime.as_str();
        let mut cases = Vec::new();

        let unbuilt = "Unbuilt buildpack (eg github) runs";
        cases.push(match &config.buildpacks.unbuilt {
            Some(reference) => TestCase::new(
                unbuilt,
                CaseKind::UnbuiltBuildpack {
                    reference: reference.clone(),
                },
            ),
            None => TestCase::pending(unbuilt, "no unbuilt buildpack reference configured"),
        });

        cases.push(TestCase::new(
            version_change::CASE_NAME,
            CaseKind::VersionChange,
        ));

        let versions = manifest.all_versions(runtime);
        if versions.is_empty() && !config.allow_empty_matrix {
            cases.push(TestCase::misconfigured(
                matrix::matrix_group_name(runtime),
                format!("manifest lists no versions of {runtime}"),
            ));
        }
        for version in versions {
            cases.push(TestCase::new(
                matrix::matrix_case_name(runtime, &version),
                CaseKind::RuntimeVersion { version },
            ));
        }

        let eol = format!("staging with {runtime} buildpack that sets EOL on dependency");
        cases.push(TestCase::pending(
            format!("{eol} using an uncached buildpack warns about end of life"),
            NOT_IMPLEMENTED,
        ));
        cases.push(TestCase::pending(
            format!("{eol} using a cached buildpack warns about end of life"),
            NOT_IMPLEMENTED,
        ));

        let not_latest = format!(
            "staging with a version of {runtime} that is not the latest patch release in the manifest logs a warning that tells the user to upgrade the dependency"
        );
        let outdated = config
            .not_latest_patch_version
            .clone()
            .or_else(|| manifest.first_outdated_patch(runtime));
        match outdated {
            Some(version) => {
                let latest = manifest
                    .latest_patch(runtime, &version)
                    .filter(|latest| *latest != version);
                cases.push(TestCase::new(
                    not_latest,
                    CaseKind::NotLatestPatch { version },
                ));
                if let Some(latest) = latest {
                    cases.push(TestCase::new(
                        format!(
                            "staging with the latest patch release of {runtime} in the manifest does not log an upgrade warning"
                        ),
                        CaseKind::LatestPatch { version: latest },
                    ));
                }
            }
            None => cases.push(TestCase::pending(
                not_latest,
                format!("manifest has no {runtime} version with a newer patch release"),
            )),
        }

        let credentials = "staging with custom buildpack that uses credentials in manifest dependency uris";
        cases.push(TestCase::pending(
            format!("{credentials} using an uncached buildpack does not include credentials in logged dependency uris"),
            NOT_IMPLEMENTED,
        ));
        cases.push(TestCase::pending(
            format!("{credentials} using a cached buildpack does not include credentials in logged dependency file paths"),
            NOT_IMPLEMENTED,
        ));

        let profile = "deploying an app that has an executable .profile script";
        let runs = format!("{profile} executes the .profile script");
        let hidden = format!("{profile} does not let me view the .profile script");
        match manifest.default_version(runtime) {
            Ok(dependency) => {
                cases.push(TestCase::new(
                    runs,
                    CaseKind::ProfileScriptRuns {
                        version: dependency.version.clone(),
                    },
                ));
                cases.push(TestCase::new(
                    hidden,
                    CaseKind::ProfileScriptHidden {
                        version: dependency.version,
                    },
                ));
            }
            Err(e) => {
                cases.push(TestCase::misconfigured(runs, e.to_string()));
                cases.push(TestCase::misconfigured(hidden, e.to_string()));
            }
        }

        cases.push(TestCase::pending(
            "deploying an app that has sensitive environment variables will not write credentials to the app droplet",
            NOT_IMPLEMENTED,
        ));

        tracing::info!(%runtime, cases = cases.len(), "Registered suite");
        Self { cases }
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Run every case in registration order.
    pub fn run(&self, ctx: &SuiteContext<'_>) -> SuiteReport {
        self.run_matching(ctx, |_| true)
    }

    /// Run the cases accepted by `filter`, in registration order.
    pub fn run_matching(
        &self,
        ctx: &SuiteContext<'_>,
        filter: impl Fn(&TestCase) -> bool,
    ) -> SuiteReport {
        let mut report = SuiteReport::new(Utc::now());
        for case in self.cases.iter().filter(|case| filter(case)) {
            report.push(run_case(case, ctx));
        }
        tracing::info!(
            passed = report.passed(),
            failed = report.failed(),
            errored = report.errored(),
            pending = report.pending(),
            "Suite finished"
        );
        report
    }
}

fn run_case(case: &TestCase, ctx: &SuiteContext<'_>) -> CaseReport {
    tracing::info!(case = %case.name, "Running case");
    let started = Instant::now();
    // Guards inside the case unwind before the panic is caught here.
    let outcome = match catch_unwind(AssertUnwindSafe(|| case.execute(ctx))) {
        Ok(outcome) => outcome,
        Err(panic) => CaseOutcome::Errored(format!("case panicked: {}", panic_message(&*panic))),
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(case = %case.name, outcome = outcome.label(), elapsed_ms, "Finished case");
    CaseReport {
        name: case.name.clone(),
        outcome,
        elapsed_ms,
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
