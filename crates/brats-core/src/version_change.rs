//! Version-Change Detector
//!
//! Registers the cached archive under a fresh name, deploys against it and
//! expects no "version changed" notice. Then swaps the binding for a copy of
//! the archive whose `VERSION` entry holds a sentinel, redeploys the same
//! app, and expects the notice. The negative check runs strictly before the
//! binding changes; if it fails the scenario stops there.

use brats_cutlass::App;
use tempfile::TempDir;

use crate::assertions::{AssertionFailure, Check, evaluate_all};
use crate::buildpacks::{RegisteredBuildpack, unique_buildpack_name};
use crate::deploy::DeployedApp;
use crate::error::Result;
use crate::fixture;
use crate::suite::SuiteContext;

/// Log text the buildpack prints when the cached buildpack version differs
/// from the one that staged the previous droplet
pub const VERSION_CHANGED_MARKER: &str = "buildpack version changed from";

/// Version written into the derived archive
pub const SENTINEL_VERSION: &str = "NewVersion";

/// Case name in the suite
pub const CASE_NAME: &str =
    "deploying an app with an updated version of the same buildpack prints useful warning message to stdout";

pub fn run_version_change(ctx: &SuiteContext<'_>) -> Result<Vec<AssertionFailure>> {
    let name = unique_buildpack_name(&format!("brats_{}_changing", ctx.config.runtime));
    let original = &ctx.buildpacks.cached_artifact;
    let registration = RegisteredBuildpack::register(ctx.platform, &name, &original.path)?;

    let app_dir = fixture::copy_fixture(&ctx.config.fixture_path(&ctx.config.fixtures.no_dependencies))?;
    let app = App::new(app_dir.path())
        .with_buildpacks([registration.name()])
        .with_stack(ctx.config.stack.clone());
    let mut deployed = DeployedApp::new(ctx.platform, app, Some(app_dir));

    deployed.push(ctx.config.start_timeout())?;
    let failures = evaluate_all(
        &[Check::log_lacks(
            "first push reports no version change",
            VERSION_CHANGED_MARKER,
        )],
        &deployed,
    );
    if !failures.is_empty() {
        return Ok(failures);
    }

    let scratch = TempDir::new()?;
    let derived = ctx
        .packager
        .derive_with_version(original, SENTINEL_VERSION, scratch.path())?;
    registration.update(&derived.path)?;

    deployed.push(ctx.config.start_timeout())?;
    Ok(evaluate_all(
        &[Check::log_contains(
            "redeploy reports the version change",
            VERSION_CHANGED_MARKER,
        )],
        &deployed,
    ))
}
