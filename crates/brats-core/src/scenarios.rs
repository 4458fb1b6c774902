//! Auxiliary scenarios
//!
//! Deployments outside the version matrix: the patch-upgrade warning, the
//! `.profile` startup hook, and staging with the unbuilt buildpack.

use crate::assertions::{AssertionFailure, Check, evaluate_all, upgrade_warning_pattern};
use crate::deploy;
use crate::error::Result;
use crate::fixture::{self, PROFILE_MARKER, PROFILE_SCRIPT};
use crate::suite::SuiteContext;

/// Body the `no_dependencies` fixture serves on `/`
pub const NO_DEPENDENCIES_GREETING: &str = "Hello world!";

/// Deploy a version that is not the latest patch of its line and expect the
/// upgrade warning.
pub fn run_not_latest_patch(ctx: &SuiteContext<'_>, version: &str) -> Result<Vec<AssertionFailure>> {
    let check = Check::log_matches(
        "warns that a newer patch is available",
        &upgrade_warning_pattern(&ctx.config.runtime),
    )?;
    let app_dir = fixture::copy_simple_brats(ctx.config, version)?;
    let deployed = deploy::deploy(ctx, app_dir, &ctx.buildpacks.cached)?;
    Ok(evaluate_all(&[check], &deployed))
}

/// Deploy the latest patch of a line and expect no upgrade warning.
pub fn run_latest_patch(ctx: &SuiteContext<'_>, version: &str) -> Result<Vec<AssertionFailure>> {
    let check = Check::log_does_not_match(
        "does not warn about newer patches",
        &upgrade_warning_pattern(&ctx.config.runtime),
    )?;
    let app_dir = fixture::copy_simple_brats(ctx.config, version)?;
    let deployed = deploy::deploy(ctx, app_dir, &ctx.buildpacks.cached)?;
    Ok(evaluate_all(&[check], &deployed))
}

/// Deploy the default version with a `.profile` hook and expect its marker
/// in the log.
pub fn run_profile_script_runs(
    ctx: &SuiteContext<'_>,
    default_version: &str,
) -> Result<Vec<AssertionFailure>> {
    let checks = [Check::log_contains("runs the .profile script", PROFILE_MARKER)];
    run_with_profile(ctx, default_version, &checks)
}

/// Deploy the default version with a `.profile` hook and expect the script
/// not to be served.
pub fn run_profile_script_hidden(
    ctx: &SuiteContext<'_>,
    default_version: &str,
) -> Result<Vec<AssertionFailure>> {
    let checks = [Check::status(
        "does not serve the .profile script",
        format!("/{PROFILE_SCRIPT}"),
        404,
    )];
    run_with_profile(ctx, default_version, &checks)
}

fn run_with_profile(
    ctx: &SuiteContext<'_>,
    version: &str,
    checks: &[Check],
) -> Result<Vec<AssertionFailure>> {
    let app_dir = fixture::copy_simple_brats(ctx.config, version)?;
    fixture::add_dot_profile_script(app_dir.path())?;
    let deployed = deploy::deploy(ctx, app_dir, &ctx.buildpacks.cached)?;
    Ok(evaluate_all(checks, &deployed))
}

/// Stage the `no_dependencies` fixture with the unbuilt buildpack.
pub fn run_unbuilt(ctx: &SuiteContext<'_>, reference: &str) -> Result<Vec<AssertionFailure>> {
    let runtime = &ctx.config.runtime;
    let checks = [
        Check::log_contains(
            "bootstraps the buildpack",
            ctx.config.unbuilt_bootstrap_marker.clone(),
        ),
        Check::log_contains("installs the runtime", format!("Installing {runtime}")),
        Check::body_contains("serves the app", "/", NO_DEPENDENCIES_GREETING),
    ];
    let app_dir =
        fixture::copy_fixture(&ctx.config.fixture_path(&ctx.config.fixtures.no_dependencies))?;
    let deployed = deploy::deploy(ctx, app_dir, reference)?;
    Ok(evaluate_all(&checks, &deployed))
}
