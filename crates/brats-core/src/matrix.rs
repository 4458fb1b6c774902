//! Version-Matrix Runner
//!
//! One case per runtime version listed in the manifest. Each case copies the
//! brats fixture, stamps the version into it, deploys it against the cached
//! buildpack and runs the full Assertion Set. The deployment and the copy
//! are gone before the next case starts.

use crate::assertions::{AssertionFailure, evaluate_all, runtime_assertions};
use crate::deploy;
use crate::error::Result;
use crate::fixture;
use crate::suite::SuiteContext;

/// Group name shared by all matrix cases.
pub fn matrix_group_name(runtime: &str) -> String {
    format!("For all supported {runtime} versions")
}

/// Case name for one version.
pub fn matrix_case_name(runtime: &str, version: &str) -> String {
    format!("{}: {runtime} version {version}", matrix_group_name(runtime))
}

/// Deploy `version` and run the Assertion Set against it.
pub fn run_runtime_version(ctx: &SuiteContext<'_>, version: &str) -> Result<Vec<AssertionFailure>> {
    let app_dir = fixture::copy_simple_brats(ctx.config, version)?;
    let deployed = deploy::deploy(ctx, app_dir, &ctx.buildpacks.cached)?;
    Ok(evaluate_all(
        &runtime_assertions(&ctx.config.runtime, version),
        &deployed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_names() {
        assert_eq!(matrix_group_name("ruby"), "For all supported ruby versions");
        assert_eq!(
            matrix_case_name("ruby", "2.4.1"),
            "For all supported ruby versions: ruby version 2.4.1"
        );
    }
}
