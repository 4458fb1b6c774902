//! Live acceptance run against a real platform
//!
//! Runs the whole suite through the `cf` CLI and `buildpack-packager`. The
//! run is skipped unless `BRATS_CONFIG` or `BRATS_BUILDPACK_DIR` points at a
//! buildpack checkout, so `cargo test` stays green on machines without a
//! platform. Set `BRATS_REPORT` to also write the report as JSON.
//!
//! ```text
//! BRATS_CONFIG=../ruby-buildpack/brats.toml cargo test -p integration-tests --test live_brats
//! ```

use std::process::ExitCode;

use brats_core::{Suite, SuiteConfig, SuiteContext, buildpacks, logging};
use brats_cutlass::{CfPlatform, CliPackager};
use brats_manifest::Manifest;

const ENV_REPORT: &str = "BRATS_REPORT";

fn main() -> ExitCode {
    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {e}");
    }

    let config = match SuiteConfig::from_env() {
        Ok(Some(config)) => config,
        Ok(None) => {
            println!("live_brats: skipped, BRATS_CONFIG is not set");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("live_brats: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("live_brats: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &SuiteConfig) -> brats_core::Result<bool> {
    let platform = CfPlatform::new(config.http_timeout())?;
    let packager = CliPackager::new();
    let manifest = Manifest::load(&config.buildpack_dir)?;

    let (set, _registration) = buildpacks::prepare(config, &platform, &packager)?;
    let ctx = SuiteContext {
        config,
        platform: &platform,
        packager: &packager,
        buildpacks: &set,
    };

    let suite = Suite::build(config, &manifest);
    tracing::info!(cases = suite.len(), "Starting live run");
    let report = suite.run(&ctx);
    println!("{report}");

    if let Ok(path) = std::env::var(ENV_REPORT) {
        std::fs::write(&path, report.to_json()?)
            .map_err(|e| brats_core::Error::config(&path, format!("cannot write report: {e}")))?;
        tracing::info!(%path, "Wrote report");
    }
    Ok(report.is_success())
}
