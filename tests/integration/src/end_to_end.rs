//! End-to-end suite run over the checked-in buildpack fixture
//!
//! This test exercises the complete flow: config loading -> manifest ->
//! buildpack registration -> suite -> report.

use brats_core::config::ENV_CONFIG;
use brats_core::fixture::{AppDir, copy_fixture};
use brats_core::{CaseOutcome, Suite, SuiteConfig, SuiteContext, SuiteReport, buildpacks};
use brats_manifest::Manifest;
use brats_test_utils::{FakePackager, FakePlatform};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_buildpack() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/buildpack")
}

/// Copy the fixture buildpack so packaging writes into a scratch directory.
fn setup_buildpack() -> AppDir {
    copy_fixture(&fixture_buildpack()).unwrap()
}

fn run_suite(config: &SuiteConfig) -> (SuiteReport, FakePlatform) {
    let manifest = Manifest::load(&config.buildpack_dir).unwrap();
    let platform = FakePlatform::new(manifest.clone(), config.runtime.clone());
    let packager = FakePackager::new();

    let report = {
        let (set, _registration) = buildpacks::prepare(config, &platform, &packager).unwrap();
        let ctx = SuiteContext {
            config,
            platform: &platform,
            packager: &packager,
            buildpacks: &set,
        };
        Suite::build(config, &manifest).run(&ctx)
    };
    (report, platform)
}

#[test]
fn test_suite_from_config_file() {
    let buildpack = setup_buildpack();
    let config = SuiteConfig::load(&buildpack.path().join("brats.toml")).unwrap();
    assert_eq!(config.buildpack_dir, buildpack.path());

    let (report, platform) = run_suite(&config);

    assert!(report.is_success(), "{report}");
    assert_eq!(report.errored(), 0);
    assert_eq!(report.failed(), 0);
    // Unbuilt is configured in brats.toml, so only the declared scenarios pend.
    assert_eq!(report.pending(), 5);
    assert!(platform.deployed_apps().is_empty());
    assert!(platform.registered_buildpacks().is_empty());
}

#[test]
fn test_every_manifest_version_gets_a_case() {
    let buildpack = setup_buildpack();
    let config = SuiteConfig::load(&buildpack.path().join("brats.toml")).unwrap();
    let manifest = Manifest::load(buildpack.path()).unwrap();

    let (report, _platform) = run_suite(&config);

    for version in manifest.all_versions("ruby") {
        let name = format!("For all supported ruby versions: ruby version {version}");
        let case = report
            .case(&name)
            .unwrap_or_else(|| panic!("missing case {name}"));
        assert_eq!(case.outcome, CaseOutcome::Passed);
    }
}

#[test]
fn test_config_located_through_environment() {
    let buildpack = setup_buildpack();
    let path = buildpack.path().join("brats.toml");
    let path_str = path.to_string_lossy().to_string();

    let config = SuiteConfig::from_lookup(|key| (key == ENV_CONFIG).then(|| path_str.clone()))
        .unwrap()
        .unwrap();
    assert_eq!(config.runtime, "ruby");
    assert!(config.buildpacks.unbuilt.is_some());
}

#[test]
fn test_report_serializes_to_json() {
    let buildpack = setup_buildpack();
    let config = SuiteConfig::load(&buildpack.path().join("brats.toml")).unwrap();
    let (report, _platform) = run_suite(&config);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    let cases = json["cases"].as_array().unwrap();
    assert_eq!(cases.len(), report.cases.len());
    assert!(
        cases
            .iter()
            .all(|c| ["passed", "pending"].contains(&c["outcome"]["status"].as_str().unwrap()))
    );

    let out = buildpack.path().join("report.json");
    fs::write(&out, report.to_json().unwrap()).unwrap();
    assert!(fs::metadata(&out).unwrap().len() > 0);
}

#[test]
fn test_empty_manifest_fails_the_matrix() {
    let buildpack = setup_buildpack();
    fs::write(
        buildpack.path().join("manifest.yml"),
        "---\nlanguage: ruby\ndependencies: []\n",
    )
    .unwrap();
    let config = SuiteConfig::load(&buildpack.path().join("brats.toml")).unwrap();

    let (report, _platform) = run_suite(&config);

    let case = report.case("For all supported ruby versions").unwrap();
    assert!(matches!(&case.outcome, CaseOutcome::Errored(m) if m.contains("no versions")));
    assert!(!report.is_success());
}
