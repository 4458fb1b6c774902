//! Version-matrix deployment and verification engine for buildpack
//! acceptance tests
//!
//! This crate drives a runtime buildpack through its acceptance suite:
//!
//! - **Version-Matrix Runner**: one deployment per runtime version listed in
//!   the buildpack manifest, each checked by the Assertion Set
//! - **Version-Change Detector**: re-registers a buildpack with a changed
//!   `VERSION` and expects the platform to report the change
//! - **Auxiliary scenarios**: patch-upgrade warnings, `.profile` hooks and
//!   the unbuilt buildpack
//! - **Reports**: per-case outcomes collected into a [`SuiteReport`]
//!
//! # Architecture
//!
//! ```text
//!                 tests/integration (live_brats)
//!                           |
//!                      brats-core
//!                           |
//!               +-----------+-----------+
//!               |                       |
//!        brats-manifest           brats-cutlass
//!                            (Platform, Packager)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use brats_core::{Suite, SuiteConfig, SuiteContext, buildpacks};
//! use brats_cutlass::{CfPlatform, CliPackager};
//! use brats_manifest::Manifest;
//!
//! fn run(config: &SuiteConfig) -> brats_core::Result<bool> {
//!     let platform = CfPlatform::new(config.http_timeout())?;
//!     let packager = CliPackager::new();
//!     let manifest = Manifest::load(&config.buildpack_dir)?;
//!     let (set, _registration) = buildpacks::prepare(config, &platform, &packager)?;
//!
//!     let ctx = SuiteContext { config, platform: &platform, packager: &packager, buildpacks: &set };
//!     let report = Suite::build(config, &manifest).run(&ctx);
//!     println!("{report}");
//!     Ok(report.is_success())
//! }
//! ```

pub mod assertions;
pub mod buildpacks;
pub mod config;
pub mod deploy;
pub mod error;
pub mod fixture;
pub mod logging;
pub mod matrix;
pub mod report;
pub mod scenarios;
pub mod suite;
pub mod version_change;

pub use assertions::{AssertionFailure, Check, Expectation, Probe, runtime_assertions};
pub use buildpacks::{BuildpackSet, RegisteredBuildpack, unique_buildpack_name};
pub use config::SuiteConfig;
pub use deploy::DeployedApp;
pub use error::{Error, Result};
pub use fixture::AppDir;
pub use report::{CaseOutcome, CaseReport, SuiteReport};
pub use suite::{CaseKind, Suite, SuiteContext, TestCase};
