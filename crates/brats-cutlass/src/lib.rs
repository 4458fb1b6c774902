//! Deployment platform and packaging seams for buildpack acceptance tests
//!
//! This crate provides the collaborators the acceptance suite drives but
//! does not own:
//!
//! - [`Platform`]: pushes applications, probes them over HTTP, manages
//!   registered buildpacks, and tears deployments down
//! - [`Packager`]: builds buildpack archives and derives archives with a
//!   patched `VERSION` entry
//!
//! [`CfPlatform`] and [`CliPackager`] implement the seams by shelling out to
//! the `cf`, `buildpack-packager`, `zip` and `unzip` tools.

pub mod app;
pub mod cf;
pub mod command;
pub mod error;
pub mod http;
pub mod packager;
pub mod platform;

pub use app::App;
pub use cf::CfPlatform;
pub use error::{Error, Result};
pub use http::{HttpClient, HttpResponse};
pub use packager::{BuildpackArtifact, CliPackager, PackageMode, Packager, VERSION_ENTRY};
pub use platform::{Platform, RUNNING, wait_until_running};
