//! Buildpack manifest reader.
//!
//! Loads the `manifest.yml` shipped at the root of a buildpack and answers
//! the questions the acceptance suite asks of it:
//!
//! - which versions of a dependency does the buildpack know about, in the
//!   order the manifest declares them
//! - which version is installed by default
//! - whether a version has a newer patch release in the same line

pub mod error;
pub mod manifest;
pub mod version;

pub use error::{Error, Result};
pub use manifest::{DefaultVersion, Dependency, MANIFEST_FILE, Manifest};
pub use version::VersionPattern;
