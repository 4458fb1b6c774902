//! Shared test utilities for the brats workspace.
//!
//! Dev-dependency only, never published. The fakes simulate a ruby
//! buildpack closely enough for every suite scenario to run without a
//! platform.
//!
//! # Modules
//!
//! - [`buildpack`]: [`TestBuildpack`] builder for buildpack checkouts
//! - [`packager`]: [`FakePackager`] producing text "archives"
//! - [`platform`]: [`FakePlatform`] staging apps in memory

pub mod buildpack;
pub mod packager;
pub mod platform;

pub use buildpack::{RUBY_MANIFEST, TestBuildpack};
pub use packager::FakePackager;
pub use platform::{Event, FakePlatform};
