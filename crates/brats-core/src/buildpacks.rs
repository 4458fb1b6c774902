//! Buildpack registration for a suite run

use std::path::Path;

use brats_cutlass::app::random_suffix;
use brats_cutlass::{BuildpackArtifact, PackageMode, Packager, Platform};

use crate::config::SuiteConfig;
use crate::error::Result;

/// A buildpack binding that is deleted from the platform when dropped
pub struct RegisteredBuildpack<'p> {
    platform: &'p dyn Platform,
    name: String,
}

impl<'p> RegisteredBuildpack<'p> {
    /// Register `artifact` under `name`, replacing any existing binding.
    pub fn register(platform: &'p dyn Platform, name: &str, artifact: &Path) -> Result<Self> {
        tracing::info!(%name, artifact = %artifact.display(), "Registering buildpack");
        // Hold the guard before registering so a half-done create is cleaned up.
        let guard = Self {
            platform,
            name: name.to_string(),
        };
        platform.create_or_update_buildpack(name, artifact)?;
        Ok(guard)
    }

    /// Point the binding at a different artifact.
    pub fn update(&self, artifact: &Path) -> Result<()> {
        tracing::info!(name = %self.name, artifact = %artifact.display(), "Re-registering buildpack");
        Ok(self
            .platform
            .create_or_update_buildpack(&self.name, artifact)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for RegisteredBuildpack<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.platform.delete_buildpack(&self.name) {
            tracing::warn!(name = %self.name, "Failed to delete buildpack: {}", e);
        }
    }
}

/// Buildpack references resolved for one suite run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildpackSet {
    /// Name of the registered cached buildpack
    pub cached: String,
    /// The cached archive itself
    pub cached_artifact: BuildpackArtifact,
    /// Unbuilt (source) buildpack reference
    pub unbuilt: Option<String>,
}

/// Buildpack name with a random component, as registered on the platform.
pub fn unique_buildpack_name(prefix: &str) -> String {
    format!("{prefix}_{}_buildpack", random_suffix(6))
}

/// Resolve the cached archive and make sure it is registered.
///
/// When the configuration names an already registered cached buildpack it is
/// used as-is and no guard is returned. Otherwise the archive is registered
/// under a fresh name and the returned guard deletes it at the end of the
/// run.
pub fn prepare<'p>(
    config: &SuiteConfig,
    platform: &'p dyn Platform,
    packager: &dyn Packager,
) -> Result<(BuildpackSet, Option<RegisteredBuildpack<'p>>)> {
    let cached_artifact = match &config.buildpacks.cached_file {
        Some(path) => BuildpackArtifact {
            path: path.clone(),
            version: packager.read_version(path)?,
        },
        None => packager.package(&config.buildpack_dir, &config.runtime, PackageMode::Cached)?,
    };

    let (cached, registration) = match &config.buildpacks.cached {
        Some(name) => (name.clone(), None),
        None => {
            let name = unique_buildpack_name(&format!("brats_{}", config.runtime));
            let guard = RegisteredBuildpack::register(platform, &name, &cached_artifact.path)?;
            (name, Some(guard))
        }
    };

    tracing::info!(
        %cached,
        version = %cached_artifact.version,
        unbuilt = ?config.buildpacks.unbuilt,
        "Buildpacks ready"
    );
    Ok((
        BuildpackSet {
            cached,
            cached_artifact,
            unbuilt: config.buildpacks.unbuilt.clone(),
        },
        registration,
    ))
}
