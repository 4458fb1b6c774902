//! Manifest types and queries
//!
//! A buildpack manifest looks like:
//!
//! ```yaml
//! language: ruby
//! default_versions:
//! - name: ruby
//!   version: 2.4.x
//! dependencies:
//! - name: ruby
//!   version: 2.4.1
//!   uri: https://buildpacks.example.com/ruby-2.4.1.tgz
//!   sha256: 5a3c...
//!   cf_stacks: [cflinuxfs2]
//! ```
//!
//! Only the fields the acceptance suite needs are modelled; unknown keys are
//! ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::version::{VersionPattern, normalize_version, same_line};

/// File name of the manifest at the root of a buildpack
pub const MANIFEST_FILE: &str = "manifest.yml";

/// A dependency entry from the `dependencies` list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub cf_stacks: Vec<String>,
}

/// An entry from the `default_versions` list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DefaultVersion {
    pub name: String,
    /// Exact version or wildcard pattern such as `2.4.x`
    pub version: String,
}

/// A parsed buildpack manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub default_versions: Vec<DefaultVersion>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Manifest {
    /// Load `manifest.yml` from the root of a buildpack directory.
    pub fn load(buildpack_dir: &Path) -> Result<Self> {
        let path = buildpack_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let manifest = Self::parse(&content, &path)?;
        tracing::debug!(
            path = %path.display(),
            language = %manifest.language,
            dependencies = manifest.dependencies.len(),
            "Loaded buildpack manifest"
        );
        Ok(manifest)
    }

    /// Parse manifest YAML. `origin` is only used in error messages.
    pub fn parse(content: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::Parse {
            path: origin.into(),
            message: e.to_string(),
        })
    }

    /// All versions of `name`, in the order the manifest declares them.
    ///
    /// A version listed more than once (for example once per stack) is
    /// returned only at its first position.
    pub fn all_versions(&self, name: &str) -> Vec<String> {
        let mut versions: Vec<String> = Vec::new();
        for dep in self.dependencies.iter().filter(|d| d.name == name) {
            if !versions.contains(&dep.version) {
                versions.push(dep.version.clone());
            }
        }
        versions
    }

    /// Resolve the default version of `name`.
    ///
    /// The `default_versions` entry may be a wildcard pattern; the highest
    /// dependency version matching it wins.
    pub fn default_version(&self, name: &str) -> Result<Dependency> {
        let mut defaults = self.default_versions.iter().filter(|d| d.name == name);
        let default = defaults.next().ok_or_else(|| Error::NoDefaultVersion {
            name: name.to_string(),
        })?;
        if defaults.next().is_some() {
            return Err(Error::AmbiguousDefaultVersion {
                name: name.to_string(),
            });
        }

        let pattern = VersionPattern::parse(&default.version)?;
        self.dependencies
            .iter()
            .filter(|d| d.name == name && pattern.matches(&d.version))
            .filter_map(|d| normalize_version(&d.version).map(|v| (v, d)))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, dep)| dep.clone())
            .ok_or_else(|| Error::NoMatchingVersion {
                name: name.to_string(),
                pattern: default.version.clone(),
            })
    }

    /// Highest version of `name` in the same `major.minor` line as `version`.
    pub fn latest_patch(&self, name: &str, version: &str) -> Option<String> {
        let target = normalize_version(version)?;
        self.all_versions(name)
            .into_iter()
            .filter_map(|v| normalize_version(&v).map(|parsed| (parsed, v)))
            .filter(|(parsed, _)| parsed.pre.is_empty() && same_line(parsed, &target))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, raw)| raw)
    }

    /// Whether the manifest carries a newer patch of `version`'s line.
    pub fn has_newer_patch(&self, name: &str, version: &str) -> bool {
        match (normalize_version(version), self.latest_patch(name, version)) {
            (Some(target), Some(latest)) => {
                normalize_version(&latest).is_some_and(|latest| latest > target)
            }
            _ => false,
        }
    }

    /// First version of `name`, in declaration order, that is not the latest
    /// patch of its line.
    pub fn first_outdated_patch(&self, name: &str) -> Option<String> {
        self.all_versions(name)
            .into_iter()
            .find(|v| self.has_newer_patch(name, v))
    }
}
