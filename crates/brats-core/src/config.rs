//! Suite configuration
//!
//! The configuration is built once before any case runs and is passed by
//! reference into every scenario. It is read from a `brats.toml` file:
//!
//! ```toml
//! runtime = "ruby"
//! buildpack_dir = ".."
//! stack = "cflinuxfs2"
//!
//! [buildpacks]
//! cached_file = "ruby_buildpack-cached-v1.7.3.zip"
//! unbuilt = "https://github.com/cloudfoundry/ruby-buildpack#develop"
//!
//! [fixtures]
//! brats = "fixtures/brats"
//! no_dependencies = "fixtures/no_dependencies"
//!
//! [timeouts]
//! start_secs = 20
//! ```
//!
//! Environment variables override file values (see [`ENV_CONFIG`] and
//! friends).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Path to the suite configuration file
pub const ENV_CONFIG: &str = "BRATS_CONFIG";
/// Buildpack checkout directory
pub const ENV_BUILDPACK_DIR: &str = "BRATS_BUILDPACK_DIR";
/// Name of an already registered cached buildpack
pub const ENV_CACHED_BUILDPACK: &str = "BRATS_CACHED_BUILDPACK";
/// Path to a pre-packaged cached buildpack archive
pub const ENV_CACHED_FILE: &str = "BRATS_CACHED_FILE";
/// Reference to the unbuilt (source) buildpack
pub const ENV_UNBUILT_BUILDPACK: &str = "BRATS_UNBUILT_BUILDPACK";
/// Stack to stage on
pub const ENV_STACK: &str = "BRATS_STACK";

/// Buildpack references the suite deploys against
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildpackRefs {
    /// Name of a cached buildpack already registered on the platform.
    /// When unset the suite registers the cached archive under a fresh name.
    #[serde(default)]
    pub cached: Option<String>,
    /// Pre-packaged cached archive. Packaged from `buildpack_dir` when unset.
    #[serde(default)]
    pub cached_file: Option<PathBuf>,
    /// Unbuilt buildpack reference, usually a git URL
    #[serde(default)]
    pub unbuilt: Option<String>,
}

/// Fixture applications, relative to `buildpack_dir` unless absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureConfig {
    #[serde(default = "default_brats_fixture")]
    pub brats: PathBuf,
    #[serde(default = "default_no_dependencies_fixture")]
    pub no_dependencies: PathBuf,
    /// File in the brats fixture carrying the runtime version marker
    #[serde(default = "default_version_file")]
    pub version_file: String,
    /// Placeholder replaced by the runtime version
    #[serde(default = "default_version_placeholder")]
    pub version_placeholder: String,
}

fn default_brats_fixture() -> PathBuf {
    PathBuf::from("fixtures/brats")
}

fn default_no_dependencies_fixture() -> PathBuf {
    PathBuf::from("fixtures/no_dependencies")
}

fn default_version_file() -> String {
    "Gemfile".to_string()
}

fn default_version_placeholder() -> String {
    "<%= ruby_version %>".to_string()
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            brats: default_brats_fixture(),
            no_dependencies: default_no_dependencies_fixture(),
            version_file: default_version_file(),
            version_placeholder: default_version_placeholder(),
        }
    }
}

/// Timeouts applied to platform interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// How long a pushed app may take to report every instance RUNNING
    #[serde(default = "default_start_secs")]
    pub start_secs: u64,
    /// Per-request HTTP timeout
    #[serde(default = "default_http_secs")]
    pub http_secs: u64,
}

fn default_start_secs() -> u64 {
    20
}

fn default_http_secs() -> u64 {
    30
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            start_secs: default_start_secs(),
            http_secs: default_http_secs(),
        }
    }
}

/// Immutable configuration for one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Dependency name of the runtime under test
    #[serde(default = "default_runtime")]
    pub runtime: String,
    /// Root of the buildpack checkout (holds `manifest.yml`)
    pub buildpack_dir: PathBuf,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub buildpacks: BuildpackRefs,
    #[serde(default)]
    pub fixtures: FixtureConfig,
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Version used by the upgrade-warning scenario. Picked from the
    /// manifest when unset.
    #[serde(default)]
    pub not_latest_patch_version: Option<String>,
    /// Log line the unbuilt buildpack prints while bootstrapping itself
    #[serde(default = "default_bootstrap_marker")]
    pub unbuilt_bootstrap_marker: String,
    /// Register zero matrix cases when the manifest lists no versions,
    /// instead of failing the matrix.
    #[serde(default)]
    pub allow_empty_matrix: bool,
}

fn default_runtime() -> String {
    "ruby".to_string()
}

fn default_bootstrap_marker() -> String {
    "-----> Download go".to_string()
}

impl SuiteConfig {
    /// Configuration with defaults for the buildpack at `buildpack_dir`.
    pub fn new(buildpack_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime: default_runtime(),
            buildpack_dir: buildpack_dir.into(),
            stack: None,
            buildpacks: BuildpackRefs::default(),
            fixtures: FixtureConfig::default(),
            timeouts: Timeouts::default(),
            not_latest_patch_version: None,
            unbuilt_bootstrap_marker: default_bootstrap_marker(),
            allow_empty_matrix: false,
        }
    }

    /// Load a TOML configuration file.
    ///
    /// A relative `buildpack_dir` or `cached_file` resolves against the
    /// directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(path, format!("cannot read: {e}")))?;
        let mut config: SuiteConfig =
            toml::from_str(&content).map_err(|e| Error::config(path, e.to_string()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.buildpack_dir = resolve(base, &config.buildpack_dir);
        if let Some(file) = &config.buildpacks.cached_file {
            config.buildpacks.cached_file = Some(resolve(base, file));
        }

        tracing::debug!(path = %path.display(), runtime = %config.runtime, "Loaded suite config");
        Ok(config)
    }

    /// Build the configuration from the process environment.
    ///
    /// Returns `Ok(None)` when neither [`ENV_CONFIG`] nor
    /// [`ENV_BUILDPACK_DIR`] is set, meaning the live suite is not
    /// configured on this machine.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`SuiteConfig::from_env`] against an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        let mut config = match (lookup(ENV_CONFIG), lookup(ENV_BUILDPACK_DIR)) {
            (Some(path), _) => Self::load(Path::new(&path))?,
            (None, Some(dir)) => Self::new(dir),
            (None, None) => return Ok(None),
        };
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(Some(config))
    }

    /// Apply `BRATS_*` overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_BUILDPACK_DIR) {
            self.buildpack_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup(ENV_CACHED_BUILDPACK) {
            self.buildpacks.cached = Some(name);
        }
        if let Some(file) = lookup(ENV_CACHED_FILE) {
            self.buildpacks.cached_file = Some(PathBuf::from(file));
        }
        if let Some(reference) = lookup(ENV_UNBUILT_BUILDPACK) {
            self.buildpacks.unbuilt = Some(reference);
        }
        if let Some(stack) = lookup(ENV_STACK) {
            self.stack = Some(stack);
        }
    }

    /// Reject configurations no case could run against.
    pub fn validate(&self) -> Result<()> {
        if self.runtime.trim().is_empty() {
            return Err(Error::config(&self.buildpack_dir, "runtime must not be empty"));
        }
        if !self.buildpack_dir.is_dir() {
            return Err(Error::config(
                &self.buildpack_dir,
                "buildpack_dir is not a directory",
            ));
        }
        if self.fixtures.version_placeholder.is_empty() {
            return Err(Error::config(
                &self.buildpack_dir,
                "fixtures.version_placeholder must not be empty",
            ));
        }
        Ok(())
    }

    /// Resolve a fixture path against the buildpack directory.
    pub fn fixture_path(&self, fixture: &Path) -> PathBuf {
        resolve(&self.buildpack_dir, fixture)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.start_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.http_secs)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SuiteConfig::new("/bp");
        assert_eq!(config.runtime, "ruby");
        assert_eq!(config.fixtures.version_file, "Gemfile");
        assert_eq!(config.fixtures.version_placeholder, "<%= ruby_version %>");
        assert_eq!(config.start_timeout(), Duration::from_secs(20));
        assert!(!config.allow_empty_matrix);
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("bp")).unwrap();
        let path = temp.path().join("brats.toml");
        fs::write(
            &path,
            r#"
runtime = "ruby"
buildpack_dir = "bp"
stack = "cflinuxfs2"

[buildpacks]
cached_file = "bp/ruby_buildpack-cached-v1.0.0.zip"

[timeouts]
start_secs = 60
"#,
        )
        .unwrap();

        let config = SuiteConfig::load(&path).unwrap();
        assert_eq!(config.buildpack_dir, temp.path().join("bp"));
        assert_eq!(
            config.buildpacks.cached_file,
            Some(temp.path().join("bp/ruby_buildpack-cached-v1.0.0.zip"))
        );
        assert_eq!(config.stack.as_deref(), Some("cflinuxfs2"));
        assert_eq!(config.timeouts.start_secs, 60);
        assert_eq!(config.timeouts.http_secs, 30);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("brats.toml");
        fs::write(&path, "runtime = [").unwrap();

        let err = SuiteConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_from_lookup_unconfigured() {
        assert!(SuiteConfig::from_lookup(lookup_from(&[])).unwrap().is_none());
    }

    #[test]
    fn test_from_lookup_with_overrides() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_string_lossy().to_string();
        let config = SuiteConfig::from_lookup(lookup_from(&[
            (ENV_BUILDPACK_DIR, dir.as_str()),
            (ENV_CACHED_BUILDPACK, "ruby_buildpack"),
            (ENV_UNBUILT_BUILDPACK, "https://github.com/cloudfoundry/ruby-buildpack"),
            (ENV_STACK, "cflinuxfs3"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(config.buildpack_dir, temp.path());
        assert_eq!(config.buildpacks.cached.as_deref(), Some("ruby_buildpack"));
        assert_eq!(
            config.buildpacks.unbuilt.as_deref(),
            Some("https://github.com/cloudfoundry/ruby-buildpack")
        );
        assert_eq!(config.stack.as_deref(), Some("cflinuxfs3"));
    }

    #[test]
    fn test_validate_rejects_missing_dir() {
        let config = SuiteConfig::new("/definitely/not/a/buildpack");
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_empty_runtime() {
        let temp = TempDir::new().unwrap();
        let mut config = SuiteConfig::new(temp.path());
        config.runtime = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixture_path() {
        let config = SuiteConfig::new("/bp");
        assert_eq!(
            config.fixture_path(&config.fixtures.brats),
            PathBuf::from("/bp/fixtures/brats")
        );
        assert_eq!(
            config.fixture_path(Path::new("/abs/app")),
            PathBuf::from("/abs/app")
        );
    }
}
