//! Buildpack packaging seam
//!
//! A packaged buildpack is a zip archive with a top-level `VERSION` entry.
//! The acceptance suite needs two operations from the packager: build an
//! archive from a buildpack checkout, and derive a copy of an archive whose
//! `VERSION` entry has been replaced.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::command;
use crate::error::{Error, Result};

/// Name of the archive entry declaring the packaged buildpack version
pub const VERSION_ENTRY: &str = "VERSION";

/// Whether dependencies are bundled into the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageMode {
    /// Dependencies are pre-bundled
    Cached,
    /// Dependencies are downloaded at staging time
    Uncached,
}

impl PackageMode {
    fn flag(self) -> &'static str {
        match self {
            PackageMode::Cached => "--cached",
            PackageMode::Uncached => "--uncached",
        }
    }

    fn file_infix(self) -> &'static str {
        match self {
            PackageMode::Cached => "-cached",
            PackageMode::Uncached => "",
        }
    }
}

impl fmt::Display for PackageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageMode::Cached => write!(f, "cached"),
            PackageMode::Uncached => write!(f, "uncached"),
        }
    }
}

/// A packaged buildpack archive on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildpackArtifact {
    pub path: PathBuf,
    /// Content of the archive's `VERSION` entry
    pub version: String,
}

/// Builds and derives buildpack archives.
pub trait Packager {
    /// Package the buildpack checked out at `buildpack_dir`.
    fn package(
        &self,
        buildpack_dir: &Path,
        language: &str,
        mode: PackageMode,
    ) -> Result<BuildpackArtifact>;

    /// Read the `VERSION` entry of an existing archive.
    fn read_version(&self, archive: &Path) -> Result<String>;

    /// Copy `original` into `scratch_dir` and replace its `VERSION` entry
    /// with `version`. Every other entry is left untouched.
    fn derive_with_version(
        &self,
        original: &BuildpackArtifact,
        version: &str,
        scratch_dir: &Path,
    ) -> Result<BuildpackArtifact>;
}

/// [`Packager`] backed by `buildpack-packager`, `zip` and `unzip`
#[derive(Debug, Clone)]
pub struct CliPackager {
    packager: String,
    zip: String,
    unzip: String,
}

impl Default for CliPackager {
    fn default() -> Self {
        Self {
            packager: "buildpack-packager".to_string(),
            zip: "zip".to_string(),
            unzip: "unzip".to_string(),
        }
    }
}

impl CliPackager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Packager for CliPackager {
    fn package(
        &self,
        buildpack_dir: &Path,
        language: &str,
        mode: PackageMode,
    ) -> Result<BuildpackArtifact> {
        let version_path = buildpack_dir.join(VERSION_ENTRY);
        let version = fs::read_to_string(&version_path)
            .map_err(|e| Error::io(&version_path, e))?
            .trim()
            .to_string();

        tracing::info!(dir = %buildpack_dir.display(), %mode, %version, "Packaging buildpack");
        command::run(
            &self.packager,
            ["build", mode.flag(), "--any-stack"],
            Some(buildpack_dir),
        )?;

        let path = buildpack_dir.join(artifact_file_name(language, mode, &version));
        if !path.is_file() {
            return Err(Error::ArtifactMissing { path });
        }
        Ok(BuildpackArtifact { path, version })
    }

    fn read_version(&self, archive: &Path) -> Result<String> {
        let archive_arg = archive.to_string_lossy().to_string();
        let out = command::run(&self.unzip, ["-p", archive_arg.as_str(), VERSION_ENTRY], None)?;
        Ok(out.trim().to_string())
    }

    fn derive_with_version(
        &self,
        original: &BuildpackArtifact,
        version: &str,
        scratch_dir: &Path,
    ) -> Result<BuildpackArtifact> {
        let file_name = original
            .path
            .file_name()
            .ok_or_else(|| Error::ArtifactMissing {
                path: original.path.clone(),
            })?;
        let derived = scratch_dir.join(file_name);
        fs::copy(&original.path, &derived).map_err(|e| Error::io(&derived, e))?;

        let version_file = scratch_dir.join(VERSION_ENTRY);
        fs::write(&version_file, version).map_err(|e| Error::io(&version_file, e))?;

        let derived_arg = derived.to_string_lossy().to_string();
        let version_arg = version_file.to_string_lossy().to_string();
        command::run(&self.zip, ["-d", derived_arg.as_str(), VERSION_ENTRY], None)?;
        command::run(&self.zip, ["-j", "-u", derived_arg.as_str(), version_arg.as_str()], None)?;

        tracing::debug!(
            original = %original.path.display(),
            derived = %derived.display(),
            %version,
            "Derived buildpack archive"
        );
        Ok(BuildpackArtifact {
            path: derived,
            version: version.to_string(),
        })
    }
}

/// File name `buildpack-packager` gives an any-stack archive.
pub fn artifact_file_name(language: &str, mode: PackageMode, version: &str) -> String {
    format!("{language}_buildpack{}-v{version}.zip", mode.file_infix())
}
