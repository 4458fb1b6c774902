//! [`FakePackager`]: archives as plain text files.
//!
//! A fake archive lists one `entry=value` line per entry. The `VERSION`
//! entry is what [`FakePlatform`](crate::FakePlatform) reports as the
//! buildpack version.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use brats_cutlass::packager::artifact_file_name;
use brats_cutlass::{BuildpackArtifact, Error, PackageMode, Packager, Result, VERSION_ENTRY};

/// Packager writing text archives next to the buildpack checkout
#[derive(Debug, Default)]
pub struct FakePackager {
    packaged: Mutex<Vec<PathBuf>>,
}

impl FakePackager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archives produced by [`Packager::package`], in call order.
    pub fn packaged(&self) -> Vec<PathBuf> {
        self.packaged
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Write a fake archive at `path` declaring `version`.
    pub fn write_archive(path: &Path, version: &str, mode: PackageMode) -> Result<()> {
        let content = format!("{VERSION_ENTRY}={version}\nmode={mode}\nmanifest.yml=present\n");
        fs::write(path, content).map_err(|e| Error::io(path, e))
    }
}

impl Packager for FakePackager {
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
        let path = buildpack_dir.join(artifact_file_name(language, mode, &version));
        Self::write_archive(&path, &version, mode)?;
        self.packaged
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.clone());
        Ok(BuildpackArtifact { path, version })
    }

    fn read_version(&self, archive: &Path) -> Result<String> {
        read_archive_version(archive)
    }

    fn derive_with_version(
        &self,
        original: &BuildpackArtifact,
        version: &str,
        scratch_dir: &Path,
    ) -> Result<BuildpackArtifact> {
        let content = fs::read_to_string(&original.path).map_err(|e| Error::io(&original.path, e))?;
        let file_name = original
            .path
            .file_name()
            .ok_or_else(|| Error::ArtifactMissing {
                path: original.path.clone(),
            })?;
        let derived = scratch_dir.join(file_name);

        let prefix = format!("{VERSION_ENTRY}=");
        let mut lines: Vec<String> = content
            .lines()
            .filter(|line| !line.starts_with(&prefix))
            .map(str::to_string)
            .collect();
        lines.push(format!("{prefix}{version}"));
        fs::write(&derived, lines.join("\n") + "\n").map_err(|e| Error::io(&derived, e))?;

        Ok(BuildpackArtifact {
            path: derived,
            version: version.to_string(),
        })
    }
}

/// Version declared by a fake archive.
pub fn read_archive_version(archive: &Path) -> Result<String> {
    let content = fs::read_to_string(archive).map_err(|e| Error::io(archive, e))?;
    let prefix = format!("{VERSION_ENTRY}=");
    content
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .map(|v| v.trim().to_string())
        .ok_or_else(|| Error::Parse {
            what: archive.display().to_string(),
            message: format!("no {VERSION_ENTRY} entry"),
        })
}
