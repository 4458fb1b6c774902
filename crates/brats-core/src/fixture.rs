//! Fixture materialization
//!
//! Every deployment gets its own copy of a fixture application inside a
//! fresh temporary directory. The copy keeps the fixture's directory name so
//! platform app names stay recognisable. Dropping the [`AppDir`] removes the
//! copy.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::SuiteConfig;
use crate::error::{Error, Result};

/// Marker printed by the `.profile` script added to test applications
pub const PROFILE_MARKER: &str = "PROFILE_SCRIPT_IS_PRESENT_AND_RAN";

/// File name of the startup hook script
pub const PROFILE_SCRIPT: &str = ".profile";

/// An exclusively owned copy of a fixture application
#[derive(Debug)]
pub struct AppDir {
    path: PathBuf,
    _root: TempDir,
}

impl AppDir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Copy the fixture at `fixture` into a fresh temporary directory.
pub fn copy_fixture(fixture: &Path) -> Result<AppDir> {
    if !fixture.is_dir() {
        return Err(Error::fixture(fixture, "fixture directory does not exist"));
    }
    let name = fixture
        .file_name()
        .ok_or_else(|| Error::fixture(fixture, "fixture path has no directory name"))?;

    let root = tempfile::Builder::new()
        .prefix("brats-")
        .tempdir()
        .map_err(|e| Error::fixture(fixture, format!("cannot create temp dir: {e}")))?;
    let path = root.path().join(name);
    copy_dir(fixture, &path)?;

    tracing::debug!(from = %fixture.display(), to = %path.display(), "Copied fixture");
    Ok(AppDir { path, _root: root })
}

/// Copy the brats fixture and stamp `version` into its version marker file.
pub fn copy_simple_brats(config: &SuiteConfig, version: &str) -> Result<AppDir> {
    let app_dir = copy_fixture(&config.fixture_path(&config.fixtures.brats))?;
    write_version_marker(
        app_dir.path(),
        &config.fixtures.version_file,
        &config.fixtures.version_placeholder,
        version,
    )?;
    Ok(app_dir)
}

/// Replace every `placeholder` in `dir/file` with `version`.
pub fn write_version_marker(dir: &Path, file: &str, placeholder: &str, version: &str) -> Result<()> {
    let path = dir.join(file);
    let content = fs::read_to_string(&path)
        .map_err(|e| Error::fixture(&path, format!("cannot read version marker: {e}")))?;
    if !content.contains(placeholder) {
        return Err(Error::fixture(
            &path,
            format!("version placeholder '{placeholder}' not found"),
        ));
    }
    fs::write(&path, content.replace(placeholder, version))
        .map_err(|e| Error::fixture(&path, format!("cannot write version marker: {e}")))
}

/// Add an executable `.profile` that prints [`PROFILE_MARKER`].
pub fn add_dot_profile_script(dir: &Path) -> Result<()> {
    let path = dir.join(PROFILE_SCRIPT);
    let script = format!("#!/usr/bin/env bash\necho {PROFILE_MARKER}\n");
    fs::write(&path, script).map_err(|e| Error::fixture(&path, e.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .map_err(|e| Error::fixture(&path, e.to_string()))?;
    }
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| Error::fixture(to, e.to_string()))?;
    let entries = fs::read_dir(from).map_err(|e| Error::fixture(from, e.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::fixture(from, e.to_string()))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        if source.is_dir() {
            copy_dir(&source, &target)?;
        } else {
            // fs::copy keeps permission bits, so executables stay executable.
            fs::copy(&source, &target).map_err(|e| Error::fixture(&source, e.to_string()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let brats = temp.path().join("fixtures/brats");
        fs::create_dir_all(brats.join("views")).unwrap();
        fs::write(
            brats.join("Gemfile"),
            "source 'https://rubygems.org'\nruby '<%= ruby_version %>'\ngem 'sinatra'\n",
        )
        .unwrap();
        fs::write(brats.join("views/index.erb"), "Hello").unwrap();
        temp
    }

    #[test]
    fn test_copy_fixture_keeps_name_and_tree() {
        let temp = fixture_tree();
        let app = copy_fixture(&temp.path().join("fixtures/brats")).unwrap();

        assert_eq!(app.path().file_name().unwrap(), "brats");
        assert!(app.path().join("views/index.erb").is_file());
    }

    #[test]
    fn test_copy_fixture_is_removed_on_drop() {
        let temp = fixture_tree();
        let app = copy_fixture(&temp.path().join("fixtures/brats")).unwrap();
        let path = app.path().to_path_buf();
        drop(app);
        assert!(!path.exists());
    }

    #[test]
    fn test_copy_missing_fixture() {
        let err = copy_fixture(Path::new("/no/such/fixture")).unwrap_err();
        assert!(matches!(err, Error::Fixture { .. }));
    }

    #[test]
    fn test_copy_simple_brats_stamps_version() {
        let temp = fixture_tree();
        let config = SuiteConfig::new(temp.path());

        let app = copy_simple_brats(&config, "2.4.1").unwrap();
        let gemfile = fs::read_to_string(app.path().join("Gemfile")).unwrap();

        assert!(gemfile.contains("ruby '2.4.1'"));
        assert!(!gemfile.contains("<%="));
        // The source fixture is untouched.
        let original = fs::read_to_string(temp.path().join("fixtures/brats/Gemfile")).unwrap();
        assert!(original.contains("<%= ruby_version %>"));
    }

    #[test]
    fn test_copies_are_independent() {
        let temp = fixture_tree();
        let config = SuiteConfig::new(temp.path());

        let a = copy_simple_brats(&config, "2.4.1").unwrap();
        let b = copy_simple_brats(&config, "2.4.2").unwrap();

        assert_ne!(a.path(), b.path());
        assert!(fs::read_to_string(b.path().join("Gemfile")).unwrap().contains("2.4.2"));
    }

    #[test]
    fn test_version_marker_without_placeholder() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Gemfile"), "ruby '2.3.0'\n").unwrap();

        let err =
            write_version_marker(temp.path(), "Gemfile", "<%= ruby_version %>", "2.4.1").unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[cfg(unix)]
    #[test]
    fn test_add_dot_profile_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        add_dot_profile_script(temp.path()).unwrap();

        let path = temp.path().join(PROFILE_SCRIPT);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("#!/usr/bin/env bash"));
        assert!(content.contains(PROFILE_MARKER));
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o755);
    }
}
