//! Test application handle
//!
//! An [`App`] names one deployment of a fixture directory. It records which
//! buildpacks the push binds to and keeps the log captured by the most
//! recent push.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Length of the random suffix appended to application names
const NAME_SUFFIX_LEN: usize = 20;

/// One deployable application
#[derive(Debug, Clone)]
pub struct App {
    /// Unique platform name (`<fixture>-<random>`)
    pub name: String,
    /// Directory pushed to the platform
    pub path: PathBuf,
    /// Buildpack references, in detection order
    pub buildpacks: Vec<String>,
    /// Stack to stage on; platform default when `None`
    pub stack: Option<String>,
    /// Environment variables set before the app starts
    pub env: BTreeMap<String, String>,
    stdout: String,
}

impl App {
    /// Create an app for the fixture directory at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "app".to_string());
        Self {
            name: format!("{}-{}", sanitize(&base), random_suffix(NAME_SUFFIX_LEN)),
            path,
            buildpacks: Vec::new(),
            stack: None,
            env: BTreeMap::new(),
            stdout: String::new(),
        }
    }

    /// Bind the app to the given buildpack references.
    pub fn with_buildpacks<I, S>(mut self, buildpacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buildpacks = buildpacks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log captured by the most recent push.
    pub fn log(&self) -> &str {
        &self.stdout
    }

    /// Discard the previous push's log before a new push.
    pub fn reset_log(&mut self) {
        self.stdout.clear();
    }

    pub fn append_log(&mut self, text: &str) {
        self.stdout.push_str(text);
    }
}

/// Lowercase alphanumeric suffix drawn from a v4 UUID.
pub fn random_suffix(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        out.push_str(&uuid::Uuid::new_v4().simple().to_string());
    }
    out.truncate(len);
    out
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_uses_fixture_basename() {
        let app = App::new("/tmp/fixtures/no_dependencies");
        assert!(app.name.starts_with("no-dependencies-"), "got {}", app.name);
        assert_eq!(app.name.len(), "no-dependencies-".len() + NAME_SUFFIX_LEN);
    }

    #[test]
    fn test_names_are_unique() {
        let a = App::new("/tmp/brats");
        let b = App::new("/tmp/brats");
        assert_ne!(a.name, b.name);
    }

    #[test]
    fn test_log_reset() {
        let mut app = App::new("/tmp/brats");
        app.append_log("Installing ruby 2.4.1\n");
        assert!(app.log().contains("Installing ruby"));
        app.reset_log();
        assert!(app.log().is_empty());
    }

    #[test]
    fn test_random_suffix_length() {
        assert_eq!(random_suffix(6).len(), 6);
        assert_eq!(random_suffix(40).len(), 40);
    }
}
