//! [`TestBuildpack`] builder for buildpack checkouts.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Manifest with two ruby lines, one of them carrying an outdated patch.
pub const RUBY_MANIFEST: &str = r#"---
language: ruby
default_versions:
- name: ruby
  version: 2.4.x
dependencies:
- name: ruby
  version: 2.3.5
  uri: https://buildpacks.example.com/dependencies/ruby/ruby-2.3.5-linux-x64.tgz
  sha256: 3b9d2c1a0f5e4d6c7b8a9e0f1d2c3b4a5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b
  cf_stacks:
  - cflinuxfs2
- name: ruby
  version: 2.4.1
  uri: https://buildpacks.example.com/dependencies/ruby/ruby-2.4.1-linux-x64.tgz
  sha256: 8c1f0e7d6b5a4c3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d
  cf_stacks:
  - cflinuxfs2
- name: ruby
  version: 2.4.2
  uri: https://buildpacks.example.com/dependencies/ruby/ruby-2.4.2-linux-x64.tgz
  sha256: 1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b
  cf_stacks:
  - cflinuxfs2
- name: bundler
  version: 1.15.4
  uri: https://buildpacks.example.com/dependencies/bundler/bundler-1.15.4.tgz
  sha256: 9f8e7d6c5b4a3f2e1d0c9b8a7f6e5d4c3b2a1f0e9d8c7b6a5f4e3d2c1b0a9f8e
  cf_stacks:
  - cflinuxfs2
"#;

const BRATS_GEMFILE: &str = "source 'https://rubygems.org'\n\nruby '<%= ruby_version %>'\n\ngem 'sinatra'\ngem 'nokogiri'\ngem 'eventmachine'\ngem 'bcrypt'\ngem 'bson'\ngem 'pg'\ngem 'mysql2'\n";

const BRATS_APP: &str = "require 'sinatra'\n\nget '/' do\n  'Hello, World!'\nend\n\nget '/version' do\n  RUBY_VERSION\nend\n";

const NO_DEPENDENCIES_APP: &str = "require 'webrick'\n\nserver = WEBrick::HTTPServer.new(Port: ENV['PORT'])\nserver.mount_proc('/') { |_, res| res.body = 'Hello world!' }\nserver.start\n";

/// A temporary buildpack checkout.
///
/// # Example
///
/// ```rust,no_run
/// use brats_test_utils::TestBuildpack;
///
/// let bp = TestBuildpack::ruby();
/// assert!(bp.root().join("manifest.yml").is_file());
/// ```
pub struct TestBuildpack {
    temp_dir: TempDir,
}

impl Default for TestBuildpack {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBuildpack {
    /// Create an empty checkout.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// A complete ruby buildpack checkout: [`RUBY_MANIFEST`], `VERSION`, and
    /// both fixtures.
    pub fn ruby() -> Self {
        let bp = Self::new();
        bp.with_manifest(RUBY_MANIFEST)
            .with_version("1.7.3")
            .with_brats_fixture()
            .with_no_dependencies_fixture()
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn with_manifest(self, content: &str) -> Self {
        self.write("manifest.yml", content);
        self
    }

    pub fn with_version(self, version: &str) -> Self {
        self.write("VERSION", &format!("{version}\n"));
        self
    }

    /// `fixtures/brats` with a Gemfile carrying the version placeholder.
    pub fn with_brats_fixture(self) -> Self {
        self.write("fixtures/brats/Gemfile", BRATS_GEMFILE);
        self.write("fixtures/brats/app.rb", BRATS_APP);
        self.write("fixtures/brats/config.ru", "require './app'\nrun Sinatra::Application\n");
        self
    }

    /// `fixtures/no_dependencies`, a bare ruby app with no Gemfile.
    pub fn with_no_dependencies_fixture(self) -> Self {
        self.write("fixtures/no_dependencies/app.rb", NO_DEPENDENCIES_APP);
        self
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("Could not write {}: {e}", path.display()));
    }
}
