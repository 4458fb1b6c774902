//! [`FakePlatform`]: an in-memory platform staging a simulated ruby
//! buildpack.
//!
//! Staging follows what the real buildpack prints:
//!
//! - `Installing ruby <version>` for the version in the app's Gemfile, or
//!   the manifest default when the app has no Gemfile
//! - the upgrade warning when the manifest carries a newer patch
//! - `buildpack version changed from` when an app is restaged with a
//!   buildpack whose archive content changed
//! - the output of an app's `.profile`
//! - the go bootstrap for unbuilt (URL) buildpack references
//!
//! Probes answer the way the brats and `no_dependencies` fixture apps do.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use brats_cutlass::{App, Error, HttpResponse, Platform, RUNNING, Result};
use brats_manifest::Manifest;
use sha2::{Digest, Sha256};

use crate::packager::read_archive_version;

/// Something the platform was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Pushed { app: String },
    Destroyed { app: String },
    BuildpackRegistered { name: String, version: String },
    BuildpackDeleted { name: String },
}

#[derive(Debug, Clone)]
struct Registered {
    digest: String,
    version: String,
}

#[derive(Debug, Clone)]
struct Deployment {
    version: String,
    buildpack: Option<Registered>,
    serves_brats: bool,
}

#[derive(Debug, Default)]
struct State {
    buildpacks: BTreeMap<String, Registered>,
    apps: BTreeMap<String, Deployment>,
    events: Vec<Event>,
    responses: BTreeMap<String, HttpResponse>,
    failing_versions: Vec<String>,
    instance_states: Option<Vec<String>>,
    always_report_change: bool,
}

/// In-memory [`Platform`] for one runtime
#[derive(Debug)]
pub struct FakePlatform {
    manifest: Manifest,
    runtime: String,
    state: Mutex<State>,
}

impl FakePlatform {
    pub fn new(manifest: Manifest, runtime: impl Into<String>) -> Self {
        Self {
            manifest,
            runtime: runtime.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Answer `GET path` with `status` and `body` on every app.
    pub fn override_response(&self, path: &str, status: u16, body: &str) {
        self.state().responses.insert(
            path.to_string(),
            HttpResponse {
                status,
                headers: BTreeMap::new(),
                body: body.to_string(),
            },
        );
    }

    /// Reject every push staging `version`.
    pub fn fail_pushes_for(&self, version: &str) {
        self.state().failing_versions.push(version.to_string());
    }

    /// Print the version-change notice on every push, changed or not.
    pub fn always_report_version_change(&self) {
        self.state().always_report_change = true;
    }

    /// Report `states` for every app instead of a single running instance.
    pub fn set_instance_states(&self, states: &[&str]) {
        self.state().instance_states = Some(states.iter().map(|s| s.to_string()).collect());
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    /// Names of apps currently deployed.
    pub fn deployed_apps(&self) -> Vec<String> {
        self.state().apps.keys().cloned().collect()
    }

    /// Names of buildpacks currently registered.
    pub fn registered_buildpacks(&self) -> Vec<String> {
        self.state().buildpacks.keys().cloned().collect()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stage(&self, app: &App, state: &State, log: &mut String) -> std::result::Result<Deployment, String> {
        let reference = app
            .buildpacks
            .first()
            .ok_or_else(|| "**ERROR** No buildpack specified".to_string())?;

        let buildpack = if reference.contains("://") {
            log.push_str("-----> Download go 1.9\n-----> Running go build supply\n");
            None
        } else {
            let registered = state
                .buildpacks
                .get(reference)
                .ok_or_else(|| format!("**ERROR** Buildpack {reference} not found"))?;
            log.push_str(&format!(
                "-----> Ruby Buildpack version {}\n",
                registered.version
            ));
            Some(registered.clone())
        };

        if state.always_report_change {
            log.push_str("   **WARNING** buildpack version changed from unknown to unknown\n");
        } else if let (Some(previous), Some(current)) = (
            state.apps.get(&app.name).and_then(|d| d.buildpack.as_ref()),
            buildpack.as_ref(),
        ) {
            if previous.digest != current.digest {
                log.push_str(&format!(
                    "   **WARNING** buildpack version changed from {} to {}\n",
                    previous.version, current.version
                ));
            }
        }

        let gemfile = app.path().join("Gemfile");
        let serves_brats = gemfile.is_file();
        let version = if serves_brats {
            requested_version(&gemfile)?
        } else {
            self.manifest
                .default_version(&self.runtime)
                .map(|dep| dep.version)
                .map_err(|e| format!("**ERROR** {e}"))?
        };

        if !self.manifest.all_versions(&self.runtime).contains(&version)
            || state.failing_versions.contains(&version)
        {
            return Err(format!(
                "**ERROR** Unable to install {}: no match found for {version}",
                self.runtime
            ));
        }
        if self.manifest.has_newer_patch(&self.runtime, &version) {
            log.push_str(&format!(
                "**WARNING** A newer version of {} is available in this buildpack. Please adjust your app to use version {} instead of version {version} as soon as possible. Old versions of {} are only provided to assist in migrating to newer versions.\n",
                self.runtime,
                self.manifest
                    .latest_patch(&self.runtime, &version)
                    .unwrap_or_default(),
                self.runtime
            ));
        }
        log.push_str(&format!("-----> Installing {} {version}\n", self.runtime));

        for line in profile_output(app.path()) {
            log.push_str(&line);
            log.push('\n');
        }

        Ok(Deployment {
            version,
            buildpack,
            serves_brats,
        })
    }
}

impl Platform for FakePlatform {
    fn push(&self, app: &mut App) -> Result<()> {
        app.reset_log();
        let mut state = self.state();
        state.events.push(Event::Pushed {
            app: app.name.clone(),
        });

        let mut log = String::from("Creating app...\n-----> Staging\n");
        let staged = self.stage(app, &state, &mut log);
        match staged {
            Ok(deployment) => {
                log.push_str("Waiting for app to start...\n");
                app.append_log(&log);
                state.apps.insert(app.name.clone(), deployment);
                Ok(())
            }
            Err(message) => {
                log.push_str(&message);
                log.push('\n');
                app.append_log(&log);
                Err(Error::PushFailed {
                    app: app.name.clone(),
                    log,
                })
            }
        }
    }

    fn instance_states(&self, app: &App) -> Result<Vec<String>> {
        let state = self.state();
        if !state.apps.contains_key(&app.name) {
            return Err(Error::CommandFailed {
                command: format!("cf app {} --guid", app.name),
                code: 1,
                stderr: format!("App {} not found", app.name),
            });
        }
        Ok(state
            .instance_states
            .clone()
            .unwrap_or_else(|| vec![RUNNING.to_string()]))
    }

    fn get(&self, app: &App, path: &str, _headers: &BTreeMap<String, String>) -> Result<HttpResponse> {
        let state = self.state();
        let deployment = state.apps.get(&app.name).ok_or_else(|| Error::NoRoute {
            app: app.name.clone(),
        })?;
        if let Some(response) = state.responses.get(path) {
            return Ok(response.clone());
        }

        let body = match (deployment.serves_brats, path) {
            (true, "/") => "Hello, World!".to_string(),
            (true, "/version") => deployment.version.clone(),
            (true, "/nokogiri") => "Hello, World".to_string(),
            (true, "/em") => "Hello, EventMachine".to_string(),
            (true, "/bcrypt") => bcrypt::hash("Hello, bcrypt", 4).map_err(|e| Error::Http {
                url: path.to_string(),
                message: e.to_string(),
            })?,
            (true, "/bson") => "00040000".to_string(),
            (true, "/pg") => {
                "could not connect to server: No such file or directory\n\tIs the server running locally and accepting\n\tconnections on Unix domain socket \"/var/run/postgresql/.s.PGSQL.5432\"?".to_string()
            }
            (true, "/mysql2") => "Unknown MySQL server host 'testing' (0)".to_string(),
            (false, "/") => "Hello world!".to_string(),
            _ => {
                return Ok(HttpResponse {
                    status: 404,
                    headers: BTreeMap::new(),
                    body: "Not Found".to_string(),
                });
            }
        };
        Ok(HttpResponse {
            status: 200,
            headers: BTreeMap::new(),
            body,
        })
    }

    fn destroy(&self, app: &App) -> Result<()> {
        let mut state = self.state();
        state.apps.remove(&app.name);
        state.events.push(Event::Destroyed {
            app: app.name.clone(),
        });
        Ok(())
    }

    fn create_or_update_buildpack(&self, name: &str, artifact: &Path) -> Result<()> {
        let bytes = fs::read(artifact).map_err(|e| Error::io(artifact, e))?;
        let digest = Sha256::digest(&bytes)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>();
        let version = read_archive_version(artifact)?;

        let mut state = self.state();
        state.events.push(Event::BuildpackRegistered {
            name: name.to_string(),
            version: version.clone(),
        });
        state
            .buildpacks
            .insert(name.to_string(), Registered { digest, version });
        Ok(())
    }

    fn delete_buildpack(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        state.buildpacks.remove(name);
        state.events.push(Event::BuildpackDeleted {
            name: name.to_string(),
        });
        Ok(())
    }
}

/// Ruby version requested by a Gemfile's `ruby '...'` line.
fn requested_version(gemfile: &Path) -> std::result::Result<String, String> {
    let content = fs::read_to_string(gemfile)
        .map_err(|e| format!("**ERROR** Cannot read {}: {e}", gemfile.display()))?;
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("ruby "))
        .map(|v| v.trim_matches(|c| c == '\'' || c == '"').to_string())
        .ok_or_else(|| "**ERROR** Gemfile does not declare a ruby version".to_string())
}

/// Lines echoed by the app's `.profile`, if it has one.
fn profile_output(app_dir: &Path) -> Vec<String> {
    let profile: PathBuf = app_dir.join(".profile");
    fs::read_to_string(profile)
        .map(|script| {
            script
                .lines()
                .filter_map(|line| line.trim().strip_prefix("echo "))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
