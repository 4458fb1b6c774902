//! Cloud Foundry platform driven through the `cf` CLI
//!
//! The CLI must already be logged in and targeted at an org and space.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::app::App;
use crate::command::{self, CommandOutput};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpResponse};
use crate::platform::Platform;

/// Default position for newly created buildpacks
const BUILDPACK_POSITION: &str = "100";

/// [`Platform`] implementation backed by the `cf` CLI
#[derive(Debug, Clone)]
pub struct CfPlatform {
    cf: String,
    http: HttpClient,
}

impl CfPlatform {
    /// Use the `cf` binary found on `PATH`.
    pub fn new(http_timeout: Duration) -> Result<Self> {
        Self::with_binary("cf", http_timeout)
    }

    pub fn with_binary(cf: impl Into<String>, http_timeout: Duration) -> Result<Self> {
        Ok(Self {
            cf: cf.into(),
            http: HttpClient::new(http_timeout)?,
        })
    }

    fn cf(&self, args: &[&str]) -> Result<String> {
        command::run(&self.cf, args, None)
    }

    fn cf_capture(&self, args: &[&str]) -> Result<CommandOutput> {
        command::capture(&self.cf, args, None)
    }

    fn guid(&self, app: &App) -> Result<String> {
        Ok(self.cf(&["app", &app.name, "--guid"])?.trim().to_string())
    }

    fn route(&self, app: &App) -> Result<String> {
        let output = self.cf(&["app", &app.name])?;
        parse_routes(&output)
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoRoute {
                app: app.name.clone(),
            })
    }
}

impl Platform for CfPlatform {
    fn push(&self, app: &mut App) -> Result<()> {
        app.reset_log();

        let path = app.path.to_string_lossy().to_string();
        let mut args: Vec<&str> = vec!["push", &app.name, "--no-start", "-p", &path];
        for buildpack in &app.buildpacks {
            args.push("-b");
            args.push(buildpack);
        }
        if let Some(stack) = &app.stack {
            args.push("-s");
            args.push(stack);
        }

        tracing::info!(app = %app.name, buildpacks = ?app.buildpacks, "Pushing application");
        let created = self.cf_capture(&args)?;
        let mut log = created.combined();
        if !created.success() {
            app.append_log(&log);
            return Err(Error::PushFailed {
                app: app.name.clone(),
                log,
            });
        }

        for (key, value) in &app.env {
            self.cf(&["set-env", &app.name, key, value])?;
        }

        let started = self.cf_capture(&["start", &app.name])?;
        log.push_str(&started.combined());
        app.append_log(&log);
        if !started.success() {
            return Err(Error::PushFailed {
                app: app.name.clone(),
                log,
            });
        }
        Ok(())
    }

    fn instance_states(&self, app: &App) -> Result<Vec<String>> {
        let guid = self.guid(app)?;
        let body = self.cf(&["curl", &format!("/v2/apps/{guid}/instances")])?;
        parse_instance_states(&body)
    }

    fn get(
        &self,
        app: &App,
        path: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse> {
        let route = self.route(app)?;
        self.http.get(&app_url(&route, path), headers)
    }

    fn destroy(&self, app: &App) -> Result<()> {
        tracing::info!(app = %app.name, "Deleting application");
        self.cf(&["delete", "-f", "-r", &app.name]).map(|_| ())
    }

    fn create_or_update_buildpack(&self, name: &str, artifact: &Path) -> Result<()> {
        let artifact = artifact.to_string_lossy();
        // Older CLIs exit 0 when the buildpack already exists, so always
        // follow up with an update to bind the new artifact.
        let created = self.cf_capture(&[
            "create-buildpack",
            name,
            &artifact,
            BUILDPACK_POSITION,
            "--enable",
        ])?;
        if !created.success() {
            tracing::debug!(%name, output = %created.combined(), "create-buildpack failed, updating");
        }
        self.cf(&["update-buildpack", name, "-p", &artifact, "--enable"])
            .map(|_| ())
    }

    fn delete_buildpack(&self, name: &str) -> Result<()> {
        self.cf(&["delete-buildpack", "-f", name]).map(|_| ())
    }
}

/// Build the probe URL for `path` on `route`.
fn app_url(route: &str, path: &str) -> String {
    let route = route.trim_end_matches('/');
    if path.starts_with('/') {
        format!("http://{route}{path}")
    } else {
        format!("http://{route}/{path}")
    }
}

/// Extract routes from `cf app` output (`routes:` or legacy `urls:` line).
fn parse_routes(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| {
            line.strip_prefix("routes:")
                .or_else(|| line.strip_prefix("urls:"))
        })
        .map(|rest| {
            rest.split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct InstanceInfo {
    state: String,
}

/// Parse `/v2/apps/:guid/instances` into states ordered by instance index.
fn parse_instance_states(body: &str) -> Result<Vec<String>> {
    let instances: BTreeMap<String, InstanceInfo> =
        serde_json::from_str(body).map_err(|e| Error::Parse {
            what: "instance states".to_string(),
            message: e.to_string(),
        })?;

    let mut indexed: Vec<(u64, String)> = instances
        .into_iter()
        .map(|(index, info)| (index.parse().unwrap_or(u64::MAX), info.state))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, state)| state).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CF_APP_OUTPUT: &str = "\
Showing health and status for app brats-abc in org pivotal / space brats as admin...

name:              brats-abc
requested state:   started
routes:            brats-abc.cfapps.io, brats-abc-alt.cfapps.io
last uploaded:     Thu 19 Oct 10:00:00 UTC 2017
stack:             cflinuxfs2
buildpack:         ruby_buildpack
";

    #[test]
    fn test_parse_routes() {
        assert_eq!(
            parse_routes(CF_APP_OUTPUT),
            vec!["brats-abc.cfapps.io", "brats-abc-alt.cfapps.io"]
        );
    }

    #[test]
    fn test_parse_routes_legacy_urls_line() {
        assert_eq!(
            parse_routes("state: started\nurls: old.example.com\n"),
            vec!["old.example.com"]
        );
    }

    #[test]
    fn test_parse_routes_none() {
        assert!(parse_routes("name: brats-abc\nroutes:\n").is_empty());
    }

    #[test]
    fn test_parse_instance_states_orders_by_index() {
        let body = r#"{
            "10": {"state": "STARTING", "since": 1.0},
            "0": {"state": "RUNNING", "since": 1.0},
            "2": {"state": "CRASHED", "since": 1.0}
        }"#;
        assert_eq!(
            parse_instance_states(body).unwrap(),
            vec!["RUNNING", "CRASHED", "STARTING"]
        );
    }

    #[test]
    fn test_parse_instance_states_rejects_garbage() {
        assert!(matches!(
            parse_instance_states("CF-NotStaged").unwrap_err(),
            Error::Parse { .. }
        ));
    }

    #[test]
    fn test_app_url() {
        assert_eq!(app_url("a.example.com", "/version"), "http://a.example.com/version");
        assert_eq!(app_url("a.example.com/", "bcrypt"), "http://a.example.com/bcrypt");
    }
}
