//! The deployment platform seam

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;

use crate::app::App;
use crate::error::{Error, Result};
use crate::http::HttpResponse;

/// Instance state reported by a healthy, started application
pub const RUNNING: &str = "RUNNING";

/// A platform that stages and runs applications with buildpacks.
///
/// Every call blocks until the platform answers; the platform's own timeouts
/// govern failure.
pub trait Platform {
    /// Stage and start `app`, replacing its log with the push output.
    ///
    /// A rejected push returns [`Error::PushFailed`] carrying the log.
    fn push(&self, app: &mut App) -> Result<()>;

    /// Current state of each instance of `app`.
    fn instance_states(&self, app: &App) -> Result<Vec<String>>;

    /// GET `path` on the app's route.
    fn get(&self, app: &App, path: &str, headers: &BTreeMap<String, String>)
    -> Result<HttpResponse>;

    /// Delete the app and its routes.
    fn destroy(&self, app: &App) -> Result<()>;

    /// Register `artifact` under `name`, replacing any existing binding.
    fn create_or_update_buildpack(&self, name: &str, artifact: &Path) -> Result<()>;

    /// Remove the buildpack registered under `name`.
    fn delete_buildpack(&self, name: &str) -> Result<()>;

    /// GET `path` and return only the body.
    fn get_body(&self, app: &App, path: &str) -> Result<String> {
        Ok(self.get(app, path, &BTreeMap::new())?.body)
    }
}

/// Poll instance states until every instance is `RUNNING` or `timeout`
/// elapses.
///
/// A failed poll is retried like a not-yet-running one; on timeout the last
/// error or the last states seen are returned.
pub fn wait_until_running(platform: &dyn Platform, app: &App, timeout: Duration) -> Result<()> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(250))
        .with_max_interval(Duration::from_secs(2))
        .with_max_elapsed_time(Some(timeout))
        .build();

    let result = backoff::retry(policy, || {
        let states = platform.instance_states(app).map_err(|e| {
            tracing::debug!(app = %app.name, "Instance states unavailable: {}", e);
            backoff::Error::transient(e)
        })?;
        if !states.is_empty() && states.iter().all(|s| s == RUNNING) {
            return Ok(());
        }
        Err(backoff::Error::transient(Error::NotRunning {
            app: app.name.clone(),
            states,
        }))
    });

    match result {
        Ok(()) => Ok(()),
        Err(backoff::Error::Permanent(e)) => Err(e),
        Err(backoff::Error::Transient { err, .. }) => Err(err),
    }
}
