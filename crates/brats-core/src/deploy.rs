//! Deployment lifecycle
//!
//! [`DeployedApp`] ties an [`App`] to the platform it was pushed to and to
//! the working directory it was pushed from. Dropping it tears the
//! deployment down and then removes the directory, on every exit path:
//! normal return, `?` propagation, and panic unwinding.

use std::collections::BTreeMap;
use std::time::Duration;

use brats_cutlass::{App, HttpResponse, Platform, wait_until_running};

use crate::error::Result;
use crate::fixture::AppDir;
use crate::suite::SuiteContext;

/// A test application owned for the duration of one case
pub struct DeployedApp<'p> {
    platform: &'p dyn Platform,
    app: App,
    pushed: bool,
    // Declared last so the directory outlives the teardown in `drop`.
    _dir: Option<AppDir>,
}

impl<'p> DeployedApp<'p> {
    /// Take ownership of `app` and, optionally, the directory it lives in.
    pub fn new(platform: &'p dyn Platform, app: App, dir: Option<AppDir>) -> Self {
        Self {
            platform,
            app,
            pushed: false,
            _dir: dir,
        }
    }

    /// Push the app and wait until every instance is running.
    ///
    /// May be called again to redeploy; each push replaces the captured log.
    pub fn push(&mut self, start_timeout: Duration) -> Result<()> {
        // Mark before pushing: a half-created app must still be deleted.
        self.pushed = true;
        self.platform.push(&mut self.app)?;
        wait_until_running(self.platform, &self.app, start_timeout)?;
        tracing::info!(app = %self.app.name, "Application running");
        Ok(())
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Log captured by the most recent push.
    pub fn log(&self) -> &str {
        self.app.log()
    }

    pub fn get(&self, path: &str, headers: &BTreeMap<String, String>) -> Result<HttpResponse> {
        Ok(self.platform.get(&self.app, path, headers)?)
    }

    pub fn get_body(&self, path: &str) -> Result<String> {
        Ok(self.platform.get_body(&self.app, path)?)
    }
}

/// Push the app in `dir` bound to `buildpack` and wait for it to run.
///
/// On failure the partially created app is torn down and `dir` removed
/// before the error is returned.
pub fn deploy<'a>(ctx: &SuiteContext<'a>, dir: AppDir, buildpack: &str) -> Result<DeployedApp<'a>> {
    let app = App::new(dir.path())
        .with_buildpacks([buildpack])
        .with_stack(ctx.config.stack.clone());
    let mut deployed = DeployedApp::new(ctx.platform, app, Some(dir));
    deployed.push(ctx.config.start_timeout())?;
    Ok(deployed)
}

impl Drop for DeployedApp<'_> {
    fn drop(&mut self) {
        if !self.pushed {
            return;
        }
        if let Err(e) = self.platform.destroy(&self.app) {
            tracing::warn!(app = %self.app.name, "Failed to destroy application: {}", e);
        }
    }
}

impl std::fmt::Debug for DeployedApp<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployedApp")
            .field("app", &self.app.name)
            .field("pushed", &self.pushed)
            .finish()
    }
}
