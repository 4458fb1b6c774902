//! Subprocess execution for external tooling
//!
//! Wraps `std::process::Command` so every collaborator reports failures the
//! same way: spawn errors carry the program name, non-zero exits carry the
//! rendered command line and stderr.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Stdout followed by stderr, the way a terminal would interleave them
    /// for tools that log progress to both.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Run `program args...` and capture its output, whatever the exit status.
pub fn capture<I, S>(program: &str, args: I, working_dir: Option<&Path>) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    tracing::debug!(command = ?cmd, "Running external command");

    let output = cmd.output().map_err(|source| Error::Spawn {
        program: program.to_string(),
        source,
    })?;

    Ok(CommandOutput {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run `program args...` and fail unless it exits successfully.
pub fn run<I, S>(program: &str, args: I, working_dir: Option<&Path>) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let rendered = render(program, &args);
    let output = capture(program, args, working_dir)?;

    if output.success() {
        Ok(output.stdout)
    } else {
        Err(Error::CommandFailed {
            command: rendered,
            code: output.code,
            stderr: output.stderr,
        })
    }
}

fn render<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.as_ref().to_string_lossy());
    }
    rendered
}
