//! Build-and-commit collaborator
//!
//! Opaque side effect invoked at defined pipeline pause points. The real
//! implementation shells out to a configured command with the release
//! context exposed through environment variables.

use crate::domain::SemanticVersion;
use crate::error::{FlowError, Result};
use std::process::Command;
use std::sync::Mutex;

/// What the build step is being run for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Release,
    Prerelease,
    Patch,
}

impl BuildMode {
    pub fn name(&self) -> &'static str {
        match self {
            BuildMode::Release => "release",
            BuildMode::Prerelease => "prerelease",
            BuildMode::Patch => "patch",
        }
    }
}

/// Build collaborator contract
pub trait BuildRunner: Send + Sync {
    /// Run the configured build steps and commit their output
    fn call_build_steps_and_commit(&self, mode: BuildMode, version: &SemanticVersion)
        -> Result<()>;
}

/// Runs a configured shell command as the build-and-commit step
///
/// The command receives `RELEASEFLOW_MODE` and `RELEASEFLOW_VERSION` in its
/// environment. A non-zero exit code is a failure.
pub struct CommandBuildRunner {
    program: String,
    args: Vec<String>,
}

impl CommandBuildRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandBuildRunner {
            program: program.into(),
            args,
        }
    }
}

impl BuildRunner for CommandBuildRunner {
    fn call_build_steps_and_commit(
        &self,
        mode: BuildMode,
        version: &SemanticVersion,
    ) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .env("RELEASEFLOW_MODE", mode.name())
            .env("RELEASEFLOW_VERSION", version.to_string())
            .output()
            .map_err(|e| {
                FlowError::build(format!("Failed to execute '{}': {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(FlowError::build(format!(
                "'{}' failed with exit code {}\nStdout: {}\nStderr: {}",
                self.program,
                output.status.code().unwrap_or(-1),
                stdout,
                stderr
            )));
        }

        Ok(())
    }
}

/// Recording test double for the build collaborator
pub struct RecordingBuildRunner {
    calls: Mutex<Vec<(BuildMode, SemanticVersion)>>,
}

impl RecordingBuildRunner {
    pub fn new() -> Self {
        RecordingBuildRunner {
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every invocation so far, in order
    pub fn calls(&self) -> Vec<(BuildMode, SemanticVersion)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for RecordingBuildRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildRunner for RecordingBuildRunner {
    fn call_build_steps_and_commit(
        &self,
        mode: BuildMode,
        version: &SemanticVersion,
    ) -> Result<()> {
        self.calls.lock().unwrap().push((mode, *version));
        Ok(())
    }
}
