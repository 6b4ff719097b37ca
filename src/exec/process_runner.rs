//! ProcessRunner: external command execution with injection prevention
//!
//! Production implementation of the `CommandRunner` seam. Only whitelisted
//! programs can run, arguments are passed as a vector without shell
//! interpolation, and the working directory is validated at construction.

use crate::core::error::PipelineError;
use crate::core::traits::{CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Allowed commands whitelist.
///
/// The pipeline only ever shells out to the package manager, the framework
/// CLI launcher, hook scripts, and git.
const ALLOWED_COMMANDS: &[&str] = &["npm", "npx", "node", "git"];

/// Command runner over `tokio::process::Command`
///
/// # Example
///
/// ```rust,no_run
/// use library_ci::{CommandRunner, CommandSpec, ProcessRunner};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), library_ci::PipelineError> {
/// let runner = ProcessRunner::new(std::env::temp_dir())?;
/// let version = runner
///     .run_captured(&CommandSpec::new("git", &["--version"]))
///     .await?;
/// println!("{}", version);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProcessRunner {
    /// Default working directory for invocations without an explicit one
    base_dir: PathBuf,
}

impl ProcessRunner {
    /// Create a runner rooted at `base_dir`. The directory must exist.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, PipelineError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        if !base_dir.exists() {
            return Err(PipelineError::InvalidWorkingDirectory(base_dir));
        }

        Ok(Self { base_dir })
    }

    /// Build the tokio command for a spec, applying the whitelist and the
    /// Windows `.cmd` shim for npm-family launchers.
    fn command_for(&self, spec: &CommandSpec) -> Result<Command, PipelineError> {
        if !ALLOWED_COMMANDS.contains(&spec.program.as_str()) {
            return Err(PipelineError::CommandNotAllowed(spec.program.clone()));
        }

        // npm and npx are .cmd files on Windows, not .exe
        #[cfg(target_os = "windows")]
        let program = if matches!(spec.program.as_str(), "npm" | "npx") {
            format!("{}.cmd", spec.program)
        } else {
            spec.program.clone()
        };

        #[cfg(not(target_os = "windows"))]
        let program = spec.program.clone();

        let mut command = Command::new(program);
        command
            .args(&spec.args)
            .current_dir(spec.current_dir.as_ref().unwrap_or(&self.base_dir));

        for (key, value) in &spec.envs {
            command.env(key, value);
        }

        Ok(command)
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run_captured(&self, spec: &CommandSpec) -> Result<String, PipelineError> {
        let output = self
            .command_for(spec)?
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PipelineError::CommandSpawn {
                program: spec.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(PipelineError::CommandFailed {
                program: spec.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn run_streamed(&self, spec: &CommandSpec) -> Result<(), PipelineError> {
        let status = self
            .command_for(spec)?
            .status()
            .await
            .map_err(|e| PipelineError::CommandSpawn {
                program: spec.program.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(PipelineError::CommandFailed {
                program: spec.program.clone(),
                code: status.code(),
                stderr: String::new(),
            });
        }

        Ok(())
    }
}
