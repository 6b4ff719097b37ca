//! Core traits for the pipeline's external collaborators
//!
//! This module defines the seams between the pipeline and the outside
//! world: external process execution and webhook notification. The
//! production implementations live in `exec` and `notify`; tests substitute
//! recording fakes.

use crate::core::error::PipelineError;
use async_trait::async_trait;
use std::path::PathBuf;

// ============================================================================
// Command execution
// ============================================================================

/// A single external command invocation.
///
/// Environment variables needed by the child (for example the test-grid
/// credentials) are carried here explicitly rather than exported into the
/// pipeline's own process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute (must be in the runner's whitelist)
    pub program: String,

    /// Command line arguments, passed without shell interpretation
    pub args: Vec<String>,

    /// Working directory for the child (defaults to the runner's base dir)
    pub current_dir: Option<PathBuf>,

    /// Extra environment for the child process only
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a spec for `program` with the given arguments.
    pub fn new<S: Into<String>>(program: S, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    /// Set the working directory for the invocation.
    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Add an environment variable for the child process.
    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

/// Executes external processes on behalf of pipeline stages.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command and capture its stdout.
    ///
    /// A non-zero exit resolves to `PipelineError::CommandFailed` carrying
    /// the captured stderr.
    async fn run_captured(&self, spec: &CommandSpec) -> Result<String, PipelineError>;

    /// Run a command with stdout/stderr inherited from this process, for
    /// live visibility of long builds and publishes.
    async fn run_streamed(&self, spec: &CommandSpec) -> Result<(), PipelineError>;
}

// ============================================================================
// Notification
// ============================================================================

/// Delivers a text message to the configured chat channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` and await completion.
    ///
    /// Delivery failures propagate to the caller; an unconfigured notifier
    /// logs an informational no-op and returns Ok.
    async fn notify(&self, message: &str) -> Result<(), PipelineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_new() {
        let spec = CommandSpec::new("npm", &["ci"]);
        assert_eq!(spec.program, "npm");
        assert_eq!(spec.args, vec!["ci".to_string()]);
        assert!(spec.current_dir.is_none());
        assert!(spec.envs.is_empty());
    }

    #[test]
    fn test_command_spec_builder() {
        let spec = CommandSpec::new("git", &["log", "-1"])
            .current_dir("/work")
            .env("GIT_PAGER", "cat");

        assert_eq!(spec.current_dir, Some(PathBuf::from("/work")));
        assert_eq!(
            spec.envs,
            vec![("GIT_PAGER".to_string(), "cat".to_string())]
        );
    }
}
