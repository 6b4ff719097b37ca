//! Error handling for the CI pipeline
//!
//! This module provides the error taxonomy for pipeline stages with
//! recovery guidance, using the thiserror crate for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    // Metadata errors
    #[error("Failed to read manifest at {path}: {reason}")]
    ManifestRead { path: PathBuf, reason: String },

    // Command execution errors
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    #[error("Failed to spawn '{program}': {reason}")]
    CommandSpawn { program: String, reason: String },

    #[error("Command '{program}' exited with {}: {stderr}", code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    // Notification errors
    #[error("Webhook notification failed: {0}")]
    NotificationFailed(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Credential file errors
    #[error("Failed to write credential file at {path}: {reason}")]
    CredentialWrite { path: PathBuf, reason: String },
}

impl PipelineError {
    /// Get the machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ManifestRead { .. } => "MANIFEST_READ",
            Self::CommandNotAllowed(_) => "COMMAND_NOT_ALLOWED",
            Self::InvalidWorkingDirectory(_) => "INVALID_WORKING_DIRECTORY",
            Self::CommandSpawn { .. } => "COMMAND_SPAWN",
            Self::CommandFailed { .. } => "COMMAND_FAILED",
            Self::NotificationFailed(_) => "NOTIFICATION_FAILED",
            Self::Config(_) => "CONFIG",
            Self::CredentialWrite { .. } => "CREDENTIAL_WRITE",
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ManifestRead { .. } => vec![
                "Check that the build produced a distribution directory",
                "Verify the manifest is valid JSON with name and version fields",
            ],
            Self::CommandNotAllowed(_) => {
                vec!["Only npm, npx, node, and git may be invoked by the pipeline"]
            }
            Self::InvalidWorkingDirectory(_) => {
                vec!["Check the working-directory configuration value"]
            }
            Self::CommandSpawn { .. } => vec![
                "Check that the command is installed on the CI runner",
                "Check PATH for the current process",
            ],
            Self::CommandFailed { .. } => vec![
                "Inspect the command output above",
                "Re-run the stage locally with the same arguments",
            ],
            Self::NotificationFailed(_) => vec![
                "Verify the webhook URL is reachable from the runner",
                "The publish outcome was already logged before notification",
            ],
            Self::Config(_) => {
                vec!["Check .library-ci.yaml and the pipeline environment variables"]
            }
            Self::CredentialWrite { .. } => {
                vec!["Check permissions on the distribution directory"]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_read_error() {
        let error = PipelineError::ManifestRead {
            path: PathBuf::from("/dist/package.json"),
            reason: "No such file or directory".to_string(),
        };

        assert_eq!(error.code(), "MANIFEST_READ");
        assert!(error.to_string().contains("/dist/package.json"));
        assert!(!error.suggested_actions().is_empty());
    }

    #[test]
    fn test_command_failed_with_exit_code() {
        let error = PipelineError::CommandFailed {
            program: "npm".to_string(),
            code: Some(1),
            stderr: "E403 forbidden".to_string(),
        };

        assert_eq!(error.code(), "COMMAND_FAILED");
        let display = error.to_string();
        assert!(display.contains("npm"));
        assert!(display.contains("E403 forbidden"));
    }

    #[test]
    fn test_command_failed_without_exit_code() {
        let error = PipelineError::CommandFailed {
            program: "npm".to_string(),
            code: None,
            stderr: String::new(),
        };

        assert!(error.to_string().contains("signal"));
    }

    #[test]
    fn test_command_not_allowed() {
        let error = PipelineError::CommandNotAllowed("rm".to_string());
        assert_eq!(error.code(), "COMMAND_NOT_ALLOWED");
        assert!(error.to_string().contains("rm"));
    }

    #[test]
    fn test_notification_failed() {
        let error = PipelineError::NotificationFailed("connection refused".to_string());
        assert_eq!(error.code(), "NOTIFICATION_FAILED");
        assert!(
            error
                .suggested_actions()
                .iter()
                .any(|a| a.contains("webhook"))
        );
    }

    #[test]
    fn test_config_error() {
        let error = PipelineError::Config("invalid YAML".to_string());
        assert_eq!(error.code(), "CONFIG");
        assert!(error.to_string().contains("invalid YAML"));
    }
}
