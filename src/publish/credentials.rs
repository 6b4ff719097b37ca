//! Transient registry credential file
//!
//! The publish command authenticates through a `.npmrc` written into the
//! distribution directory. The file is scoped to one publish attempt: the
//! guard removes it on drop, so it cannot outlive the step on any exit
//! path, including errors and panics.

use crate::core::error::PipelineError;
use crate::security::token::{NPM_REGISTRY_HOST, RegistryToken};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Credential file name inside the distribution directory
pub const CREDENTIAL_FILENAME: &str = ".npmrc";

/// RAII guard for the transient credential file
#[derive(Debug)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    /// Write the credential file into `dist_path`.
    ///
    /// An absent token still produces a file with an empty auth value; the
    /// registry rejects it upstream, which is the accepted behavior.
    pub async fn write(
        dist_path: &Path,
        token: Option<&RegistryToken>,
    ) -> Result<Self, PipelineError> {
        let path = dist_path.join(CREDENTIAL_FILENAME);

        let line = match token {
            Some(token) => token.npmrc_line(),
            None => format!("//{}/:_authToken=", NPM_REGISTRY_HOST),
        };

        fs::write(&path, line)
            .await
            .map_err(|e| PipelineError::CredentialWrite {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CredentialFile {
    fn drop(&mut self) {
        // Removal cannot report failure from a destructor; a leftover file
        // here would only survive if the directory itself is gone.
        let _ = std::fs::remove_file(&self.path);
    }
}
