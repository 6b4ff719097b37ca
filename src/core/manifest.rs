//! Package and workspace manifest reading
//!
//! The publish step reads the built package manifest from the distribution
//! directory; the driver reads the workspace manifest to discover which
//! project is the publishable library.

use crate::core::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Package manifest file name in the distribution directory
pub const PACKAGE_MANIFEST: &str = "package.json";

/// Workspace manifest file name in the working directory
pub const WORKSPACE_MANIFEST: &str = "angular.json";

/// Name and version of the built package, read from the distribution
/// manifest. Immutable once read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
}

impl PackageDescriptor {
    /// Read the manifest from `<dist_path>/package.json`.
    ///
    /// Missing or malformed manifests are not recovered here; the error
    /// propagates and aborts the publish step.
    pub async fn read(dist_path: &Path) -> Result<Self, PipelineError> {
        let path = dist_path.join(PACKAGE_MANIFEST);

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| PipelineError::ManifestRead {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| PipelineError::ManifestRead {
            path,
            reason: e.to_string(),
        })
    }

    /// Sanity check the version against semver; returns a warning line for
    /// the console when it does not parse. Never an error: the registry
    /// has the final say.
    pub fn semver_warning(&self) -> Option<String> {
        if semver::Version::parse(&self.version).is_ok() {
            None
        } else {
            Some(format!(
                "Version '{}' of '{}' is not valid semver; the registry may reject it.",
                self.version, self.name
            ))
        }
    }
}

/// Find the library project name in the workspace manifest.
///
/// Scans `<workdir>/angular.json` for the first project in file order
/// whose `projectType` is `library` (file order needs serde_json's
/// `preserve_order` feature).
pub async fn find_library_project(workdir: &Path) -> Result<String, PipelineError> {
    let path = workdir.join(WORKSPACE_MANIFEST);

    let content = fs::read_to_string(&path)
        .await
        .map_err(|e| PipelineError::ManifestRead {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    let manifest: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| PipelineError::ManifestRead {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    manifest
        .get("projects")
        .and_then(|projects| projects.as_object())
        .and_then(|projects| {
            projects.iter().find_map(|(name, project)| {
                (project.get("projectType").and_then(|t| t.as_str()) == Some("library"))
                    .then(|| name.clone())
            })
        })
        .ok_or_else(|| PipelineError::ManifestRead {
            path,
            reason: "no project with projectType \"library\" found".to_string(),
        })
}
