//! NPM publish step
//!
//! The one pipeline stage with real sequencing and cleanup contracts:
//! read the built package manifest, resolve the distribution tag, write
//! the transient credential file, run `npm publish`, then report the
//! outcome on the console and to the chat channel. The credential file is
//! removed on every exit path.

use crate::core::config::PipelineConfig;
use crate::core::error::PipelineError;
use crate::core::manifest::PackageDescriptor;
use crate::core::traits::{CommandRunner, CommandSpec, Notifier};
use crate::publish::credentials::CredentialFile;
use crate::security::token::mask_optional;
use std::path::{Path, PathBuf};

/// Release channel label attached to the published version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistTag {
    Latest,
    Next,
}

impl DistTag {
    /// Pre-release versions (any version containing a hyphen) publish to
    /// `next`; stable versions to `latest`.
    pub fn for_version(release: &str) -> Self {
        if release.contains('-') {
            DistTag::Next
        } else {
            DistTag::Latest
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistTag::Latest => "latest",
            DistTag::Next => "next",
        }
    }
}

/// Result of one publish attempt; never partially applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub success: bool,
    /// The exact user-facing log line for this outcome
    pub message: String,
}

/// The publish step
pub struct NpmPublisher<'a> {
    dist_path: PathBuf,
    config: &'a PipelineConfig,
    runner: &'a dyn CommandRunner,
    notifier: &'a dyn Notifier,
}

impl<'a> NpmPublisher<'a> {
    pub fn new(
        dist_path: &Path,
        config: &'a PipelineConfig,
        runner: &'a dyn CommandRunner,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            dist_path: dist_path.to_path_buf(),
            config,
            runner,
            notifier,
        }
    }

    /// Publish the package in the distribution directory.
    ///
    /// `release` is the version string of the release being cut (the
    /// pushed tag); when absent the manifest version decides the channel.
    /// Manifest errors propagate untouched; a failed publish command is
    /// reported, notified (unless dry-run), and returned as an
    /// unsuccessful outcome for the caller to turn into a non-zero exit.
    pub async fn publish(&self, release: Option<&str>) -> Result<PublishOutcome, PipelineError> {
        let descriptor = PackageDescriptor::read(&self.dist_path).await?;

        if let Some(warning) = descriptor.semver_warning() {
            println!("Warning: {}", warning);
        }

        let release = release.unwrap_or(&descriptor.version);
        let tag = DistTag::for_version(release);

        println!(
            "Preparing to publish {}@{} to NPM from {}...",
            descriptor.name,
            descriptor.version,
            self.dist_path.display()
        );

        // Guard lives until the end of the step; removal runs after the
        // publish command and the outcome reporting, on success and on
        // failure alike.
        let _credentials =
            CredentialFile::write(&self.dist_path, self.config.npm_token.as_ref()).await?;

        let mut args = vec!["publish", "--access", "public", "--tag", tag.as_str()];
        if self.config.npm_dry_run {
            args.push("--dry-run");
        }

        let spec = CommandSpec::new("npm", &args).current_dir(&self.dist_path);

        match self.runner.run_streamed(&spec).await {
            Ok(()) => {
                let message = format!(
                    "Successfully published `{}@{}` to NPM.",
                    descriptor.name, descriptor.version
                );
                println!("{}", message);

                if !self.config.npm_dry_run {
                    let changelog_url = format!(
                        "https://github.com/{}/blob/{}/CHANGELOG.md",
                        self.config.repository.as_deref().unwrap_or_default(),
                        descriptor.version
                    );
                    self.notifier
                        .notify(&format!("{}\n{}", message, changelog_url))
                        .await?;
                }

                Ok(PublishOutcome {
                    success: true,
                    message,
                })
            }
            Err(err) => {
                let raw = mask_optional(self.config.npm_token.as_ref(), &err.to_string());
                eprintln!("{}", raw);

                let message = format!(
                    "`{}@{}` failed to publish to NPM.",
                    descriptor.name, descriptor.version
                );
                eprintln!("{}", message);

                if !self.config.npm_dry_run {
                    self.notifier.notify(&message).await?;
                }

                Ok(PublishOutcome {
                    success: false,
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::credentials::CREDENTIAL_FILENAME;
    use crate::security::token::RegistryToken;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Runner fake that records invocations and whether the credential
    /// file existed at the moment npm ran.
    struct RecordingRunner {
        dist_path: PathBuf,
        calls: Mutex<Vec<CommandSpec>>,
        credential_present: Mutex<Vec<bool>>,
        fail_with: Option<String>,
    }

    impl RecordingRunner {
        fn new(dist_path: &Path) -> Self {
            Self {
                dist_path: dist_path.to_path_buf(),
                calls: Mutex::new(Vec::new()),
                credential_present: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(dist_path: &Path, stderr: &str) -> Self {
            Self {
                fail_with: Some(stderr.to_string()),
                ..Self::new(dist_path)
            }
        }

        fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run_captured(&self, spec: &CommandSpec) -> Result<String, PipelineError> {
            self.calls.lock().unwrap().push(spec.clone());
            Ok(String::new())
        }

        async fn run_streamed(&self, spec: &CommandSpec) -> Result<(), PipelineError> {
            self.calls.lock().unwrap().push(spec.clone());
            self.credential_present
                .lock()
                .unwrap()
                .push(self.dist_path.join(CREDENTIAL_FILENAME).exists());

            match &self.fail_with {
                Some(stderr) => Err(PipelineError::CommandFailed {
                    program: spec.program.clone(),
                    code: Some(1),
                    stderr: stderr.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
            }
        }

        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) -> Result<(), PipelineError> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn write_manifest(dist: &TempDir) {
        let mut file = std::fs::File::create(dist.path().join("package.json")).unwrap();
        write!(file, r#"{{"name": "foo-package", "version": "1.2.3"}}"#).unwrap();
    }

    fn config_with_token() -> PipelineConfig {
        PipelineConfig {
            repository: Some("org/repo".to_string()),
            npm_token: Some(RegistryToken::new("MOCK_TOKEN")),
            ..Default::default()
        }
    }

    #[test]
    fn test_dist_tag_resolution() {
        assert_eq!(DistTag::for_version("1.2.3"), DistTag::Latest);
        assert_eq!(DistTag::for_version("1.0.0"), DistTag::Latest);
        assert_eq!(DistTag::for_version("1.0.0-rc.0"), DistTag::Next);
        assert_eq!(DistTag::for_version("2.0.0-alpha.1"), DistTag::Next);
        assert_eq!(DistTag::for_version("latest-tagless"), DistTag::Next);
    }

    #[tokio::test]
    async fn test_successful_publish() {
        let dist = TempDir::new().unwrap();
        write_manifest(&dist);

        let config = config_with_token();
        let runner = RecordingRunner::new(dist.path());
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        let outcome = publisher.publish(Some("1.0.0")).await.unwrap();

        assert!(outcome.success);
        assert_eq!(
            outcome.message,
            "Successfully published `foo-package@1.2.3` to NPM."
        );

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "npm");
        assert_eq!(
            calls[0].args,
            vec!["publish", "--access", "public", "--tag", "latest"]
        );
        assert_eq!(calls[0].current_dir.as_deref(), Some(dist.path()));

        assert_eq!(
            notifier.messages(),
            vec![
                "Successfully published `foo-package@1.2.3` to NPM.\nhttps://github.com/org/repo/blob/1.2.3/CHANGELOG.md"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_prerelease_publishes_to_next() {
        let dist = TempDir::new().unwrap();
        write_manifest(&dist);

        let config = config_with_token();
        let runner = RecordingRunner::new(dist.path());
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        publisher.publish(Some("1.0.0-rc.0")).await.unwrap();

        assert_eq!(
            runner.calls()[0].args,
            vec!["publish", "--access", "public", "--tag", "next"]
        );
    }

    #[tokio::test]
    async fn test_credential_file_lifecycle_on_success() {
        let dist = TempDir::new().unwrap();
        write_manifest(&dist);

        let config = config_with_token();
        let runner = RecordingRunner::new(dist.path());
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        publisher.publish(Some("1.0.0")).await.unwrap();

        // Present while npm ran, absent after the step.
        assert_eq!(*runner.credential_present.lock().unwrap(), vec![true]);
        assert!(!dist.path().join(CREDENTIAL_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_credential_file_lifecycle_on_failure() {
        let dist = TempDir::new().unwrap();
        write_manifest(&dist);

        let config = config_with_token();
        let runner = RecordingRunner::failing(dist.path(), "E403 forbidden");
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        let outcome = publisher.publish(Some("1.0.0")).await.unwrap();

        assert!(!outcome.success);
        assert_eq!(*runner.credential_present.lock().unwrap(), vec![true]);
        assert!(!dist.path().join(CREDENTIAL_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_failure_notifies_user_facing_message_only() {
        let dist = TempDir::new().unwrap();
        write_manifest(&dist);

        let config = config_with_token();
        let runner = RecordingRunner::failing(dist.path(), "Something bad happened.");
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        let outcome = publisher.publish(Some("1.0.0")).await.unwrap();

        assert_eq!(
            outcome.message,
            "`foo-package@1.2.3` failed to publish to NPM."
        );
        assert_eq!(
            notifier.messages(),
            vec!["`foo-package@1.2.3` failed to publish to NPM.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_dry_run_adds_flag_and_suppresses_notification() {
        let dist = TempDir::new().unwrap();
        write_manifest(&dist);

        let mut config = config_with_token();
        config.npm_dry_run = true;

        let runner = RecordingRunner::new(dist.path());
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        let outcome = publisher.publish(Some("1.0.0")).await.unwrap();

        assert!(outcome.success);
        assert_eq!(
            runner.calls()[0].args,
            vec!["publish", "--access", "public", "--tag", "latest", "--dry-run"]
        );
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_failure_does_not_notify() {
        let dist = TempDir::new().unwrap();
        write_manifest(&dist);

        let mut config = config_with_token();
        config.npm_dry_run = true;

        let runner = RecordingRunner::failing(dist.path(), "Something bad happened.");
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        let outcome = publisher.publish(Some("1.0.0")).await.unwrap();

        assert!(!outcome.success);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_missing_manifest_propagates() {
        let dist = TempDir::new().unwrap();

        let config = config_with_token();
        let runner = RecordingRunner::new(dist.path());
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        let result = publisher.publish(Some("1.0.0")).await;

        assert!(matches!(
            result,
            Err(PipelineError::ManifestRead { .. })
        ));
        // Nothing ran and nothing was notified.
        assert!(runner.calls().is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_missing_repository_degrades_changelog_url() {
        let dist = TempDir::new().unwrap();
        write_manifest(&dist);

        let config = PipelineConfig {
            npm_token: Some(RegistryToken::new("MOCK_TOKEN")),
            ..Default::default()
        };
        let runner = RecordingRunner::new(dist.path());
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        publisher.publish(Some("1.0.0")).await.unwrap();

        // Malformed but non-fatal.
        assert!(notifier.messages()[0].ends_with("https://github.com//blob/1.2.3/CHANGELOG.md"));
    }

    #[tokio::test]
    async fn test_manifest_version_decides_channel_without_release() {
        let dist = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dist.path().join("package.json")).unwrap();
        write!(
            file,
            r#"{{"name": "foo-package", "version": "2.0.0-beta.3"}}"#
        )
        .unwrap();

        let config = config_with_token();
        let runner = RecordingRunner::new(dist.path());
        let notifier = RecordingNotifier::new();

        let publisher = NpmPublisher::new(dist.path(), &config, &runner, &notifier);
        publisher.publish(None).await.unwrap();

        assert!(runner.calls()[0].args.contains(&"next".to_string()));
    }
}
