//! Pipeline driver
//!
//! Sequences the stages of a CI run: install, certificate install, the
//! test group (build, coverage, visual), library build, publish. Tag
//! pushes skip the test group; both paths end in the library build and
//! the publish step. Every stage is terminal on failure: the run halts
//! with a non-zero exit code, with no retry and no partial continuation.

use crate::core::config::PipelineConfig;
use crate::core::context::BuildContext;
use crate::core::error::PipelineError;
use crate::core::manifest::find_library_project;
use crate::core::traits::{CommandRunner, CommandSpec, Notifier};
use crate::exec::framework::{framework_command, CiPlatform};
use crate::pipeline::hooks::{Hook, HookRunner};
use crate::pipeline::screenshots::{self, ScreenshotKind};
use crate::publish::NpmPublisher;
use crate::security::token::mask_optional;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Marker that aborts a push run before any stage when found in the last
/// commit message
const CI_SKIP_MARKER: &str = "[ci skip]";

/// Directory the framework CLI writes build output into
const DIST_DIR: &str = "dist";

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Completed,
    Skipped,
    Failed,
}

/// Summary of one pipeline run, printed at the end
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub stages_run: Vec<&'static str>,
    pub exit_code: i32,
}

impl PipelineReport {
    fn print(&self) {
        println!();
        println!("Pipeline finished in {}ms", self.duration_ms);
        println!("Stages run: {}", self.stages_run.join(", "));
        println!("Exit code: {}", self.exit_code);
    }
}

/// Drives a full CI run through the command runner and notifier seams
pub struct PipelineDriver<'a> {
    config: &'a PipelineConfig,
    context: &'a BuildContext,
    base_path: PathBuf,
    runner: &'a dyn CommandRunner,
    notifier: &'a dyn Notifier,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        context: &'a BuildContext,
        base_path: PathBuf,
        runner: &'a dyn CommandRunner,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            context,
            base_path,
            runner,
            notifier,
        }
    }

    /// Run the pipeline to completion, skip, or first failure.
    pub async fn run(&self) -> PipelineReport {
        let mut stages_run = Vec::new();

        let exit_code = match self.run_stages(&mut stages_run).await {
            Disposition::Completed | Disposition::Skipped => 0,
            Disposition::Failed => 1,
        };

        let report = PipelineReport {
            started_at: self.context.started_at,
            duration_ms: (Utc::now() - self.context.started_at).num_milliseconds(),
            stages_run,
            exit_code,
        };
        report.print();
        report
    }

    async fn run_stages(&self, stages_run: &mut Vec<&'static str>) -> Disposition {
        if self.context.is_push() {
            match self.last_commit_message().await {
                Ok(message) if message.contains(CI_SKIP_MARKER) => {
                    println!(
                        "Found \"{}\" in the last commit message. Exiting pipeline.",
                        CI_SKIP_MARKER
                    );
                    return Disposition::Skipped;
                }
                Ok(_) => {}
                Err(err) => {
                    self.report_failure(&err, None);
                    return Disposition::Failed;
                }
            }
        }

        // The workspace must name a library project before anything runs.
        let project = match find_library_project(&self.base_path).await {
            Ok(project) => project,
            Err(err) => {
                self.report_failure(&err, None);
                return Disposition::Failed;
            }
        };

        stages_run.push("install");
        if let Err(err) = self.install().await {
            self.report_failure(&err, Some("Pipeline settings installation failed."));
            return Disposition::Failed;
        }

        stages_run.push("cert-install");
        if let Err(err) = self.install_certs().await {
            self.report_failure(&err, Some("SSL certificates installation failed."));
            return Disposition::Failed;
        }

        let hooks = HookRunner::new(&self.config.hooks, &self.base_path, self.runner);

        if !self.config.grid.is_trusted() {
            println!("Grid credentials not available; tests run in local headless mode.");
        }

        if !self.context.is_tag() {
            stages_run.push("build");
            if let Err(err) = self.build(&hooks).await {
                // No stage-specific line for the build; the raw error is
                // the most useful thing to show.
                self.report_failure(&err, None);
                return Disposition::Failed;
            }

            stages_run.push("coverage");
            if let Err(err) = self.coverage(&hooks, &project).await {
                self.report_failure(&err, Some("Code coverage failed."));
                return Disposition::Failed;
            }

            stages_run.push("visual");
            match self.visual(&hooks).await {
                Ok(()) => {
                    if self.context.is_push() {
                        screenshots::report(&self.screenshots_path(), ScreenshotKind::Baseline);
                    }
                }
                Err(err) => {
                    if self.context.is_pull_request() {
                        screenshots::report(&self.screenshots_path(), ScreenshotKind::Failure);
                    }
                    self.report_failure(&err, Some("End-to-end tests failed."));
                    return Disposition::Failed;
                }
            }
        }

        stages_run.push("library-build");
        if let Err(err) = self.build_library(&hooks, &project).await {
            self.report_failure(&err, Some("Library build failed."));
            return Disposition::Failed;
        }

        stages_run.push("publish");
        let dist_path = self.base_path.join(DIST_DIR).join(&project);
        let publisher = NpmPublisher::new(&dist_path, self.config, self.runner, self.notifier);

        match publisher.publish(self.context.release_tag.as_deref()).await {
            Ok(outcome) if outcome.success => Disposition::Completed,
            // The publisher already reported the user-facing failure.
            Ok(_) => Disposition::Failed,
            Err(err) => {
                self.report_failure(&err, None);
                Disposition::Failed
            }
        }
    }

    async fn last_commit_message(&self) -> Result<String, PipelineError> {
        let spec = CommandSpec::new("git", &["log", "-1", "--pretty=%B", "--oneline"])
            .current_dir(&self.base_path);
        self.runner.run_captured(&spec).await
    }

    async fn install(&self) -> Result<(), PipelineError> {
        let spec = CommandSpec::new("npm", &["ci"]).current_dir(&self.base_path);
        self.runner.run_streamed(&spec).await?;

        let spec = CommandSpec::new(
            "npm",
            &[
                "install",
                "--no-save",
                "--no-package-lock",
                "blackbaud/skyux-sdk-pipeline-settings",
            ],
        )
        .current_dir(&self.base_path);
        self.runner.run_streamed(&spec).await
    }

    async fn install_certs(&self) -> Result<(), PipelineError> {
        let spec = CommandSpec::new("npx", &["-p", "@skyux-sdk/cli", "skyux", "certs", "install"])
            .current_dir(&self.base_path);
        self.runner.run_streamed(&spec).await
    }

    async fn build(&self, hooks: &HookRunner<'_>) -> Result<(), PipelineError> {
        hooks.run(Hook::BeforeScript).await?;

        let args = vec!["--prod".to_string()];
        let spec = framework_command("build", &args, self.platform()).current_dir(&self.base_path);
        self.runner.run_streamed(&spec).await
    }

    async fn coverage(&self, hooks: &HookRunner<'_>, project: &str) -> Result<(), PipelineError> {
        hooks.run(Hook::BeforeScript).await?;

        // Unit tests always run through the local headless browser.
        let args = vec![
            project.to_string(),
            "--browsers".to_string(),
            "ChromeHeadless".to_string(),
            "--no-watch".to_string(),
        ];
        let spec = framework_command("test", &args, self.platform()).current_dir(&self.base_path);
        let spec = self.with_grid_env(spec, "coverage");
        self.runner.run_streamed(&spec).await
    }

    async fn visual(&self, hooks: &HookRunner<'_>) -> Result<(), PipelineError> {
        hooks.run(Hook::BeforeScript).await?;

        // Without grid credentials the e2e suite falls back to the local
        // headless browser.
        let args = match self.platform() {
            CiPlatform::GitHubActions => Vec::new(),
            CiPlatform::None => vec!["--skyux-headless".to_string()],
        };
        let spec = framework_command("e2e", &args, self.platform()).current_dir(&self.base_path);
        let spec = self.with_grid_env(spec, "visual");
        self.runner.run_streamed(&spec).await
    }

    async fn build_library(
        &self,
        hooks: &HookRunner<'_>,
        project: &str,
    ) -> Result<(), PipelineError> {
        let args = vec![project.to_string(), "--prod".to_string()];
        let spec = framework_command("build", &args, self.platform()).current_dir(&self.base_path);
        self.runner.run_streamed(&spec).await?;

        hooks.run(Hook::AfterBuildPublicLibrarySuccess).await
    }

    fn platform(&self) -> CiPlatform {
        if self.config.grid.is_trusted() {
            CiPlatform::GitHubActions
        } else {
            CiPlatform::None
        }
    }

    /// Thread grid credentials and the per-stage build id into the child
    /// process only; the driver's own environment stays untouched.
    fn with_grid_env(&self, mut spec: CommandSpec, stage_suffix: &str) -> CommandSpec {
        let grid = &self.config.grid;
        if let Some(key) = &grid.access_key {
            spec = spec.env("BROWSER_STACK_ACCESS_KEY", key.expose_secret());
        }
        if let Some(username) = &grid.username {
            spec = spec.env("BROWSER_STACK_USERNAME", username);
        }
        if let Some(project) = &grid.project {
            spec = spec.env("BROWSER_STACK_PROJECT", project);
        }
        spec.env(
            "BROWSER_STACK_BUILD_ID",
            format!("{}-{}", self.context.build_id, stage_suffix),
        )
    }

    fn screenshots_path(&self) -> PathBuf {
        self.base_path.join("screenshots")
    }

    fn report_failure(&self, err: &PipelineError, stage_message: Option<&str>) {
        eprintln!(
            "{}",
            mask_optional(self.config.npm_token.as_ref(), &err.to_string())
        );
        if let Some(message) = stage_message {
            eprintln!("{}", message);
        }
    }
}
