//! Lifecycle hook scripts
//!
//! Projects can attach Node scripts to named points in the pipeline via
//! the `hooks` section of the config file. A hook that is not configured
//! is silently skipped; a configured hook that fails fails its stage.

use crate::core::config::HooksConfig;
use crate::core::error::PipelineError;
use crate::core::traits::{CommandRunner, CommandSpec};
use std::path::{Path, PathBuf};

/// A named point in the pipeline where a project script may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// Before the build, coverage, and visual stages
    BeforeScript,
    /// After the library build succeeds
    AfterBuildPublicLibrarySuccess,
}

impl Hook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::BeforeScript => "before-script",
            Hook::AfterBuildPublicLibrarySuccess => "after-build-public-library-success",
        }
    }
}

/// Runs configured hook scripts through the command runner
pub struct HookRunner<'a> {
    config: &'a HooksConfig,
    working_directory: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> HookRunner<'a> {
    pub fn new(config: &'a HooksConfig, working_directory: &Path, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            working_directory: working_directory.to_path_buf(),
            runner,
        }
    }

    /// Run the script attached to `hook`, if any.
    pub async fn run(&self, hook: Hook) -> Result<(), PipelineError> {
        let script = match hook {
            Hook::BeforeScript => &self.config.before_script,
            Hook::AfterBuildPublicLibrarySuccess => {
                &self.config.after_build_public_library_success
            }
        };

        let Some(script) = script else {
            return Ok(());
        };

        println!("Running lifecycle hook: {}", hook.as_str());

        let mut spec = CommandSpec::new("node", &[]).current_dir(&self.working_directory);
        spec.args.push(script.display().to_string());

        self.runner.run_streamed(&spec).await
    }
}
