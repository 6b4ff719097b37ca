//! Framework CLI invocation builder
//!
//! Build, test, and e2e stages all go through the UI framework's CLI,
//! launched via `npx` so the CI machine needs no global install.

use crate::core::traits::CommandSpec;

/// CI platform configuration forwarded to the framework CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CiPlatform {
    /// Untrusted caller: the CLI falls back to the local headless browser
    #[default]
    None,

    /// Trusted hosted runner with grid credentials available
    GitHubActions,
}

impl CiPlatform {
    fn flag_args(&self) -> Vec<String> {
        match self {
            CiPlatform::None => Vec::new(),
            CiPlatform::GitHubActions => vec![
                "--skyux-ci-platform".to_string(),
                "gh-actions".to_string(),
            ],
        }
    }
}

/// Build the invocation for a framework CLI command.
///
/// Shape: `npx -p @angular/cli ng <command> <args...> [platform flags]`.
pub fn framework_command(command: &str, args: &[String], platform: CiPlatform) -> CommandSpec {
    let mut full_args: Vec<String> = vec![
        "-p".to_string(),
        "@angular/cli".to_string(),
        "ng".to_string(),
        command.to_string(),
    ];
    full_args.extend(args.iter().cloned());
    full_args.extend(platform.flag_args());

    CommandSpec {
        program: "npx".to_string(),
        args: full_args,
        current_dir: None,
        envs: Vec::new(),
    }
}
