//! Configuration for the CI pipeline
//!
//! Type-safe configuration with serde support, loaded by priority merge:
//! defaults, then the project `.library-ci.yaml`, then environment
//! variables, then CLI flags. Secrets (registry token, grid access key)
//! are only ever read from the environment, never from the config file.

use crate::core::error::PipelineError;
use crate::security::token::RegistryToken;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Configuration file name, looked up in the project root
pub const CONFIG_FILENAME: &str = ".library-ci.yaml";

/// Resolved pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Directory the pipeline operates in, relative to the checkout root
    pub working_directory: PathBuf,

    /// Repository identifier (`owner/name`), used for the changelog link
    pub repository: Option<String>,

    /// Registry auth token for publishing
    pub npm_token: Option<RegistryToken>,

    /// When set, `npm publish` runs with `--dry-run` and notifications
    /// are suppressed
    pub npm_dry_run: bool,

    /// Webhook endpoint for chat notifications
    pub slack_webhook: Option<String>,

    /// Browser test-grid credentials and project label
    pub grid: GridConfig,

    /// Lifecycle hook script paths
    pub hooks: HooksConfig,
}

/// Browser test-grid settings
#[derive(Debug, Clone, Default)]
pub struct GridConfig {
    /// Access key; absence switches test stages to local headless runs
    pub access_key: Option<RegistryToken>,

    /// Grid account username
    pub username: Option<String>,

    /// Project label shown in the grid dashboard
    pub project: Option<String>,
}

impl GridConfig {
    /// Whether trusted grid credentials are available.
    ///
    /// This only selects arguments for the test stages; it never changes
    /// pipeline control flow.
    pub fn is_trusted(&self) -> bool {
        self.access_key.is_some()
    }
}

/// Named lifecycle hook script paths, relative to the working directory
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HooksConfig {
    /// Runs before build, coverage, and visual stages
    #[serde(default)]
    pub before_script: Option<PathBuf>,

    /// Runs after a successful library build
    #[serde(default)]
    pub after_build_public_library_success: Option<PathBuf>,
}

/// On-disk configuration file schema (no secrets)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PipelineConfigFile {
    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default)]
    pub npm_dry_run: Option<bool>,

    #[serde(default)]
    pub slack_webhook: Option<String>,

    #[serde(default)]
    pub grid_username: Option<String>,

    #[serde(default)]
    pub grid_project: Option<String>,

    #[serde(default)]
    pub hooks: Option<HooksConfig>,
}

/// CLI flag overrides (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub working_directory: Option<PathBuf>,
    pub dry_run: bool,
}

impl PipelineConfig {
    /// Load configuration from all sources with priority.
    ///
    /// Priority (high to low):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Project config (`.library-ci.yaml`)
    /// 4. Default values
    pub fn load(project_path: &Path, cli: CliOverrides) -> Result<Self, PipelineError> {
        let file = Self::load_config_file(&project_path.join(CONFIG_FILENAME))?;
        let env: HashMap<String, String> = env::vars().collect();
        Ok(Self::from_sources(file, &env, cli))
    }

    /// Merge the three explicit sources over the defaults.
    pub fn from_sources(
        file: Option<PipelineConfigFile>,
        env: &HashMap<String, String>,
        cli: CliOverrides,
    ) -> Self {
        let file = file.unwrap_or_default();

        let mut config = Self {
            working_directory: file.working_directory.unwrap_or_else(|| PathBuf::from(".")),
            repository: file.repository,
            npm_token: None,
            npm_dry_run: file.npm_dry_run.unwrap_or(false),
            slack_webhook: file.slack_webhook,
            grid: GridConfig {
                access_key: None,
                username: file.grid_username,
                project: file.grid_project,
            },
            hooks: file.hooks.unwrap_or_default(),
        };

        // Environment overrides
        if let Some(repository) = env.get("GITHUB_REPOSITORY") {
            config.repository = Some(repository.clone());
        }
        if let Some(token) = env.get("NPM_TOKEN") {
            config.npm_token = Some(RegistryToken::new(token.clone()));
        }
        if env.get("NPM_DRY_RUN").map(String::as_str) == Some("true") {
            config.npm_dry_run = true;
        }
        if let Some(webhook) = env.get("SLACK_WEBHOOK") {
            config.slack_webhook = Some(webhook.clone());
        }
        if let Some(key) = env.get("BROWSER_STACK_ACCESS_KEY") {
            config.grid.access_key = Some(RegistryToken::new(key.clone()));
        }
        if let Some(username) = env.get("BROWSER_STACK_USERNAME") {
            config.grid.username = Some(username.clone());
        }
        if let Some(project) = env.get("BROWSER_STACK_PROJECT") {
            config.grid.project = Some(project.clone());
        }

        // The grid project label falls back to the repository identifier
        if config.grid.project.is_none() {
            config.grid.project = config.repository.clone();
        }

        // CLI flags (highest priority)
        if let Some(dir) = cli.working_directory {
            config.working_directory = dir;
        }
        if cli.dry_run {
            config.npm_dry_run = true;
        }

        config
    }

    /// Load and parse the YAML configuration file, if present.
    fn load_config_file(path: &Path) -> Result<Option<PipelineConfigFile>, PipelineError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read config file: {}", e)))?;

        let file: PipelineConfigFile = serde_yaml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse YAML config: {}", e)))?;

        Ok(Some(file))
    }

    /// Absolute-ish path of the directory the pipeline runs in.
    pub fn base_path(&self, checkout_root: &Path) -> PathBuf {
        checkout_root.join(&self.working_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_sources(None, &HashMap::new(), CliOverrides::default());

        assert_eq!(config.working_directory, PathBuf::from("."));
        assert!(config.repository.is_none());
        assert!(config.npm_token.is_none());
        assert!(!config.npm_dry_run);
        assert!(config.slack_webhook.is_none());
        assert!(!config.grid.is_trusted());
    }

    #[test]
    fn test_env_overrides() {
        let env = env_of(&[
            ("GITHUB_REPOSITORY", "org/repo"),
            ("NPM_TOKEN", "secret-token-value"),
            ("NPM_DRY_RUN", "true"),
            ("SLACK_WEBHOOK", "https://hooks.example.com/T123"),
            ("BROWSER_STACK_ACCESS_KEY", "grid-key"),
            ("BROWSER_STACK_USERNAME", "grid-user"),
        ]);

        let config = PipelineConfig::from_sources(None, &env, CliOverrides::default());

        assert_eq!(config.repository.as_deref(), Some("org/repo"));
        assert_eq!(
            config.npm_token.as_ref().unwrap().expose_secret(),
            "secret-token-value"
        );
        assert!(config.npm_dry_run);
        assert_eq!(
            config.slack_webhook.as_deref(),
            Some("https://hooks.example.com/T123")
        );
        assert!(config.grid.is_trusted());
        assert_eq!(config.grid.username.as_deref(), Some("grid-user"));
    }

    #[test]
    fn test_grid_project_falls_back_to_repository() {
        let env = env_of(&[("GITHUB_REPOSITORY", "org/repo")]);
        let config = PipelineConfig::from_sources(None, &env, CliOverrides::default());
        assert_eq!(config.grid.project.as_deref(), Some("org/repo"));

        let env = env_of(&[
            ("GITHUB_REPOSITORY", "org/repo"),
            ("BROWSER_STACK_PROJECT", "custom-project"),
        ]);
        let config = PipelineConfig::from_sources(None, &env, CliOverrides::default());
        assert_eq!(config.grid.project.as_deref(), Some("custom-project"));
    }

    #[test]
    fn test_cli_overrides_take_priority() {
        let file = PipelineConfigFile {
            working_directory: Some(PathBuf::from("frontend")),
            npm_dry_run: Some(false),
            ..Default::default()
        };

        let cli = CliOverrides {
            working_directory: Some(PathBuf::from("other")),
            dry_run: true,
        };

        let config = PipelineConfig::from_sources(Some(file), &HashMap::new(), cli);
        assert_eq!(config.working_directory, PathBuf::from("other"));
        assert!(config.npm_dry_run);
    }

    #[test]
    fn test_file_values_apply() {
        let file = PipelineConfigFile {
            repository: Some("org/from-file".to_string()),
            slack_webhook: Some("https://hooks.example.com/file".to_string()),
            hooks: Some(HooksConfig {
                before_script: Some(PathBuf::from("scripts/before.js")),
                after_build_public_library_success: None,
            }),
            ..Default::default()
        };

        let config =
            PipelineConfig::from_sources(Some(file), &HashMap::new(), CliOverrides::default());

        assert_eq!(config.repository.as_deref(), Some("org/from-file"));
        assert_eq!(
            config.hooks.before_script,
            Some(PathBuf::from("scripts/before.js"))
        );
    }

    #[test]
    fn test_load_parses_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILENAME);
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            "working-directory: frontend\nrepository: org/repo\nhooks:\n  before-script: scripts/before.js"
        )
        .unwrap();

        let parsed = PipelineConfig::load_config_file(&config_path).unwrap().unwrap();
        assert_eq!(parsed.working_directory, Some(PathBuf::from("frontend")));
        assert_eq!(parsed.repository.as_deref(), Some("org/repo"));
        assert_eq!(
            parsed.hooks.unwrap().before_script,
            Some(PathBuf::from("scripts/before.js"))
        );
    }

    #[test]
    fn test_load_rejects_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILENAME);
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "working-directory: [unterminated").unwrap();

        let result = PipelineConfig::load_config_file(&config_path);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let result =
            PipelineConfig::load_config_file(&temp_dir.path().join(CONFIG_FILENAME)).unwrap();
        assert!(result.is_none());
    }
}
