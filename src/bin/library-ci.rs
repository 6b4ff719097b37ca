//! library-ci CLI
//!
//! CI pipeline for front-end component libraries

use anyhow::Result;
use clap::{Parser, Subcommand};
use library_ci::{
    BuildContext, CliOverrides, NpmPublisher, PipelineConfig, PipelineDriver, ProcessRunner,
    SlackNotifier,
};
use std::path::PathBuf;
use std::process;

/// CI pipeline for front-end component libraries
#[derive(Parser)]
#[command(name = "library-ci")]
#[command(version = "0.1.0")]
#[command(about = "CI pipeline for front-end component libraries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline
    Run {
        /// Checkout root (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Working directory relative to the checkout root
        #[arg(long)]
        working_directory: Option<PathBuf>,

        /// Pass --dry-run to npm publish and suppress notifications
        #[arg(long)]
        dry_run: bool,
    },

    /// Run only the publish step against a built distribution directory
    Publish {
        /// Distribution directory containing package.json
        #[arg(value_name = "DIST_PATH")]
        dist_path: PathBuf,

        /// Release version deciding the dist tag (defaults to the
        /// manifest version)
        #[arg(long)]
        release: Option<String>,

        /// Pass --dry-run to npm publish and suppress notifications
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project_path,
            working_directory,
            dry_run,
        } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            run_command(path, working_directory, dry_run).await
        }
        Commands::Publish {
            dist_path,
            release,
            dry_run,
        } => publish_command(dist_path, release, dry_run).await,
    }
}

async fn run_command(
    project_path: PathBuf,
    working_directory: Option<PathBuf>,
    dry_run: bool,
) -> Result<i32> {
    let config = PipelineConfig::load(
        &project_path,
        CliOverrides {
            working_directory,
            dry_run,
        },
    )?;
    let context = BuildContext::from_env(config.repository.as_deref());
    let base_path = config.base_path(&project_path);

    let runner = ProcessRunner::new(&base_path)?;
    let notifier = SlackNotifier::new(config.slack_webhook.clone());

    let driver = PipelineDriver::new(&config, &context, base_path, &runner, &notifier);
    let report = driver.run().await;

    Ok(report.exit_code)
}

async fn publish_command(
    dist_path: PathBuf,
    release: Option<String>,
    dry_run: bool,
) -> Result<i32> {
    let config = PipelineConfig::load(
        &PathBuf::from("."),
        CliOverrides {
            working_directory: None,
            dry_run,
        },
    )?;

    let runner = ProcessRunner::new(&dist_path)?;
    let notifier = SlackNotifier::new(config.slack_webhook.clone());

    let publisher = NpmPublisher::new(&dist_path, &config, &runner, &notifier);
    let outcome = publisher.publish(release.as_deref()).await?;

    Ok(if outcome.success { 0 } else { 1 })
}
