//! library-ci
//!
//! CI orchestration for a front-end component library: sequences the
//! install, build, test, and publish stages of a hosted CI run,
//! delegating the real work to external CLIs and reporting outcomes to a
//! chat webhook.

pub mod core;
pub mod exec;
pub mod notify;
pub mod pipeline;
pub mod publish;
pub mod security;

pub use crate::core::config::{CliOverrides, PipelineConfig};
pub use crate::core::context::{BuildContext, CiEvent};
pub use crate::core::error::PipelineError;
pub use crate::core::manifest::PackageDescriptor;
pub use crate::core::traits::{CommandRunner, CommandSpec, Notifier};
pub use crate::exec::{CiPlatform, ProcessRunner};
pub use crate::notify::SlackNotifier;
pub use crate::pipeline::{PipelineDriver, PipelineReport};
pub use crate::publish::{DistTag, NpmPublisher, PublishOutcome};
pub use crate::security::RegistryToken;
