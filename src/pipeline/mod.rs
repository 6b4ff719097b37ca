//! Pipeline orchestration: the stage driver, lifecycle hooks, and
//! screenshot classification

pub mod driver;
pub mod hooks;
pub mod screenshots;

pub use driver::{PipelineDriver, PipelineReport};
pub use hooks::{Hook, HookRunner};
pub use screenshots::{ScreenshotKind, ScreenshotReport};
