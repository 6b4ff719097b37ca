pub mod framework;
pub mod process_runner;

pub use framework::{CiPlatform, framework_command};
pub use process_runner::ProcessRunner;
