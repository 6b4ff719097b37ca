pub mod config;
pub mod context;
pub mod error;
pub mod manifest;
pub mod traits;

pub use config::*;
pub use context::*;
pub use error::*;
pub use manifest::*;
pub use traits::*;
