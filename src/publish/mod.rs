//! Package publishing: credential handling and the npm publish step

pub mod credentials;
pub mod npm;

pub use credentials::{CredentialFile, CREDENTIAL_FILENAME};
pub use npm::{DistTag, NpmPublisher, PublishOutcome};
