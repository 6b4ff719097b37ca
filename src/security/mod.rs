pub mod token;

pub use token::{NPM_REGISTRY_HOST, RegistryToken, mask_optional};
