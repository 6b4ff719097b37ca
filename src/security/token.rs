//! Registry token handling with memory-safe storage and masking
//!
//! The publish token is wrapped in the `secrecy` crate to prevent
//! accidental exposure in logs or memory dumps. Command output is run
//! through the masking helpers before it is printed.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

/// Registry host the credential line authorizes
pub const NPM_REGISTRY_HOST: &str = "registry.npmjs.org";

/// A secret token for registry or test-grid authentication
///
/// # Examples
///
/// ```
/// use library_ci::RegistryToken;
///
/// let token = RegistryToken::new("secret-npm-token-12345");
/// assert_eq!(token.mask(), "sec...345");
/// assert!(!token.mask_in("output: secret-npm-token-12345").contains("12345"));
/// ```
#[derive(Debug, Clone)]
pub struct RegistryToken(SecretString);

impl RegistryToken {
    /// Wrap a token value read from the environment.
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(SecretString::new(value.into().into()))
    }

    /// Expose the underlying secret for writing the credential file or
    /// threading into a child process environment.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    /// Render the registry auth line for the transient credential file.
    ///
    /// # Examples
    ///
    /// ```
    /// use library_ci::RegistryToken;
    ///
    /// let token = RegistryToken::new("abc123");
    /// assert_eq!(token.npmrc_line(), "//registry.npmjs.org/:_authToken=abc123");
    /// ```
    pub fn npmrc_line(&self) -> String {
        format!("//{}/:_authToken={}", NPM_REGISTRY_HOST, self.expose_secret())
    }

    /// Mask the token for safe logging.
    ///
    /// Shows only the first 3 and last 3 characters for identification.
    /// Tokens shorter than 10 characters are fully masked as "****".
    pub fn mask(&self) -> String {
        let token = self.expose_secret();
        if token.len() < 10 {
            return "****".to_string();
        }

        let prefix = &token[..3];
        let suffix = &token[token.len() - 3..];
        format!("{}...{}", prefix, suffix)
    }

    /// Replace any occurrence of the token in `text` with its masked form.
    ///
    /// Raw command output passes through here before being logged.
    pub fn mask_in(&self, text: &str) -> String {
        let token = self.expose_secret();
        if token.is_empty() {
            return text.to_string();
        }

        match Regex::new(&regex::escape(token)) {
            Ok(pattern) => pattern.replace_all(text, self.mask().as_str()).to_string(),
            Err(_) => text.to_string(),
        }
    }
}

/// Mask a token in `text` only when one is configured.
pub fn mask_optional(token: Option<&RegistryToken>, text: &str) -> String {
    match token {
        Some(token) => token.mask_in(text),
        None => text.to_string(),
    }
}
