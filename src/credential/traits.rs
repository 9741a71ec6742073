//! Credential source traits.
//!
//! Secret stores are pre-provisioned sources consulted without user
//! interaction; prompts ask the user directly.

use super::CredentialSource;
use crate::error::CredentialError;

/// A pre-provisioned secret source.
pub trait SecretStore: Send + Sync {
    /// Describes this store for logging and reporting.
    fn source(&self) -> CredentialSource;

    /// Looks up a secret by name.
    ///
    /// Returns `Ok(None)` when the store does not hold the secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read.
    fn lookup(&self, name: &str) -> Result<Option<String>, CredentialError>;
}

/// An interactive source that asks the user for the secret.
pub trait CredentialPrompt {
    /// Asks for the secret once.
    ///
    /// Returns `Ok(None)` when the user gave nothing or no interaction is
    /// possible.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the answer fails.
    fn ask(&mut self, name: &str) -> Result<Option<String>, CredentialError>;
}
