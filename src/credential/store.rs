//! Secret store implementations.
//!
//! Two stores exist: a TOML secrets file holding `GOOGLE_API_KEY = "..."`
//! and the process environment.

use super::{CredentialSource, SecretStore};
use crate::error::CredentialError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Secrets file path relative to the working directory.
pub const LOCAL_SECRETS_PATH: &str = ".drawing-review/secrets.toml";

/// Application directory under the user config dir.
pub const CONFIG_DIR_NAME: &str = "drawing-review";

/// Secrets file name inside the config dir.
pub const SECRETS_FILE_NAME: &str = "secrets.toml";

/// A TOML file of top-level string secrets.
#[derive(Debug, Clone)]
pub struct SecretsFileStore {
    path: PathBuf,
}

impl SecretsFileStore {
    /// Creates a store backed by `path`. The file need not exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn error(&self, reason: impl Into<String>) -> CredentialError {
        CredentialError::SecretsFile {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl SecretStore for SecretsFileStore {
    fn source(&self) -> CredentialSource {
        CredentialSource::SecretsFile {
            path: self.path.clone(),
        }
    }

    fn lookup(&self, name: &str) -> Result<Option<String>, CredentialError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "secrets file not present");
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| self.error(e.to_string()))?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| self.error(e.to_string()))?;

        match table.get(name) {
            None => Ok(None),
            Some(toml::Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(self.error(format!("{name} must be a string"))),
        }
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl SecretStore for EnvSecretStore {
    fn source(&self) -> CredentialSource {
        CredentialSource::Environment
    }

    fn lookup(&self, name: &str) -> Result<Option<String>, CredentialError> {
        Ok(std::env::var(name).ok())
    }
}

/// Builds the store chain.
///
/// An explicit `secrets_file` replaces the default file locations
/// (`.drawing-review/secrets.toml`, then `<config dir>/drawing-review/secrets.toml`).
/// The environment is always consulted last.
#[must_use]
pub fn default_stores(secrets_file: Option<&Path>) -> Vec<Box<dyn SecretStore>> {
    let mut stores: Vec<Box<dyn SecretStore>> = Vec::new();

    if let Some(path) = secrets_file {
        stores.push(Box::new(SecretsFileStore::new(path)));
    } else {
        stores.push(Box::new(SecretsFileStore::new(LOCAL_SECRETS_PATH)));
        if let Some(dir) = dirs::config_dir() {
            stores.push(Box::new(SecretsFileStore::new(
                dir.join(CONFIG_DIR_NAME).join(SECRETS_FILE_NAME),
            )));
        }
    }

    stores.push(Box::new(EnvSecretStore));
    stores
}
