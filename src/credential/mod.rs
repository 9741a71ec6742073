//! API key resolution.
//!
//! The key is looked up once per process under a fixed name, first in the
//! configured secret stores and then through an interactive prompt. A missing
//! or malformed key halts the tool; there is nothing to retry.

pub mod prompt;
pub mod store;
pub mod traits;

pub use prompt::{SuppliedPrompt, TerminalPrompt};
pub use store::{EnvSecretStore, SecretsFileStore, default_stores};
pub use traits::{CredentialPrompt, SecretStore};

use crate::error::CredentialError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Fixed name the API key is stored under.
pub const SECRET_NAME: &str = "GOOGLE_API_KEY";

/// Characters an API key may contain.
const KEY_PATTERN: &str = r"^[A-Za-z0-9_.\-]+$";

/// An API key held in memory for the process lifetime.
///
/// `Debug` is redacted and there is no `Display` or `Serialize`, so the value
/// cannot end up in logs or JSON output by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validates and wraps a key.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `Missing` for an empty value and `Malformed` when the key
    /// contains whitespace or characters outside `[A-Za-z0-9_.-]`.
    pub fn new(value: impl AsRef<str>) -> Result<Self, CredentialError> {
        Self::from_source(value.as_ref(), "input")
    }

    fn from_source(value: &str, source_name: &str) -> Result<Self, CredentialError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CredentialError::Missing {
                name: SECRET_NAME.to_string(),
            });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(CredentialError::Malformed {
                source_name: source_name.to_string(),
                reason: "contains whitespace".to_string(),
            });
        }
        if !key_regex().is_match(value) {
            return Err(CredentialError::Malformed {
                source_name: source_name.to_string(),
                reason: "contains characters outside [A-Za-z0-9_.-]".to_string(),
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the raw key for use in the request header.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[allow(clippy::expect_used)]
fn key_regex() -> &'static Regex {
    static KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    KEY_REGEX.get_or_init(|| Regex::new(KEY_PATTERN).expect("valid regex"))
}

/// Where a resolved key came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialSource {
    /// A TOML secrets file.
    SecretsFile {
        /// Path to the file.
        path: PathBuf,
    },
    /// The process environment.
    Environment,
    /// Typed in by the user.
    Interactive,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecretsFile { path } => write!(f, "secrets file {}", path.display()),
            Self::Environment => write!(f, "environment variable {SECRET_NAME}"),
            Self::Interactive => f.write_str("interactive input"),
        }
    }
}

/// A validated key together with its source.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    /// The key.
    pub credential: Credential,
    /// Where it was found.
    pub source: CredentialSource,
}

/// Resolves the API key.
///
/// Stores are consulted in order and the first non-empty value wins. When no
/// store yields a key, `prompt` is asked once. A malformed key from any source
/// is fatal and is not skipped in favor of a later source.
///
/// # Errors
///
/// Returns `CredentialError::Missing` when no source produced a key, or the
/// first store/validation error encountered.
pub fn resolve_credential(
    stores: &[Box<dyn SecretStore>],
    prompt: Option<&mut dyn CredentialPrompt>,
) -> Result<ResolvedCredential, CredentialError> {
    for store in stores {
        if let Some(value) = store.lookup(SECRET_NAME)?
            && let Some(resolved) = accept(&value, store.source())?
        {
            return Ok(resolved);
        }
    }

    if let Some(prompt) = prompt
        && let Some(value) = prompt.ask(SECRET_NAME)?
        && let Some(resolved) = accept(&value, CredentialSource::Interactive)?
    {
        return Ok(resolved);
    }

    warn!(name = SECRET_NAME, "no API key configured");
    Err(CredentialError::Missing {
        name: SECRET_NAME.to_string(),
    })
}

/// Empty values are treated as absent so the next source gets a chance.
fn accept(
    value: &str,
    source: CredentialSource,
) -> Result<Option<ResolvedCredential>, CredentialError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    let credential = Credential::from_source(value, &source.to_string())?;
    info!(%source, "API key resolved");
    Ok(Some(ResolvedCredential { credential, source }))
}
