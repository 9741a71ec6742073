//! Error types for drawing review operations.
//!
//! This module provides the error hierarchy using `thiserror` for every
//! boundary of the tool: credential resolution, the upload boundary, the
//! inference call, the review session, file I/O, and CLI commands.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for drawing review operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for drawing review operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Credential resolution failed; the workflow is halted.
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Upload rejected before reaching the review workflow.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// The inference call failed.
    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),

    /// The review session refused a transition.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Errors raised while resolving the API key.
///
/// Every variant is terminal: the tool stops and shows the message.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Neither a secret store nor the interactive prompt produced a key.
    #[error(
        "no API key available: enter one interactively or configure {name} in the secret store"
    )]
    Missing {
        /// Fixed secret name that was looked up.
        name: String,
    },

    /// The key contains characters an API key never has.
    #[error("malformed API key from {source_name}: {reason}")]
    Malformed {
        /// Where the key came from (never the key itself).
        source_name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A secrets file exists but could not be read or parsed.
    #[error("unreadable secrets file {path}: {reason}")]
    SecretsFile {
        /// Path to the secrets file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Reading the interactive answer failed.
    #[error("failed to read API key: {0}")]
    Prompt(String),

    /// A credential was already configured for this process.
    #[error("API key already configured")]
    AlreadyConfigured,
}

/// Upload-boundary errors. The review workflow is never entered.
#[derive(Error, Debug)]
pub enum InputError {
    /// Extension outside png/jpg/jpeg.
    #[error("unsupported file type: {name} (supported: png, jpg, jpeg)")]
    UnsupportedType {
        /// Offending file name.
        name: String,
    },

    /// Bytes did not decode as an image.
    #[error("could not decode image {name}: {reason}")]
    Undecodable {
        /// File name.
        name: String,
        /// Decoder message.
        reason: String,
    },

    /// Upload exceeds the size limit.
    #[error("image {name} is {size} bytes (max: {max} bytes)")]
    TooLarge {
        /// File name.
        name: String,
        /// Actual size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Request body was cut off by the upload limit before the file was read.
    #[error("upload exceeds {max} bytes")]
    UploadTooLarge {
        /// Maximum accepted request body.
        max: usize,
    },

    /// Multipart request carried no file.
    #[error("no file in upload")]
    MissingFile,
}

/// Failures of the remote inference call.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The request did not finish within the configured bound.
    #[error("request timed out after {}", format_limit(*limit))]
    Timeout {
        /// Configured timeout.
        limit: Duration,
    },

    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// Rate limit or quota exhausted (HTTP 429).
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// The service rejected the request (bad key, malformed image).
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the service.
        message: String,
    },

    /// Server-side failure.
    #[error("remote error ({status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Message from the service.
        message: String,
    },

    /// Reply body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Reply carried no text (e.g. blocked by a safety filter).
    #[error("empty response{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    EmptyResponse {
        /// Block or finish reason reported by the service.
        reason: Option<String>,
    },
}

/// Review session transition errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// A review was triggered before any image was uploaded.
    #[error("no drawing uploaded")]
    NoImage,

    /// A review is already in flight.
    #[error("a review is already in progress")]
    Busy,
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to bind or serve the web surface.
    #[error("server error: {0}")]
    Server(String),

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Whole seconds print as `120s`, anything finer as `1500ms`.
fn format_limit(limit: Duration) -> String {
    if limit.subsec_nanos() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    }
}

impl Error {
    /// Message shown to the user when a review fails.
    ///
    /// Inference failures collapse into one generic line carrying the detail;
    /// everything else shows its own message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Inference(e) => Self::user_message_for_inference(e),
            Self::Credential(CredentialError::Missing { .. }) => {
                format!("Warning: {self}")
            }
            Self::Credential(_) => format!("Configuration failed: {self}"),
            other => other.to_string(),
        }
    }

    /// The single failure line shown for any inference error.
    #[must_use]
    pub fn user_message_for_inference(err: &InferenceError) -> String {
        format!("Review failed, please retry. Error: {err}")
    }
}

// Implement From traits for standard library and third-party errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<serde_json::Error> for InferenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config {
            message: "bad config".to_string(),
        };
        assert_eq!(err.to_string(), "configuration error: bad config");
    }

    #[test]
    fn test_credential_error_display() {
        let err = CredentialError::Missing {
            name: "GOOGLE_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("GOOGLE_API_KEY"));

        let err = CredentialError::Malformed {
            source_name: "environment".to_string(),
            reason: "contains whitespace".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed API key from environment: contains whitespace"
        );
    }

    #[test]
    fn test_input_error_display() {
        let err = InputError::UnsupportedType {
            name: "part.gif".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported file type: part.gif (supported: png, jpg, jpeg)"
        );

        let err = InputError::TooLarge {
            name: "big.png".to_string(),
            size: 30,
            max: 20,
        };
        assert!(err.to_string().contains("max: 20"));
    }

    #[test]
    fn test_inference_error_display() {
        let err = InferenceError::Timeout {
            limit: Duration::from_secs(120),
        };
        assert_eq!(err.to_string(), "request timed out after 120s");

        let err = InferenceError::Timeout {
            limit: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "request timed out after 1500ms");

        let err = InferenceError::Timeout {
            limit: Duration::from_millis(200),
        };
        assert_eq!(err.to_string(), "request timed out after 200ms");

        let err = InferenceError::EmptyResponse { reason: None };
        assert_eq!(err.to_string(), "empty response");

        let err = InferenceError::EmptyResponse {
            reason: Some("SAFETY".to_string()),
        };
        assert_eq!(err.to_string(), "empty response: SAFETY");

        let err = InferenceError::Rejected {
            status: 400,
            message: "bad image".to_string(),
        };
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_session_error_display() {
        assert_eq!(SessionError::NoImage.to_string(), "no drawing uploaded");
        assert!(SessionError::Busy.to_string().contains("in progress"));
    }

    #[test]
    fn test_user_message_for_inference_is_generic() {
        let err: Error = InferenceError::Timeout {
            limit: Duration::from_secs(5),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "Review failed, please retry. Error: request timed out after 5s"
        );
    }

    #[test]
    fn test_user_message_for_missing_credential_is_warning() {
        let err: Error = CredentialError::Missing {
            name: "GOOGLE_API_KEY".to_string(),
        }
        .into();
        assert!(err.user_message().starts_with("Warning:"));
    }

    #[test]
    fn test_user_message_for_malformed_credential_is_fatal() {
        let err: Error = CredentialError::Malformed {
            source_name: "prompt".to_string(),
            reason: "contains whitespace".to_string(),
        }
        .into();
        assert!(err.user_message().starts_with("Configuration failed:"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_session() {
        let err: Error = SessionError::Busy.into();
        assert!(matches!(err, Error::Session(SessionError::Busy)));
    }

    #[test]
    fn test_from_serde_json_error_to_inference_error() {
        let json_err: serde_json::Error = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: InferenceError = json_err.into();
        assert!(matches!(err, InferenceError::MalformedResponse(_)));
    }
}
