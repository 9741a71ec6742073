//! # drawing-review
//!
//! Engineering drawing pre-review.
//!
//! A user uploads one drawing (PNG or JPEG); on request it is sent with a
//! fixed DFM review prompt to a multimodal model, and the returned Markdown
//! table is shown together with a small JSON summary for integration
//! previews.
//!
//! ## Features
//!
//! - **Credential resolution**: `GOOGLE_API_KEY` from a secrets file, the
//!   environment, or interactive input, never logged
//! - **Upload boundary**: extension and content checks before any review
//! - **Review workflow**: one inference call per explicit trigger, no caching
//! - **Surfaces**: a CLI and a single-page web tool (feature `web`)

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod credential;
pub mod drawing;
pub mod error;
pub mod inference;
pub mod review;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export configuration
pub use config::{ReviewConfig, ServeConfig};

// Re-export credential types
pub use credential::{
    Credential, CredentialSource, ResolvedCredential, SECRET_NAME, resolve_credential,
};

// Re-export upload types
pub use drawing::{DrawingFormat, DrawingImage, MAX_UPLOAD_BYTES, SUPPORTED_EXTENSIONS};

// Re-export inference types
pub use inference::{DEFAULT_MODEL, GeminiClient, InferenceClient};

// Re-export review types
pub use review::{
    REVIEW_PROMPT, ReviewOutcome, ReviewReport, ReviewSession, ReviewState, ReviewSummary,
    ReviewWorkflow, trigger_review,
};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

// Re-export web types (feature-gated)
#[cfg(feature = "web")]
pub use web::{AppState, WebServer};
