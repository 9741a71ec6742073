//! Multimodal inference.
//!
//! The review workflow only needs one capability: send an instruction and a
//! single image, get text back. [`InferenceClient`] is that seam; the shipped
//! implementation talks to Gemini over HTTP.
//!
//! # Examples
//!
//! ```no_run
//! use drawing_review::config::ReviewConfig;
//! use drawing_review::credential::Credential;
//! use drawing_review::inference::{GeminiClient, InferenceClient};
//!
//! let credential = Credential::new("AIza-example").unwrap();
//! let client = GeminiClient::new(credential, &ReviewConfig::default()).unwrap();
//! assert_eq!(client.engine_id(), "gemini-1.5-flash");
//! ```

mod gemini;

pub use gemini::GeminiClient;

use crate::drawing::DrawingImage;
use crate::error::InferenceError;
use async_trait::async_trait;
use std::time::Duration;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Upper bound on a single inference call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A text + image generation capability.
///
/// Implementations must be thread-safe (`Send + Sync`) so one configured
/// client can be shared read-only by every review.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Identifier of the model answering requests.
    fn engine_id(&self) -> &str;

    /// Generates text for `prompt` applied to `image`.
    ///
    /// The prompt always precedes the image in the request.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, quota exhaustion,
    /// rejection by the service, or a reply without text.
    async fn generate(&self, prompt: &str, image: &DrawingImage) -> Result<String, InferenceError>;
}
