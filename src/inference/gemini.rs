//! Gemini `generateContent` client.

use super::InferenceClient;
use crate::config::ReviewConfig;
use crate::credential::Credential;
use crate::drawing::DrawingImage;
use crate::error::{Error, InferenceError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Header carrying the API key, so it never appears in a URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest error body excerpt kept in a message.
const MAX_ERROR_EXCERPT: usize = 300;

/// Client for the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    credential: Credential,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Configures a client with the resolved key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(credential: Credential, config: &ReviewConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            credential,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    fn transport_error(&self, err: &reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout {
                limit: self.timeout,
            }
        } else {
            InferenceError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    fn engine_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, image: &DrawingImage) -> Result<String, InferenceError> {
        let body = build_request(prompt, image);
        let started = Instant::now();

        debug!(model = %self.model, bytes = image.len(), "sending generateContent request");

        let response = self
            .http
            .post(self.url())
            .header(API_KEY_HEADER, self.credential.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        debug!(
            status = status.as_u16(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "generateContent replied"
        );

        if !status.is_success() {
            let err = classify_status(status, &text);
            warn!(status = status.as_u16(), "generateContent failed");
            return Err(err);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)?;
        extract_text(parsed)
    }
}

// ==================== Wire Types ====================

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Builds the (prompt, image) payload; order matters to the model.
fn build_request<'a>(prompt: &'a str, image: &DrawingImage) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: prompt },
                Part::Image {
                    inline_data: InlineData {
                        mime_type: image.mime_type(),
                        data: image.to_base64(),
                    },
                },
            ],
        }],
    }
}

/// Joins the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, InferenceError> {
    let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(InferenceError::EmptyResponse {
            reason: block_reason,
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(InferenceError::EmptyResponse {
            reason: candidate.finish_reason.or(block_reason),
        });
    }

    Ok(text)
}

fn classify_status(status: StatusCode, body: &str) -> InferenceError {
    let message = error_message(body);
    let code = status.as_u16();

    if status == StatusCode::TOO_MANY_REQUESTS {
        InferenceError::Quota(message)
    } else if status.is_client_error() {
        InferenceError::Rejected {
            status: code,
            message,
        }
    } else {
        InferenceError::Remote {
            status: code,
            message,
        }
    }
}

/// Pulls `error.message` out of a Google error body, else an excerpt of it.
fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        match (envelope.error.status, envelope.error.message) {
            (Some(status), Some(message)) => return format!("{status}: {message}"),
            (None, Some(message)) => return message,
            (Some(status), None) => return status,
            (None, None) => {}
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    match trimmed.char_indices().nth(MAX_ERROR_EXCERPT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
