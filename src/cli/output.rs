//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::credential::CredentialSource;
use crate::error::Error;
use crate::review::{ImageInfo, REVIEW_PROMPT, ReviewOutcome};
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats a finished review.
///
/// Text output shows the summary only when `show_summary` is set; JSON
/// output always carries it.
#[must_use]
pub fn format_review(
    image: &ImageInfo,
    outcome: &ReviewOutcome,
    show_summary: bool,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => format_review_text(image, outcome, show_summary),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ReviewOutput<'a> {
                image: &'a ImageInfo,
                #[serde(flatten)]
                outcome: &'a ReviewOutcome,
            }
            format_json(&ReviewOutput { image, outcome })
        }
    }
}

fn format_review_text(image: &ImageInfo, outcome: &ReviewOutcome, show_summary: bool) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Drawing: {} ({:?}, {}x{}, {} bytes)",
        image.name, image.format, image.width, image.height, image.size
    );
    output.push_str("Analysis complete.\n\n");

    output.push_str("Review Report\n");
    output.push_str("=============\n\n");
    output.push_str(outcome.report.as_str());
    if !outcome.report.as_str().ends_with('\n') {
        output.push('\n');
    }

    if show_summary {
        output.push('\n');
        output.push_str("Structured data (for CRM integration)\n");
        output.push_str("-------------------------------------\n");
        output.push_str(&format_json(&outcome.summary));
        output.push('\n');
    }

    output
}

/// Formats the key source report.
#[must_use]
pub fn format_key_source(source: &CredentialSource, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("API key found: {source}\n"),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct KeyOutput<'a> {
                configured: bool,
                source: &'a CredentialSource,
            }
            format_json(&KeyOutput {
                configured: true,
                source,
            })
        }
    }
}

/// Formats the fixed review prompt.
#[must_use]
pub fn format_prompt(format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{REVIEW_PROMPT}\n"),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct PromptOutput {
                prompt: &'static str,
            }
            format_json(&PromptOutput {
                prompt: REVIEW_PROMPT,
            })
        }
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.user_message(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
                kind: &'static str,
            }
            format_json(&ErrorOutput {
                error: error.user_message(),
                kind: error_kind(error),
            })
        }
    }
}

/// Stable machine-readable error category.
#[must_use]
pub const fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::Credential(_) | Error::Config { .. } => "configuration",
        Error::Input(_) => "input",
        Error::Inference(_) => "inference",
        Error::Session(_) => "session",
        Error::Io(_) => "io",
        Error::Command(_) => "command",
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
