//! The upload-review workflow.
//!
//! A review sends the fixed [`REVIEW_PROMPT`] and one drawing to the
//! configured [`InferenceClient`] and wraps the reply as a [`ReviewReport`]
//! plus a small [`ReviewSummary`] for integration previews. The reply is
//! display content only; it is never parsed.
//!
//! # Examples
//!
//! ```
//! use drawing_review::review::{ReviewReport, ReviewSummary};
//!
//! let report = ReviewReport::new("| 材质 | 合格 | 钢 |");
//! let summary = ReviewSummary::from_report(&report, "gemini-1.5-flash");
//! assert_eq!(summary.status, "success");
//! assert_eq!(summary.raw_output, "| 材质 | 合格 | 钢 |...");
//! ```

pub mod prompt;
pub mod session;

pub use prompt::{REVIEW_COLUMNS, REVIEW_ITEMS, REVIEW_PROMPT};
pub use session::{
    ImageInfo, ReviewSession, ReviewState, ReviewTicket, SessionSnapshot, trigger_review,
};

use crate::drawing::DrawingImage;
use crate::error::InferenceError;
use crate::inference::InferenceClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Characters of the report kept in the summary preview.
pub const SUMMARY_PREVIEW_CHARS: usize = 100;

/// Appended to every summary preview.
pub const TRUNCATION_MARKER: &str = "...";

/// Summary status for a completed review.
pub const STATUS_SUCCESS: &str = "success";

/// The model's reply, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewReport(String);

impl ReviewReport {
    /// Wraps reply text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReviewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Illustrative integration payload derived from a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Always `"success"` for a produced summary.
    pub status: String,
    /// Model that wrote the report.
    pub ai_engine: String,
    /// Start of the report followed by `"..."`.
    pub raw_output: String,
}

impl ReviewSummary {
    /// Derives the summary deterministically from `report`.
    #[must_use]
    pub fn from_report(report: &ReviewReport, engine_id: &str) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            ai_engine: engine_id.to_string(),
            raw_output: preview(report.as_str(), SUMMARY_PREVIEW_CHARS),
        }
    }
}

/// Returns at most `max_chars` characters of `text` plus the marker.
///
/// The cut never splits a grapheme cluster, so the prefix may be a few
/// characters shorter than `max_chars`. The marker is appended even when
/// nothing was cut.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut end_byte = 0;
    let mut chars = 0;

    for grapheme in text.graphemes(true) {
        let width = grapheme.chars().count();
        if chars + width > max_chars {
            break;
        }
        chars += width;
        end_byte += grapheme.len();
    }

    format!("{}{TRUNCATION_MARKER}", &text[..end_byte])
}

/// Result of one successful review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewOutcome {
    /// Text to render.
    pub report: ReviewReport,
    /// Integration preview.
    pub summary: ReviewSummary,
}

/// Runs reviews against a configured inference client.
///
/// Construction requires a client, and a client requires a resolved
/// credential, so a workflow cannot exist before the key is known.
#[derive(Clone)]
pub struct ReviewWorkflow {
    client: Arc<dyn InferenceClient>,
}

impl fmt::Debug for ReviewWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewWorkflow")
            .field("engine", &self.client.engine_id())
            .finish()
    }
}

impl ReviewWorkflow {
    /// Creates a workflow around a shared client.
    #[must_use]
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Model identifier reported in summaries.
    #[must_use]
    pub fn engine_id(&self) -> &str {
        self.client.engine_id()
    }

    /// Reviews one drawing.
    ///
    /// Issues exactly one inference call; results are never cached, so
    /// reviewing the same image twice calls the model twice.
    ///
    /// # Errors
    ///
    /// Returns the client's error unchanged. No retry is attempted and no
    /// partial outcome is produced.
    pub async fn review(&self, image: &DrawingImage) -> Result<ReviewOutcome, InferenceError> {
        let started = Instant::now();
        info!(
            drawing = image.name(),
            engine = self.engine_id(),
            "review started"
        );

        let text = match self.client.generate(REVIEW_PROMPT, image).await {
            Ok(text) => text,
            Err(e) => {
                warn!(drawing = image.name(), error = %e, "review failed");
                return Err(e);
            }
        };

        if text.trim().is_empty() {
            warn!(drawing = image.name(), "review returned no text");
            return Err(InferenceError::EmptyResponse { reason: None });
        }

        let report = ReviewReport::new(text);
        let summary = ReviewSummary::from_report(&report, self.engine_id());

        info!(
            drawing = image.name(),
            chars = report.as_str().chars().count(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "review finished"
        );

        Ok(ReviewOutcome { report, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_preview_short_text_keeps_marker() {
        assert_eq!(preview("abc", 100), "abc...");
        assert_eq!(preview("", 100), "...");
    }

    #[test]
    fn test_preview_cuts_at_limit() {
        let text = "a".repeat(150);
        let out = preview(&text, 100);
        assert_eq!(out, format!("{}...", "a".repeat(100)));
    }

    #[test]
    fn test_preview_counts_characters_not_bytes() {
        let text = "钢".repeat(120);
        let out = preview(&text, 100);
        assert_eq!(out.chars().count(), 103);
    }

    #[test]
    fn test_preview_does_not_split_grapheme() {
        // "e" + combining acute accent is one grapheme of two chars.
        let text = format!("{}e\u{301}tail", "x".repeat(99));
        let out = preview(&text, 100);
        assert_eq!(out, format!("{}...", "x".repeat(99)));
    }

    #[test]
    fn test_summary_fields() {
        let report = ReviewReport::new("| 材质 | 合格 | 钢 |");
        let summary = ReviewSummary::from_report(&report, "gemini-1.5-flash");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["ai_engine"], "gemini-1.5-flash");
        assert_eq!(json["raw_output"], "| 材质 | 合格 | 钢 |...");
    }

    #[test]
    fn test_report_serializes_as_string() {
        let report = ReviewReport::new("table");
        assert_eq!(serde_json::to_string(&report).unwrap(), "\"table\"");
    }

    proptest! {
        #[test]
        fn prop_preview_is_bounded_prefix(text in "\\PC{0,300}") {
            let out = preview(&text, SUMMARY_PREVIEW_CHARS);
            prop_assert!(out.ends_with(TRUNCATION_MARKER));
            let prefix = &out[..out.len() - TRUNCATION_MARKER.len()];
            prop_assert!(text.starts_with(prefix));
            prop_assert!(prefix.chars().count() <= SUMMARY_PREVIEW_CHARS);
            if text.chars().count() <= SUMMARY_PREVIEW_CHARS {
                prop_assert_eq!(prefix, text.as_str());
            }
        }

        #[test]
        fn prop_summary_is_deterministic(text in "\\PC{1,200}") {
            let report = ReviewReport::new(text);
            prop_assert_eq!(
                ReviewSummary::from_report(&report, "m"),
                ReviewSummary::from_report(&report, "m")
            );
        }
    }
}
