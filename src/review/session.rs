//! Review session state machine.
//!
//! ```text
//! Idle --upload--> ImageLoaded --trigger--> Analyzing --ok--> ReportShown
//!                                                     \--err-> ErrorShown
//! ReportShown | ErrorShown --trigger--> Analyzing
//! ReportShown | ErrorShown --upload---> ImageLoaded (previous results dropped)
//! Analyzing --ticket dropped--> ImageLoaded
//! ```
//!
//! A session holds at most one drawing and one report. While a review is in
//! flight, both uploads and further triggers are refused with
//! [`SessionError::Busy`]. A review that is abandoned before it reports back
//! (its [`ReviewTicket`] is dropped) releases the session, which returns to
//! `ImageLoaded`.

use super::{ReviewOutcome, ReviewWorkflow};
use crate::drawing::{DrawingFormat, DrawingImage};
use crate::error::{Error, InferenceError, SessionError};
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Where a session is in the upload → review cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// Nothing uploaded.
    Idle,
    /// A drawing is loaded and waiting for a trigger.
    ImageLoaded,
    /// A review call is in flight.
    Analyzing,
    /// The last review succeeded.
    ReportShown,
    /// The last review failed.
    ErrorShown,
}

/// Display metadata for the loaded drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Uploaded file name.
    pub name: String,
    /// Detected format.
    pub format: DrawingFormat,
    /// Bitmap width.
    pub width: u32,
    /// Bitmap height.
    pub height: u32,
    /// Encoded size in bytes.
    pub size: usize,
}

impl From<&DrawingImage> for ImageInfo {
    fn from(image: &DrawingImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            name: image.name().to_string(),
            format: image.format(),
            width,
            height,
            size: image.len(),
        }
    }
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Current state.
    pub state: ReviewState,
    /// Loaded drawing, if any.
    pub image: Option<ImageInfo>,
    /// Last successful review, if shown.
    pub outcome: Option<ReviewOutcome>,
    /// Last failure message, if shown.
    pub error: Option<String>,
}

/// Claim on the session's single in-flight review.
///
/// The session stays `Analyzing` only while the ticket is alive.
#[derive(Debug)]
pub struct ReviewTicket {
    image: Arc<DrawingImage>,
    token: Arc<()>,
}

impl ReviewTicket {
    /// The drawing under review.
    #[must_use]
    pub fn image(&self) -> &DrawingImage {
        &self.image
    }
}

/// One user's upload/review session.
#[derive(Debug)]
pub struct ReviewSession {
    state: ReviewState,
    image: Option<Arc<DrawingImage>>,
    outcome: Option<ReviewOutcome>,
    error: Option<String>,
    in_flight: Weak<()>,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    /// Creates an idle session.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ReviewState::Idle,
            image: None,
            outcome: None,
            error: None,
            in_flight: Weak::new(),
        }
    }

    /// Current state.
    ///
    /// An `Analyzing` session whose ticket is gone reads as `ImageLoaded`.
    #[must_use]
    pub fn state(&self) -> ReviewState {
        if self.is_abandoned() {
            ReviewState::ImageLoaded
        } else {
            self.state
        }
    }

    /// Loaded drawing.
    #[must_use]
    pub const fn image(&self) -> Option<&Arc<DrawingImage>> {
        self.image.as_ref()
    }

    /// Last successful review.
    #[must_use]
    pub const fn outcome(&self) -> Option<&ReviewOutcome> {
        self.outcome.as_ref()
    }

    /// Last failure message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn is_abandoned(&self) -> bool {
        self.state == ReviewState::Analyzing && self.in_flight.strong_count() == 0
    }

    fn release_abandoned(&mut self) {
        if self.is_abandoned() {
            warn!("review abandoned before completion; session released");
            self.state = ReviewState::ImageLoaded;
        }
    }

    /// Replaces the loaded drawing.
    ///
    /// Drops any previous drawing, report, and error.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while a review is in flight.
    pub fn upload(&mut self, image: DrawingImage) -> Result<(), SessionError> {
        self.release_abandoned();
        if self.state == ReviewState::Analyzing {
            return Err(SessionError::Busy);
        }
        debug!(drawing = image.name(), "drawing loaded");
        self.image = Some(Arc::new(image));
        self.outcome = None;
        self.error = None;
        self.state = ReviewState::ImageLoaded;
        Ok(())
    }

    /// Moves to `Analyzing` and hands out a ticket for the drawing to review.
    ///
    /// # Errors
    ///
    /// Returns `NoImage` before any upload and `Busy` while a review is
    /// already in flight.
    pub fn begin_review(&mut self) -> Result<ReviewTicket, SessionError> {
        self.release_abandoned();
        if self.state == ReviewState::Analyzing {
            return Err(SessionError::Busy);
        }
        let image = self.image.clone().ok_or(SessionError::NoImage)?;
        let token = Arc::new(());
        self.in_flight = Arc::downgrade(&token);
        self.outcome = None;
        self.error = None;
        self.state = ReviewState::Analyzing;
        Ok(ReviewTicket { image, token })
    }

    /// Records the result of the in-flight review.
    ///
    /// Ignored unless `ticket` is the session's current one.
    pub fn finish_review(
        &mut self,
        ticket: ReviewTicket,
        result: &Result<ReviewOutcome, InferenceError>,
    ) {
        let current = self
            .in_flight
            .upgrade()
            .is_some_and(|token| Arc::ptr_eq(&token, &ticket.token));
        if self.state != ReviewState::Analyzing || !current {
            warn!(state = ?self.state, "stale review result ignored");
            return;
        }
        match result {
            Ok(outcome) => {
                self.outcome = Some(outcome.clone());
                self.state = ReviewState::ReportShown;
            }
            Err(e) => {
                self.error = Some(Error::user_message_for_inference(e));
                self.state = ReviewState::ErrorShown;
            }
        }
        self.in_flight = Weak::new();
    }

    /// Serializable view for the presentation surface.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            image: self.image.as_deref().map(ImageInfo::from),
            outcome: self.outcome.clone(),
            error: self.error.clone(),
        }
    }
}

/// Runs one review for a shared session.
///
/// The lock is released during the inference call so the session can still
/// be observed; the ticket keeps a second review from starting. Dropping the
/// returned future mid-call releases the session instead of leaving it
/// `Analyzing`.
///
/// # Errors
///
/// Returns a session error if no drawing is loaded or a review is already
/// running, or the inference error if the call failed.
pub async fn trigger_review(
    session: &Mutex<ReviewSession>,
    workflow: &ReviewWorkflow,
) -> Result<ReviewOutcome, Error> {
    let ticket = session.lock().await.begin_review()?;

    let result = workflow.review(ticket.image()).await;

    session.lock().await.finish_review(ticket, &result);
    Ok(result?)
}
