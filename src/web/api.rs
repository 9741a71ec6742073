use super::AppState;
use super::page::INDEX_HTML;
use crate::credential::CredentialSource;
use crate::drawing::{DrawingImage, MAX_UPLOAD_BYTES};
use crate::error::{CredentialError, Error, InputError, SessionError};
use crate::review::{ReviewOutcome, SessionSnapshot, trigger_review};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Multipart framing on top of the largest accepted image.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Largest request body the upload route reads.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD;

/// Field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

/// Routes for the page and its API.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(get_state))
        .route("/api/credential", post(set_credential))
        .route("/api/upload", post(upload))
        .route("/api/image", get(get_image))
        .route("/api/review", post(review))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct StateResponse {
    configured: bool,
    credential_source: Option<CredentialSource>,
    ai_engine: Option<String>,
    #[serde(flatten)]
    session: SessionSnapshot,
}

async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let session = state.session().lock().await.snapshot();
    Json(StateResponse {
        configured: state.is_configured(),
        credential_source: state.credential_source().cloned(),
        ai_engine: state.workflow().ok().map(|w| w.engine_id().to_string()),
        session,
    })
}

#[derive(Deserialize)]
struct CredentialParams {
    api_key: String,
}

async fn set_credential(
    State(state): State<Arc<AppState>>,
    Json(params): Json<CredentialParams>,
) -> Result<impl IntoResponse, Error> {
    let source = state.configure(params.api_key)?;
    Ok(Json(json!({ "configured": true, "source": source })))
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, Error> {
    // No key, no upload.
    state.workflow()?;

    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(malformed_upload)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(malformed_upload)?;
        file = Some((name, bytes.to_vec()));
        break;
    }
    let (name, bytes) = file.ok_or(InputError::MissingFile)?;

    let image = match tokio::task::spawn_blocking(move || DrawingImage::decode(name, bytes)).await? {
        Ok(image) => image,
        Err(e) => {
            warn!(error = %e, "upload rejected");
            return Err(e.into());
        }
    };
    info!(drawing = image.name(), bytes = image.len(), "upload accepted");

    let mut session = state.session().lock().await;
    session.upload(image)?;
    Ok(Json(session.snapshot()))
}

fn malformed_upload(err: axum::extract::multipart::MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(max = UPLOAD_BODY_LIMIT, "upload cut off at body limit");
        return InputError::UploadTooLarge {
            max: UPLOAD_BODY_LIMIT,
        }
        .into();
    }
    InputError::Undecodable {
        name: UPLOAD_FIELD.to_string(),
        reason: err.body_text(),
    }
    .into()
}

async fn get_image(State(state): State<Arc<AppState>>) -> Result<Response, Error> {
    let image = state
        .session()
        .lock()
        .await
        .image()
        .cloned()
        .ok_or(SessionError::NoImage)?;

    Ok((
        [(header::CONTENT_TYPE, image.mime_type())],
        image.bytes().to_vec(),
    )
        .into_response())
}

async fn review(State(state): State<Arc<AppState>>) -> Result<Json<ReviewOutcome>, Error> {
    state.workflow()?;

    // Detached so a dropped connection still settles the session.
    let outcome = tokio::spawn(async move {
        let workflow = state.workflow()?;
        trigger_review(state.session(), workflow).await
    })
    .await??;
    Ok(Json(outcome))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Input(InputError::UnsupportedType { .. }) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Input(InputError::TooLarge { .. } | InputError::UploadTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::Credential(CredentialError::AlreadyConfigured) => StatusCode::CONFLICT,
            Self::Credential(_) => StatusCode::PRECONDITION_FAILED,
            Self::Session(SessionError::Busy) => StatusCode::CONFLICT,
            Self::Session(SessionError::NoImage) => StatusCode::NOT_FOUND,
            Self::Inference(_) => StatusCode::BAD_GATEWAY,
            Self::Io(_) | Self::Command(_) | Self::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}
