//! Integration tests for drawing-review.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use async_trait::async_trait;
use drawing_review::cli::review_file;
use drawing_review::credential::{
    CredentialPrompt, EnvSecretStore, SecretStore, SecretsFileStore, SuppliedPrompt,
};
use drawing_review::error::{CredentialError, Error, InferenceError, InputError, SessionError};
use drawing_review::{
    CredentialSource, DrawingImage, InferenceClient, REVIEW_PROMPT, ReviewSession, ReviewState,
    ReviewWorkflow, resolve_credential, trigger_review,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const TABLE: &str = "| 审核项 | 状态 | 提取内容/问题 |\n|---|---|---|\n| 材质 | 合格 | 钢 |";

/// Records every call it receives.
struct RecordingClient {
    reply: Result<String, fn() -> InferenceError>,
    calls: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl RecordingClient {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(err: fn() -> InferenceError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceClient for RecordingClient {
    fn engine_id(&self) -> &str {
        "gemini-1.5-flash"
    }

    async fn generate(&self, prompt: &str, image: &DrawingImage) -> Result<String, InferenceError> {
        self.calls.lock().unwrap().push((
            prompt.to_string(),
            image.name().to_string(),
            image.bytes().to_vec(),
        ));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}

fn encode(format: ImageFormat, size: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(size, size))
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode test image");
    buf
}

fn write_drawing(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write drawing");
    path
}

#[tokio::test]
async fn test_supported_types_call_client_once_with_prompt_and_image() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    for (name, format) in [
        ("part.png", ImageFormat::Png),
        ("part.jpg", ImageFormat::Jpeg),
        ("PART.JPEG", ImageFormat::Jpeg),
    ] {
        let bytes = encode(format, 32);
        let path = write_drawing(temp.path(), name, &bytes);
        let client = RecordingClient::replying(TABLE);
        let workflow = ReviewWorkflow::new(client.clone());

        review_file(&workflow, &path).await.expect("review");

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1, "{name}");
        assert_eq!(calls[0].0, REVIEW_PROMPT);
        assert_eq!(calls[0].1, name);
        assert_eq!(calls[0].2, bytes);
    }
}

#[tokio::test]
async fn test_unsupported_types_never_reach_client() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let client = RecordingClient::replying(TABLE);
    let workflow = ReviewWorkflow::new(client.clone());

    for name in ["part.gif", "part.pdf", "part.bmp", "part"] {
        let path = write_drawing(temp.path(), name, &encode(ImageFormat::Png, 8));
        let err = review_file(&workflow, &path).await.unwrap_err();
        assert!(
            matches!(err, Error::Input(InputError::UnsupportedType { .. })),
            "{name}: {err}"
        );
    }

    // Right extension, wrong content.
    let path = write_drawing(temp.path(), "fake.png", b"%PDF-1.7");
    let err = review_file(&workflow, &path).await.unwrap_err();
    assert!(matches!(err, Error::Input(InputError::Undecodable { .. })));

    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_review_scenario_200px_png() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = write_drawing(temp.path(), "drawing.png", &encode(ImageFormat::Png, 200));
    let workflow = ReviewWorkflow::new(RecordingClient::replying(TABLE));

    let (info, outcome) = review_file(&workflow, &path).await.expect("review");

    assert_eq!((info.width, info.height), (200, 200));
    assert_eq!(outcome.report.as_str(), TABLE);
    assert_eq!(outcome.summary.status, "success");
    assert_eq!(outcome.summary.ai_engine, "gemini-1.5-flash");
    assert_eq!(outcome.summary.raw_output, format!("{TABLE}..."));
}

#[tokio::test]
async fn test_long_report_summary_is_truncated() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = write_drawing(temp.path(), "drawing.png", &encode(ImageFormat::Png, 16));
    let long = format!("{TABLE}\n{}", "| 公差 | 缺失 | 未标注 |\n".repeat(20));
    let workflow = ReviewWorkflow::new(RecordingClient::replying(&long));

    let (_, outcome) = review_file(&workflow, &path).await.expect("review");

    let raw = &outcome.summary.raw_output;
    let prefix = raw.strip_suffix("...").expect("marker appended");
    assert_eq!(prefix.chars().count(), 100);
    assert!(long.starts_with(prefix));
}

#[tokio::test]
async fn test_timeout_yields_single_failure_message() {
    let client = RecordingClient::failing(|| InferenceError::Timeout {
        limit: Duration::from_secs(120),
    });
    let workflow = ReviewWorkflow::new(client.clone());
    let session = tokio::sync::Mutex::new(ReviewSession::new());

    let image = DrawingImage::decode("part.png", encode(ImageFormat::Png, 16)).expect("decode");
    session.lock().await.upload(image).expect("upload");

    let err = trigger_review(&session, &workflow).await.unwrap_err();
    assert_eq!(
        err.user_message(),
        "Review failed, please retry. Error: request timed out after 120s"
    );

    let session = session.lock().await;
    assert_eq!(session.state(), ReviewState::ErrorShown);
    assert!(session.outcome().is_none());
    assert_eq!(session.error_message(), Some(err.user_message().as_str()));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_empty_reply_is_a_failure() {
    let workflow = ReviewWorkflow::new(RecordingClient::replying("  \n"));
    let image = DrawingImage::decode("part.png", encode(ImageFormat::Png, 16)).expect("decode");

    let err = workflow.review(&image).await.unwrap_err();
    assert!(matches!(err, InferenceError::EmptyResponse { .. }));
}

#[tokio::test]
async fn test_two_triggers_issue_two_calls() {
    let client = RecordingClient::replying(TABLE);
    let workflow = ReviewWorkflow::new(client.clone());
    let session = tokio::sync::Mutex::new(ReviewSession::new());

    let image = DrawingImage::decode("part.png", encode(ImageFormat::Png, 16)).expect("decode");
    session.lock().await.upload(image).expect("upload");

    let first = trigger_review(&session, &workflow).await.expect("first");
    let second = trigger_review(&session, &workflow).await.expect("second");

    assert_eq!(first, second);
    assert_eq!(client.call_count(), 2);
}

/// Never answers its first call; answers every later one.
struct StallingClient {
    calls: AtomicUsize,
}

#[async_trait]
impl InferenceClient for StallingClient {
    fn engine_id(&self) -> &str {
        "gemini-1.5-flash"
    }

    async fn generate(&self, _prompt: &str, _image: &DrawingImage) -> Result<String, InferenceError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok(TABLE.to_string())
    }
}

#[tokio::test]
async fn test_abandoned_trigger_releases_session() {
    let client = Arc::new(StallingClient {
        calls: AtomicUsize::new(0),
    });
    let workflow = ReviewWorkflow::new(client.clone());
    let session = tokio::sync::Mutex::new(ReviewSession::new());

    let image = DrawingImage::decode("part.png", encode(ImageFormat::Png, 16)).expect("decode");
    session.lock().await.upload(image).expect("upload");

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), trigger_review(&session, &workflow)).await;
    assert!(abandoned.is_err(), "first call never answers");
    assert_eq!(session.lock().await.state(), ReviewState::ImageLoaded);

    let image = DrawingImage::decode("next.png", encode(ImageFormat::Png, 16)).expect("decode");
    session.lock().await.upload(image).expect("upload after abandon");

    let outcome = trigger_review(&session, &workflow).await.expect("retrigger");
    assert_eq!(outcome.report.as_str(), TABLE);
    assert_eq!(session.lock().await.state(), ReviewState::ReportShown);
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_trigger_without_upload_is_rejected() {
    let client = RecordingClient::replying(TABLE);
    let workflow = ReviewWorkflow::new(client.clone());
    let session = tokio::sync::Mutex::new(ReviewSession::new());

    let err = trigger_review(&session, &workflow).await.unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::NoImage)));
    assert_eq!(client.call_count(), 0);
}

// ==================== Credential resolution ====================

fn file_store(dir: &Path, contents: &str) -> Box<dyn SecretStore> {
    let path = dir.join("secrets.toml");
    std::fs::write(&path, contents).expect("write secrets");
    Box::new(SecretsFileStore::new(path))
}

#[test]
fn test_secrets_file_wins_over_prompt() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let stores = vec![file_store(temp.path(), "GOOGLE_API_KEY = \"AIza-from-file\"\n")];
    let mut prompt = SuppliedPrompt::new(Some("AIza-typed".to_string()));

    let resolved =
        resolve_credential(&stores, Some(&mut prompt as &mut dyn CredentialPrompt)).expect("key");

    assert_eq!(resolved.credential.expose_secret(), "AIza-from-file");
    assert!(matches!(resolved.source, CredentialSource::SecretsFile { .. }));
    assert_eq!(prompt.times_asked(), 0);
}

#[test]
fn test_prompt_used_when_stores_are_empty() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let stores = vec![file_store(temp.path(), "OTHER_KEY = \"x\"\n")];
    let mut prompt = SuppliedPrompt::new(Some("AIza-typed".to_string()));

    let resolved =
        resolve_credential(&stores, Some(&mut prompt as &mut dyn CredentialPrompt)).expect("key");

    assert_eq!(resolved.source, CredentialSource::Interactive);
    assert_eq!(prompt.times_asked(), 1);
}

#[test]
fn test_no_credential_halts_with_warning() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let stores: Vec<Box<dyn SecretStore>> =
        vec![Box::new(SecretsFileStore::new(temp.path().join("missing.toml")))];
    let mut prompt = SuppliedPrompt::new(None);

    let err = resolve_credential(&stores, Some(&mut prompt as &mut dyn CredentialPrompt))
        .unwrap_err();

    assert!(matches!(err, CredentialError::Missing { .. }));
    assert!(Error::from(err).user_message().starts_with("Warning:"));
}

#[test]
fn test_malformed_file_key_is_fatal() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let stores = vec![
        file_store(temp.path(), "GOOGLE_API_KEY = \"bad key\"\n"),
        Box::new(EnvSecretStore) as Box<dyn SecretStore>,
    ];

    let err = resolve_credential(&stores, None).unwrap_err();
    assert!(matches!(err, CredentialError::Malformed { .. }));
}
