//! Single-page web surface.
//!
//! Serves the review page and a small JSON API over one shared
//! [`ReviewSession`]. When no secret store provides a key, the server starts
//! unconfigured and the page asks for one; until then uploads and reviews are
//! refused.

mod api;
mod page;

pub use api::router;

use crate::config::{ReviewConfig, ServeConfig};
use crate::credential::{
    CredentialPrompt, CredentialSource, ResolvedCredential, SuppliedPrompt, resolve_credential,
};
use crate::error::{CredentialError, Error, IoError, Result};
use crate::inference::{GeminiClient, InferenceClient};
use crate::review::{ReviewSession, ReviewWorkflow};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use tracing::info;

/// Builds an inference client from a key typed into the page.
pub type ClientFactory =
    Box<dyn Fn(ResolvedCredential, &ReviewConfig) -> Result<Arc<dyn InferenceClient>> + Send + Sync>;

/// Shared state behind every handler.
pub struct AppState {
    config: ReviewConfig,
    workflow: OnceLock<ReviewWorkflow>,
    source: OnceLock<CredentialSource>,
    session: Mutex<ReviewSession>,
    connect: ClientFactory,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("workflow", &self.workflow.get())
            .field("source", &self.source.get())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State with a key resolved at startup.
    #[must_use]
    pub fn configured(
        config: ReviewConfig,
        client: Arc<dyn InferenceClient>,
        source: CredentialSource,
    ) -> Self {
        let state = Self::unconfigured(config);
        let _ = state.workflow.set(ReviewWorkflow::new(client));
        let _ = state.source.set(source);
        state
    }

    /// State waiting for a key from the page.
    #[must_use]
    pub fn unconfigured(config: ReviewConfig) -> Self {
        Self {
            config,
            workflow: OnceLock::new(),
            source: OnceLock::new(),
            session: Mutex::new(ReviewSession::new()),
            connect: Box::new(
                |resolved: ResolvedCredential, config: &ReviewConfig| -> Result<Arc<dyn InferenceClient>> {
                    let client = GeminiClient::new(resolved.credential, config)?;
                    Ok(Arc::new(client))
                },
            ),
        }
    }

    /// Replaces how a page-supplied key becomes a client.
    #[must_use]
    pub fn with_client_factory(mut self, connect: ClientFactory) -> Self {
        self.connect = connect;
        self
    }

    /// The workflow, once a key is known.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Missing` before a key is configured.
    pub fn workflow(&self) -> Result<&ReviewWorkflow> {
        self.workflow.get().ok_or_else(|| {
            Error::from(CredentialError::Missing {
                name: crate::credential::SECRET_NAME.to_string(),
            })
        })
    }

    /// Whether a key has been configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.workflow.get().is_some()
    }

    /// Where the key came from, if configured.
    #[must_use]
    pub fn credential_source(&self) -> Option<&CredentialSource> {
        self.source.get()
    }

    /// The review session.
    #[must_use]
    pub const fn session(&self) -> &Mutex<ReviewSession> {
        &self.session
    }

    /// Configures the key typed into the page.
    ///
    /// The key can be set once per process.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyConfigured` if a key is already set, `Missing` for a
    /// blank value, and `Malformed` for an invalid key.
    pub fn configure(&self, value: String) -> Result<&CredentialSource> {
        if self.is_configured() {
            return Err(CredentialError::AlreadyConfigured.into());
        }

        let mut prompt = SuppliedPrompt::new(Some(value));
        let resolved = resolve_credential(&[], Some(&mut prompt as &mut dyn CredentialPrompt))?;
        let source = resolved.source.clone();
        let client = (self.connect)(resolved, &self.config)?;

        self.workflow
            .set(ReviewWorkflow::new(client))
            .map_err(|_| CredentialError::AlreadyConfigured)?;
        Ok(self.source.get_or_init(|| source))
    }
}

/// HTTP server for the review page.
#[derive(Debug)]
pub struct WebServer {
    state: Arc<AppState>,
}

impl WebServer {
    /// Creates a server over `state`.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Binds and serves until the process stops.
    ///
    /// # Errors
    ///
    /// Returns a server error if binding or serving fails.
    pub async fn start(self, config: ServeConfig) -> Result<()> {
        let addr = SocketAddr::new(config.host, config.port);
        let router = router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| IoError::Server(format!("failed to bind {addr}: {e}")))?;

        info!(
            configured = self.state.is_configured(),
            "Address bound. Starting web server on http://{}", addr
        );

        axum::serve(listener, router)
            .await
            .map_err(|e| IoError::Server(e.to_string()).into())
    }
}
