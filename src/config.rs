//! Runtime configuration.
//!
//! Values come from CLI flags (with environment fallbacks declared in
//! [`crate::cli::Cli`]); these structs carry them into the library.

use crate::inference::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

/// Default port for `serve`.
pub const DEFAULT_PORT: u16 = 8501;

/// Settings for the review workflow and its inference client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewConfig {
    /// Model identifier, also reported as the summary's engine.
    pub model: String,
    /// Inference API base URL.
    pub endpoint: String,
    /// Bound on one inference call.
    pub timeout: Duration,
    /// Explicit secrets file replacing the default locations.
    pub secrets_file: Option<PathBuf>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            secrets_file: None,
        }
    }
}

/// Settings for the web surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeConfig {
    /// Address to bind.
    pub host: IpAddr,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}
