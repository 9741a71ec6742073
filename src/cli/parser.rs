//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::config::ReviewConfig;
#[cfg(feature = "web")]
use crate::config::{DEFAULT_PORT, ServeConfig};
use crate::error::{CommandError, Result};
use crate::inference::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use clap::{Parser, Subcommand};
#[cfg(feature = "web")]
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Drawing pre-review: upload an engineering drawing, get a DFM review table.
///
/// The API key is read from a secrets file or the `GOOGLE_API_KEY`
/// environment variable, or asked for interactively.
#[derive(Parser, Debug)]
#[command(name = "drawing-review")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Model used for reviews.
    #[arg(long, global = true, env = "DRAWING_REVIEW_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Inference API base URL.
    #[arg(long, global = true, env = "DRAWING_REVIEW_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Timeout for one review call, in seconds.
    #[arg(
        long,
        global = true,
        env = "DRAWING_REVIEW_TIMEOUT_SECS",
        default_value_t = 120
    )]
    pub timeout_secs: u64,

    /// Secrets file holding `GOOGLE_API_KEY` (replaces the default locations).
    #[arg(long, global = true, env = "DRAWING_REVIEW_SECRETS_FILE")]
    pub secrets_file: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review one drawing and print the report.
    ///
    /// Accepts png, jpg and jpeg files.
    Review {
        /// Path to the drawing image.
        image: PathBuf,

        /// Also print the structured summary.
        #[arg(short, long)]
        summary: bool,
    },

    /// Report where the API key comes from without revealing it.
    CheckKey,

    /// Print the fixed review prompt.
    Prompt,

    /// Serve the single-page review tool.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1", env = "DRAWING_REVIEW_HOST")]
        host: IpAddr,

        /// Port to bind.
        #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DRAWING_REVIEW_PORT")]
        port: u16,
    },
}

impl Cli {
    /// Builds the review configuration from the global flags.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero timeout or an empty model name.
    pub fn review_config(&self) -> Result<ReviewConfig> {
        if self.timeout_secs == 0 {
            return Err(
                CommandError::InvalidArgument("--timeout-secs must be at least 1".to_string())
                    .into(),
            );
        }
        if self.model.trim().is_empty() {
            return Err(CommandError::InvalidArgument("--model must not be empty".to_string()).into());
        }

        Ok(ReviewConfig {
            model: self.model.trim().to_string(),
            endpoint: self.endpoint.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            secrets_file: self.secrets_file.clone(),
        })
    }
}

#[cfg(feature = "web")]
impl Commands {
    /// Serve settings, when this is the `serve` command.
    #[must_use]
    pub const fn serve_config(&self) -> Option<ServeConfig> {
        match self {
            Self::Serve { host, port } => Some(ServeConfig {
                host: *host,
                port: *port,
            }),
            _ => None,
        }
    }
}
