//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{OutputFormat, format_key_source, format_prompt, format_review};
use crate::cli::parser::{Cli, Commands};
use crate::config::ReviewConfig;
use crate::credential::{
    CredentialPrompt, ResolvedCredential, TerminalPrompt, default_stores, resolve_credential,
};
use crate::drawing::DrawingImage;
use crate::error::{IoError, Result};
use crate::inference::GeminiClient;
use crate::review::{ImageInfo, ReviewOutcome, ReviewSession, ReviewWorkflow, trigger_review};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Review { image, summary } => cmd_review(cli, image, *summary, format),
        Commands::CheckKey => cmd_check_key(cli, format),
        Commands::Prompt => Ok(format_prompt(format)),
        #[cfg(feature = "web")]
        Commands::Serve { .. } => cmd_serve(cli),
    }
}

/// Resolves the key from the configured stores, then the terminal.
fn resolve(config: &ReviewConfig) -> Result<ResolvedCredential> {
    let stores = default_stores(config.secrets_file.as_deref());
    let mut prompt = TerminalPrompt;
    Ok(resolve_credential(
        &stores,
        Some(&mut prompt as &mut dyn CredentialPrompt),
    )?)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| IoError::Generic(format!("failed to start async runtime: {e}")).into())
}

/// Uploads `path` into a fresh session and triggers one review.
///
/// Unsupported or unreadable files fail before the workflow is entered.
///
/// # Errors
///
/// Returns an input/I/O error for a bad file, or the review failure.
pub async fn review_file(
    workflow: &ReviewWorkflow,
    path: &Path,
) -> Result<(ImageInfo, ReviewOutcome)> {
    let image = DrawingImage::open(path)?;
    let info = ImageInfo::from(&image);

    let session = Mutex::new(ReviewSession::new());
    session.lock().await.upload(image)?;

    let outcome = trigger_review(&session, workflow).await?;
    Ok((info, outcome))
}

// ==================== Command Implementations ====================

fn cmd_review(cli: &Cli, image: &Path, show_summary: bool, format: OutputFormat) -> Result<String> {
    let config = cli.review_config()?;

    // The key comes first: without it nothing else is reachable.
    let resolved = resolve(&config)?;
    let client = GeminiClient::new(resolved.credential, &config)?;
    let workflow = ReviewWorkflow::new(Arc::new(client));

    let (info, outcome) = runtime()?.block_on(review_file(&workflow, image))?;
    Ok(format_review(&info, &outcome, show_summary, format))
}

fn cmd_check_key(cli: &Cli, format: OutputFormat) -> Result<String> {
    let config = cli.review_config()?;
    let resolved = resolve(&config)?;
    Ok(format_key_source(&resolved.source, format))
}

#[cfg(feature = "web")]
fn cmd_serve(cli: &Cli) -> Result<String> {
    use crate::error::{CredentialError, Error};
    use crate::web::{AppState, WebServer};

    let config = cli.review_config()?;
    let Some(serve) = cli.command.serve_config() else {
        return Ok(String::new());
    };

    // The page asks for the key itself when no store provides one.
    let stores = default_stores(config.secrets_file.as_deref());
    let state = match resolve_credential(&stores, None) {
        Ok(ResolvedCredential { credential, source }) => {
            let client = GeminiClient::new(credential, &config)?;
            AppState::configured(config, Arc::new(client), source)
        }
        Err(CredentialError::Missing { .. }) => AppState::unconfigured(config),
        Err(e) => return Err(Error::from(e)),
    };

    runtime()?.block_on(WebServer::new(state).start(serve))?;
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
    use tempfile::TempDir;

    fn cli(command: Commands, secrets_file: Option<std::path::PathBuf>) -> Cli {
        Cli {
            verbose: false,
            format: "text".to_string(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 120,
            secrets_file,
            command,
        }
    }

    #[test]
    fn test_prompt_command() {
        let output = execute(&cli(Commands::Prompt, None)).unwrap();
        assert!(output.contains("DFM"));
    }

    #[test]
    fn test_check_key_from_secrets_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "GOOGLE_API_KEY = \"AIza-file-key\"\n").unwrap();

        let output = execute(&cli(Commands::CheckKey, Some(path.clone()))).unwrap();
        assert!(output.contains(&path.display().to_string()));
        assert!(!output.contains("AIza-file-key"));
    }

    #[test]
    fn test_check_key_malformed_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "GOOGLE_API_KEY = \"two words\"\n").unwrap();

        let err = execute(&cli(Commands::CheckKey, Some(path))).unwrap_err();
        assert!(err.user_message().starts_with("Configuration failed:"));
    }
}
