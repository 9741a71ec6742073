//! Binary entry point for drawing-review.
//!
//! Uploads an engineering drawing to a multimodal model and prints the DFM
//! review table.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use drawing_review::cli::output::{OutputFormat, format_error};
use drawing_review::cli::{Cli, execute};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.format);

    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                // Handle broken pipe gracefully (e.g., when piped to `head` or `jq`)
                if let Err(e) = write!(io::stdout(), "{output}")
                    && e.kind() != io::ErrorKind::BrokenPipe
                {
                    eprintln!("Error writing to stdout: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let error_output = format_error(&e, format);
            match format {
                OutputFormat::Json => {
                    // JSON errors go to stdout for programmatic parsing
                    println!("{error_output}");
                }
                OutputFormat::Text => {
                    eprintln!("{error_output}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries only command output.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,drawing_review=debug"
    } else {
        "warn,drawing_review=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}
