//! CLI layer for drawing review.
//!
//! Provides the command-line interface using clap, with commands for
//! reviewing a drawing, checking the API key, printing the prompt, and
//! serving the web page.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{execute, review_file};
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
