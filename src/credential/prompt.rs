//! Interactive credential prompts.

use super::CredentialPrompt;
use crate::error::CredentialError;
use std::io::{self, IsTerminal};

/// Asks on the terminal with echo turned off.
///
/// Only prompts when stdin is a terminal; piped or closed stdin yields no
/// answer so scripted runs halt instead of hanging.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn ask(&mut self, name: &str) -> Result<Option<String>, CredentialError> {
        if !io::stdin().is_terminal() {
            return Ok(None);
        }

        let answer = rpassword::prompt_password(format!("Enter {name}: "))
            .map_err(|e| CredentialError::Prompt(e.to_string()))?;

        Ok(Some(answer))
    }
}

/// Answers with a value collected elsewhere, such as a masked form field.
#[derive(Debug, Default)]
pub struct SuppliedPrompt {
    value: Option<String>,
    asked: usize,
}

impl SuppliedPrompt {
    /// Creates a prompt that answers with `value`.
    #[must_use]
    pub const fn new(value: Option<String>) -> Self {
        Self { value, asked: 0 }
    }

    /// Number of times the prompt was asked.
    #[must_use]
    pub const fn times_asked(&self) -> usize {
        self.asked
    }
}

impl CredentialPrompt for SuppliedPrompt {
    fn ask(&mut self, _name: &str) -> Result<Option<String>, CredentialError> {
        self.asked += 1;
        Ok(self.value.take())
    }
}
