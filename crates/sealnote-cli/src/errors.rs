//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;

use sealnote_core::SealnoteError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config, notes directory, note)
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong password, too many attempts)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        }
    }
}

/// Exit code for any error reaching `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    match err.downcast_ref::<SealnoteError>() {
        Some(SealnoteError::NotFound(_)) | Some(SealnoteError::NotInitialized) => {
            exit_codes::NOT_FOUND
        }
        Some(SealnoteError::AuthenticationFailed) => exit_codes::AUTH_FAILED,
        Some(SealnoteError::InvalidInput(_)) | Some(SealnoteError::Validation(_)) => {
            exit_codes::INVALID_INPUT
        }
        _ => 1,
    }
}

/// Contextual hint for common core errors.
pub fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<SealnoteError>()? {
        SealnoteError::NotFound(_) => Some("Hint: Run `sealnote list --category all` to find note IDs."),
        SealnoteError::NotInitialized => Some("Hint: Run `sealnote init` to set a password."),
        SealnoteError::AuthenticationFailed => {
            Some("Hint: Check your password. Set SEALNOTE_PASSWORD for non-interactive use.")
        }
        SealnoteError::MigrationPrecondition(_) => {
            Some("Hint: Run `sealnote status` to see which key method is configured.")
        }
        _ => None,
    }
}
