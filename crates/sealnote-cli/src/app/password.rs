//! Password prompting and unlocking with retry logic.

use dialoguer::Password;
use secrecy::{ExposeSecret, SecretString};

use sealnote_core::crypto::validate_passphrase;
use sealnote_core::{unlock_with_password, KeyManager, NoteStore, SealnoteError, UnlockOutcome};

use crate::constants::{MAX_PASSWORD_ATTEMPTS, PASSWORD_ENV};
use crate::errors::CliError;

fn env_password() -> Option<SecretString> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(SecretString::from)
}

/// Prompt for the password, or read it from SEALNOTE_PASSWORD.
fn read_password(interactive: bool) -> anyhow::Result<SecretString> {
    if let Some(password) = env_password() {
        return Ok(password);
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No password provided and no TTY available. Set {}.",
            PASSWORD_ENV
        ))
        .into());
    }
    Password::new()
        .with_prompt("Password")
        .interact()
        .map(SecretString::from)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Prompt for a new password with confirmation, or read it from SEALNOTE_PASSWORD.
pub fn read_new_password(interactive: bool) -> anyhow::Result<SecretString> {
    if let Some(password) = env_password() {
        return Ok(password);
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No password provided and no TTY available. Set {}.",
            PASSWORD_ENV
        ))
        .into());
    }
    loop {
        let password = Password::new()
            .with_prompt("Choose a password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?;
        if let Err(err) = validate_passphrase(&password) {
            eprintln!("{}", err);
            continue;
        }
        return Ok(SecretString::from(password));
    }
}

/// Unlock `store`, prompting again on a wrong password when interactive.
///
/// A password from the environment gets exactly one attempt.
pub fn unlock_with_retry(
    keys: &KeyManager,
    store: &NoteStore,
    interactive: bool,
    quiet: bool,
) -> anyhow::Result<UnlockOutcome> {
    let attempts = if interactive && env_password().is_none() {
        MAX_PASSWORD_ATTEMPTS
    } else {
        1
    };

    for attempt in 1..=attempts {
        let password = read_password(interactive)?;
        match unlock_with_password(keys, store, password.expose_secret()) {
            Ok(outcome) => {
                report_outcome(&outcome, quiet);
                return Ok(outcome);
            }
            Err(SealnoteError::AuthenticationFailed) if attempt < attempts => {
                eprintln!("Incorrect password, try again.");
            }
            Err(SealnoteError::AuthenticationFailed) => {
                return Err(CliError::auth_failed_with_hint(
                    "Incorrect password",
                    format!("Hint: Check your password. Set {} for non-interactive use.", PASSWORD_ENV),
                )
                .into());
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(CliError::auth_failed_with_hint("Too many attempts", "Hint: Try again later.").into())
}

fn report_outcome(outcome: &UnlockOutcome, quiet: bool) {
    let report = outcome.report();
    if report.failed > 0 {
        eprintln!(
            "Warning: {} note file(s) could not be read ({} moved to corrupted/)",
            report.failed, report.quarantined
        );
    }
    if quiet {
        return;
    }
    match outcome {
        UnlockOutcome::Migrated { reencrypted, .. } => {
            eprintln!(
                "Upgraded to salted key derivation; re-encrypted {} note(s).",
                reencrypted
            );
        }
        UnlockOutcome::Bootstrapped(_) => {
            eprintln!("Joined an existing notes directory using its shared salt.");
        }
        UnlockOutcome::Unlocked(_) => {}
    }
}
