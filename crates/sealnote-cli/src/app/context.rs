//! Application context for the Sealnote CLI.
//!
//! Provides a unified context that combines CLI arguments with the
//! lazily-loaded config file.

use std::io::IsTerminal;
use std::path::PathBuf;

use once_cell::unsync::OnceCell;
use tracing::debug;

use sealnote_core::{KeyManager, NoteStore, StoreOptions, UnlockOutcome};

use crate::cli::Cli;
use crate::config::{read_config, SealnoteConfig};
use crate::errors::CliError;

use super::password::unlock_with_retry;
use super::resolver::{key_dir_for, missing_config_message, resolve_config_path, resolve_notes_dir};

/// Application context that bundles CLI args with the config file.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<SealnoteConfig>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// True when prompts are allowed.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal() && !self.cli.no_input
    }

    /// Get the config, loading it lazily. A missing file is a not-found error.
    pub fn config(&self) -> anyhow::Result<&SealnoteConfig> {
        self.config.get_or_try_init(|| {
            let path = resolve_config_path()?;
            if !path.exists() {
                return Err(CliError::not_found(
                    "Sealnote is not set up yet",
                    missing_config_message(&path),
                )
                .into());
            }
            let config = read_config(&path)?;
            debug!(path = %path.display(), notes_dir = %config.vault.notes_dir, "loaded config");
            Ok(config)
        })
    }

    pub fn notes_dir(&self) -> anyhow::Result<PathBuf> {
        Ok(resolve_notes_dir(self.cli, self.config()?))
    }

    pub fn key_manager(&self) -> anyhow::Result<KeyManager> {
        let config = self.config()?;
        let key_dir = key_dir_for(&resolve_config_path()?);
        Ok(KeyManager::new(key_dir, config.kdf).with_shared_dir(self.notes_dir()?))
    }

    /// Open and unlock the store for a one-shot command.
    pub fn unlock_store(&self) -> anyhow::Result<NoteStore> {
        let options = self.config()?.store_options();
        Ok(self.unlock_store_with(options)?.0)
    }

    /// Open and unlock the store with explicit options, returning how it was unlocked.
    pub fn unlock_store_with(
        &self,
        options: StoreOptions,
    ) -> anyhow::Result<(NoteStore, UnlockOutcome)> {
        let notes_dir = self.notes_dir()?;
        if !notes_dir.exists() {
            return Err(CliError::not_found(
                format!("Notes directory not found: {}", notes_dir.display()),
                "Hint: Check --notes-dir or the [vault] section of the config file.",
            )
            .into());
        }
        let keys = self.key_manager()?;
        let store = NoteStore::open(&notes_dir, options)?;
        let outcome = unlock_with_retry(&keys, &store, self.interactive(), self.quiet())?;
        Ok((store, outcome))
    }
}
