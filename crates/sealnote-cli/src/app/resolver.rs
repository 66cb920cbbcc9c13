//! Path resolution for the config file and notes directory.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, SealnoteConfig};
use crate::constants::CONFIG_ENV;

/// Resolve the config file path, checking SEALNOTE_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Directory holding the key config: the config file's directory.
pub fn key_dir_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Notes directory from `--notes-dir` / SEALNOTE_NOTES_DIR, else the config.
pub fn resolve_notes_dir(cli: &Cli, config: &SealnoteConfig) -> PathBuf {
    match cli.notes_dir.as_deref() {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(&config.vault.notes_dir),
    }
}

/// Error message when the config file is missing.
pub fn missing_config_message(config_path: &Path) -> String {
    format!(
        "Config file not found: {}\n\nRun:\n  sealnote init\n\nOr set SEALNOTE_CONFIG to specify a different config location.",
        config_path.display()
    )
}
