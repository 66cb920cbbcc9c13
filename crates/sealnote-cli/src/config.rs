use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sealnote_core::crypto::KdfParams;
use sealnote_core::storage::DEFAULT_DEBOUNCE;
use sealnote_core::StoreOptions;

#[derive(Debug, Serialize, Deserialize)]
pub struct SealnoteConfig {
    pub vault: VaultSection,
    #[serde(default)]
    pub kdf: KdfParams,
    #[serde(default)]
    pub sync: SyncSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VaultSection {
    pub notes_dir: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub debounce_ms: u64,
    pub expected_deletion_ttl_seconds: u64,
    pub quarantine_corrupted: bool,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            expected_deletion_ttl_seconds: 10,
            quarantine_corrupted: true,
        }
    }
}

impl SealnoteConfig {
    pub fn new(notes_dir: &Path, kdf: KdfParams) -> Self {
        Self {
            vault: VaultSection {
                notes_dir: notes_dir.to_string_lossy().to_string(),
            },
            kdf,
            sync: SyncSection::default(),
        }
    }

    /// Store options for one-shot commands (no watcher).
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            expected_deletion_ttl: Duration::from_secs(self.sync.expected_deletion_ttl_seconds),
            quarantine_corrupted: self.sync.quarantine_corrupted,
            ..StoreOptions::default()
        }
        .without_watcher()
    }

    /// Store options for `watch`.
    pub fn watch_options(&self) -> StoreOptions {
        self.store_options()
            .with_debounce(Duration::from_millis(self.sync.debounce_ms))
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_notes_dir() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("notes"))
}

pub fn read_config(path: &Path) -> anyhow::Result<SealnoteConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &SealnoteConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("sealnote"));
        }
    }
    Ok(home_dir()?.join(".config").join("sealnote"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("sealnote"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("sealnote"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
