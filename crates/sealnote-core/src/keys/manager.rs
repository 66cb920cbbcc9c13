//! Password setup, verification and legacy-to-salted migration.
//!
//! ## Artifacts
//!
//! | file | location | role |
//! |------|----------|------|
//! | `key.json` | config dir | authoritative salted config |
//! | `key.legacy.json` | config dir | legacy config, authoritative only while `key.json` is absent |
//! | `key.json.pending` | config dir | staged salted config during migration |
//! | `.sealnote-salt.json` | notes dir | shared salt for second-device bootstrap |
//!
//! ## Shared-salt bootstrap
//!
//! When local verification fails, or no local artifact exists, and the notes
//! directory carries a shared salt that differs from the local one, the
//! password is accepted provisionally and the key is derived from the shared
//! salt (trust-on-first-sync). There is no verification hash to check
//! against; a wrong password yields a key that simply fails to decrypt the
//! synced records. The caller proves the key against those records and then
//! persists it with [`KeyManager::adopt_shared_key`], replacing any local
//! config.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::config::{KeyDerivationConfig, KeyMethod, SharedSalt};
use crate::crypto::{derive_salted_key, generate_salt, validate_passphrase, DerivedKey, KdfParams};
use crate::error::{Result, SealnoteError};

/// Authoritative salted key config.
pub const KEY_CONFIG_FILE: &str = "key.json";

/// Legacy key config.
pub const LEGACY_KEY_FILE: &str = "key.legacy.json";

/// Staged salted config written before re-encryption starts.
pub const PENDING_KEY_FILE: &str = "key.json.pending";

/// Shared salt inside the notes directory.
pub const SHARED_SALT_FILE: &str = ".sealnote-salt.json";

/// Outcome of a successful password verification.
#[derive(Debug)]
pub enum Verified {
    /// Verified against the local salted config
    Salted(DerivedKey),
    /// Verified against the legacy config; should be migrated
    Legacy(DerivedKey),
    /// No local artifact; key derived from the shared salt without verification
    SharedSalt(DerivedKey),
}

impl Verified {
    pub fn key(&self) -> &DerivedKey {
        match self {
            Verified::Salted(key) | Verified::Legacy(key) | Verified::SharedSalt(key) => key,
        }
    }

    pub fn into_key(self) -> DerivedKey {
        match self {
            Verified::Salted(key) | Verified::Legacy(key) | Verified::SharedSalt(key) => key,
        }
    }
}

/// Owns the key-derivation artifacts of one installation.
#[derive(Debug, Clone)]
pub struct KeyManager {
    config_dir: PathBuf,
    shared_dir: Option<PathBuf>,
    params: KdfParams,
}

impl KeyManager {
    /// Manage artifacts in `config_dir`, deriving new salted keys with `params`.
    pub fn new(config_dir: impl Into<PathBuf>, params: KdfParams) -> Self {
        Self {
            config_dir: config_dir.into(),
            shared_dir: None,
            params,
        }
    }

    /// Also publish and consume a shared salt in `dir` (normally the notes directory).
    pub fn with_shared_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shared_dir = Some(dir.into());
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(KEY_CONFIG_FILE)
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.config_dir.join(LEGACY_KEY_FILE)
    }

    pub fn pending_path(&self) -> PathBuf {
        self.config_dir.join(PENDING_KEY_FILE)
    }

    pub fn shared_salt_path(&self) -> Option<PathBuf> {
        self.shared_dir.as_ref().map(|dir| dir.join(SHARED_SALT_FILE))
    }

    /// True iff no local artifact exists and no shared salt is available.
    pub fn is_first_time_setup(&self) -> bool {
        !self.config_path().exists()
            && !self.legacy_path().exists()
            && !self.shared_salt_path().is_some_and(|path| path.exists())
    }

    /// Method of the authoritative local config, if any.
    pub fn method(&self) -> Result<Option<KeyMethod>> {
        Ok(self.authoritative_config()?.map(|config| config.method))
    }

    /// Set up a new installation with the salted method.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the password does not meet the policy
    /// - `Validation` if a local artifact or a shared salt already exists
    pub fn store_password(&self, password: &str) -> Result<DerivedKey> {
        validate_passphrase(password)?;

        if self.config_path().exists() || self.legacy_path().exists() {
            return Err(SealnoteError::Validation(
                "A password is already configured".to_string(),
            ));
        }
        if self.load_shared_salt()?.is_some() {
            return Err(SealnoteError::Validation(
                "A shared salt already exists; unlock with the existing password instead"
                    .to_string(),
            ));
        }

        let salt = generate_salt()?;
        let key = derive_salted_key(password, &salt, &self.params)?;
        KeyDerivationConfig::salted(&key, &salt, &self.params).save(&self.config_path())?;
        info!(path = %self.config_path().display(), "stored salted key config");

        self.publish_shared_salt(&salt)?;
        Ok(key)
    }

    /// Check `password` against the authoritative config.
    ///
    /// Falls back to the shared salt when the local check fails or nothing is
    /// configured locally, unless the local config already uses that salt.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` for a wrong password (no state is changed)
    /// - `NotInitialized` if nothing is configured
    pub fn verify(&self, password: &str) -> Result<Verified> {
        let local = self.authoritative_config()?;
        let mut local_salt = None;
        if let Some(config) = &local {
            let method = config.method;
            match config.check(password)? {
                Some(key) if method == KeyMethod::Salted => return Ok(Verified::Salted(key)),
                Some(key) => return Ok(Verified::Legacy(key)),
                None => debug!(%method, "password verification failed"),
            }
            local_salt = config.salt_bytes().ok();
        }

        if let Some(shared) = self.load_shared_salt()? {
            let salt = shared.salt_bytes()?;
            if local_salt.as_deref() != Some(salt.as_slice()) {
                if local.is_some() {
                    warn!("local key config rejected password; trying shared salt from synced directory");
                } else {
                    warn!("no local key config; trusting shared salt from synced directory");
                }
                let key = derive_salted_key(password, &salt, &self.params)?;
                return Ok(Verified::SharedSalt(key));
            }
        }

        match local {
            Some(_) => Err(SealnoteError::AuthenticationFailed),
            None => Err(SealnoteError::NotInitialized),
        }
    }

    /// Persist a local salted config for a key obtained from the shared salt.
    ///
    /// Replaces a local config that uses a different salt. A legacy config is
    /// left in place but is no longer authoritative.
    pub fn adopt_shared_key(&self, key: &DerivedKey) -> Result<()> {
        let shared = self.load_shared_salt()?.ok_or_else(|| {
            SealnoteError::Validation("No shared salt available to adopt".to_string())
        })?;
        let salt = shared.salt_bytes()?;

        if let Some(local) = self.authoritative_config()? {
            if local.salt_bytes().ok().as_deref() == Some(salt.as_slice()) {
                return Err(SealnoteError::Validation(
                    "The local key config already uses the shared salt".to_string(),
                ));
            }
            warn!(method = %local.method, "replacing local key config with shared salt");
        }

        KeyDerivationConfig::salted(key, &salt, &self.params).save(&self.config_path())?;
        info!("stored local key config from shared salt");
        Ok(())
    }

    /// Upgrade a legacy installation to the salted method.
    ///
    /// Steps, in order:
    /// 1. verify `password` against the legacy config (fail closed otherwise)
    /// 2. stage the salted config in `key.json.pending`, reusing a staged or
    ///    shared salt if one exists so interrupted or multi-device migrations
    ///    converge on one key
    /// 3. call `reencrypt(legacy_key, salted_key)`
    /// 4. promote the staged config to `key.json` by atomic rename
    /// 5. delete the legacy config
    ///
    /// A failure before step 4 leaves the legacy config authoritative.
    pub fn migrate_to_salted<F>(&self, password: &str, reencrypt: F) -> Result<DerivedKey>
    where
        F: FnOnce(&DerivedKey, &DerivedKey) -> Result<()>,
    {
        if self.config_path().exists() {
            return Err(SealnoteError::MigrationPrecondition(
                "installation already uses the salted method".to_string(),
            ));
        }
        let legacy = KeyDerivationConfig::load(&self.legacy_path())?.ok_or_else(|| {
            SealnoteError::MigrationPrecondition("no legacy key config found".to_string())
        })?;
        if legacy.method != KeyMethod::Legacy {
            return Err(SealnoteError::MigrationPrecondition(
                "legacy key config does not use the legacy method".to_string(),
            ));
        }
        let legacy_key = legacy.check(password)?.ok_or_else(|| {
            SealnoteError::MigrationPrecondition("legacy password verification failed".to_string())
        })?;

        let (salted_key, staged) = self.stage_salted_config(password)?;
        info!("staged salted key config; re-encrypting records");

        reencrypt(&legacy_key, &salted_key)?;

        crate::fs::rename_with_fallback(&self.pending_path(), &self.config_path())?;
        info!("promoted salted key config");

        match std::fs::remove_file(self.legacy_path()) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        info!("removed legacy key config");

        self.publish_shared_salt(&staged.salt_bytes()?)?;
        Ok(salted_key)
    }

    fn stage_salted_config(&self, password: &str) -> Result<(DerivedKey, KeyDerivationConfig)> {
        if let Some(pending) = KeyDerivationConfig::load(&self.pending_path())? {
            if pending.method == KeyMethod::Salted {
                if let Some(key) = pending.check(password)? {
                    debug!("resuming staged migration");
                    return Ok((key, pending));
                }
            }
            warn!("discarding staged key config that does not match this password");
        }

        let salt = match self.load_shared_salt()? {
            Some(shared) => shared.salt_bytes()?,
            None => generate_salt()?.to_vec(),
        };
        let key = derive_salted_key(password, &salt, &self.params)?;
        let staged = KeyDerivationConfig::salted(&key, &salt, &self.params);
        staged.save(&self.pending_path())?;
        Ok((key, staged))
    }

    fn authoritative_config(&self) -> Result<Option<KeyDerivationConfig>> {
        if let Some(config) = KeyDerivationConfig::load(&self.config_path())? {
            return Ok(Some(config));
        }
        KeyDerivationConfig::load(&self.legacy_path())
    }

    fn load_shared_salt(&self) -> Result<Option<SharedSalt>> {
        match self.shared_salt_path() {
            Some(path) => SharedSalt::load(&path),
            None => Ok(None),
        }
    }

    fn publish_shared_salt(&self, salt: &[u8]) -> Result<()> {
        let Some(path) = self.shared_salt_path() else {
            return Ok(());
        };
        if path.exists() {
            return Ok(());
        }
        SharedSalt::new(salt).save(&path)?;
        debug!(path = %path.display(), "published shared salt");
        Ok(())
    }
}

/// Write a legacy key config for `password` into `config_dir`.
///
/// Imports an installation created before the salted method existed.
pub fn import_legacy_password(config_dir: &Path, password: &str) -> Result<()> {
    let key = crate::crypto::derive_legacy_key(password)?;
    KeyDerivationConfig::legacy(&key).save(&config_dir.join(LEGACY_KEY_FILE))
}
