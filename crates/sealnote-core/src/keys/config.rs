//! Persisted key-derivation artifacts.
//!
//! - [`KeyDerivationConfig`]: method, salt, cost parameters and the
//!   verification hash for one installation.
//! - [`SharedSalt`]: only the salt, placed in the synced notes directory so a
//!   second device can derive the same key.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{
    derive_legacy_key, derive_salted_key, verification_hash, verify_key, DerivedKey, KdfParams,
    KEY_LENGTH,
};
use crate::error::{Result, SealnoteError};

/// Current shared-salt file format version.
pub const SHARED_SALT_VERSION: u32 = 1;

/// Key derivation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMethod {
    /// Unsalted SHA-256 of the password (read-only, migrated away from)
    Legacy,
    /// Argon2id with a random salt
    Salted,
}

impl std::fmt::Display for KeyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMethod::Legacy => write!(f, "legacy"),
            KeyMethod::Salted => write!(f, "salted"),
        }
    }
}

/// Key derivation settings and verification hash for one installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDerivationConfig {
    pub method: KeyMethod,

    /// Base64 salt, present only for the salted method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,

    pub iterations: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_kib: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,

    pub key_length: usize,

    /// Base64 of `SHA-256(key || marker)`
    pub verification_hash: String,
}

impl KeyDerivationConfig {
    /// Config for a key derived with the salted method.
    pub fn salted(key: &DerivedKey, salt: &[u8], params: &KdfParams) -> Self {
        Self {
            method: KeyMethod::Salted,
            salt: Some(STANDARD.encode(salt)),
            iterations: params.iterations,
            memory_kib: Some(params.memory_kib),
            parallelism: Some(params.parallelism),
            key_length: KEY_LENGTH,
            verification_hash: STANDARD.encode(verification_hash(key)),
        }
    }

    /// Config for a key derived with the legacy method.
    ///
    /// Used when importing an existing legacy installation; new installations
    /// always start salted.
    pub fn legacy(key: &DerivedKey) -> Self {
        Self {
            method: KeyMethod::Legacy,
            salt: None,
            iterations: 1,
            memory_kib: None,
            parallelism: None,
            key_length: KEY_LENGTH,
            verification_hash: STANDARD.encode(verification_hash(key)),
        }
    }

    /// Decoded salt bytes (salted method only).
    pub fn salt_bytes(&self) -> Result<Vec<u8>> {
        let encoded = self.salt.as_ref().ok_or_else(|| {
            SealnoteError::Validation("Salted key config is missing its salt".to_string())
        })?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| SealnoteError::Validation(format!("Invalid salt encoding: {}", e)))
    }

    /// Argon2 cost parameters recorded in this config.
    pub fn params(&self) -> KdfParams {
        let defaults = KdfParams::default();
        KdfParams::new(
            self.iterations,
            self.memory_kib.unwrap_or(defaults.memory_kib),
            self.parallelism.unwrap_or(defaults.parallelism),
        )
    }

    /// Derive the candidate key for `password` using this config's method.
    pub fn derive(&self, password: &str) -> Result<DerivedKey> {
        self.validate()?;
        match self.method {
            KeyMethod::Legacy => derive_legacy_key(password),
            KeyMethod::Salted => derive_salted_key(password, &self.salt_bytes()?, &self.params()),
        }
    }

    /// Derive and check against the stored verification hash.
    ///
    /// Returns `Ok(None)` for a wrong password.
    pub fn check(&self, password: &str) -> Result<Option<DerivedKey>> {
        let expected = STANDARD
            .decode(self.verification_hash.as_bytes())
            .map_err(|e| {
                SealnoteError::Validation(format!("Invalid verification hash encoding: {}", e))
            })?;
        let key = self.derive(password)?;
        if verify_key(&key, &expected) {
            Ok(Some(key))
        } else {
            Ok(None)
        }
    }

    /// Load a config, returning `None` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match std::fs::read(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_slice(&contents)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Write the config atomically with owner-only permissions.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        write_json(path, self)
    }

    fn validate(&self) -> Result<()> {
        if self.key_length != KEY_LENGTH {
            return Err(SealnoteError::Validation(format!(
                "Unsupported key length {} (expected {})",
                self.key_length, KEY_LENGTH
            )));
        }
        if self.method == KeyMethod::Salted && self.salt.is_none() {
            return Err(SealnoteError::Validation(
                "Salted key config is missing its salt".to_string(),
            ));
        }
        Ok(())
    }
}

/// Salt distributed through the synced notes directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedSalt {
    pub salt: String,
    pub created_at: DateTime<Utc>,
    pub version: u32,
}

impl SharedSalt {
    pub fn new(salt: &[u8]) -> Self {
        Self {
            salt: STANDARD.encode(salt),
            created_at: Utc::now(),
            version: SHARED_SALT_VERSION,
        }
    }

    pub fn salt_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.salt.as_bytes())
            .map_err(|e| SealnoteError::Validation(format!("Invalid shared salt: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match std::fs::read(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let shared: Self = serde_json::from_slice(&contents)?;
        if shared.version > SHARED_SALT_VERSION {
            return Err(SealnoteError::Validation(format!(
                "Shared salt version {} is newer than supported version {}",
                shared.version, SHARED_SALT_VERSION
            )));
        }
        Ok(Some(shared))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_vec_pretty(value)?;
    crate::fs::write_atomic(path, &contents)?;
    crate::fs::restrict_permissions(path)?;
    Ok(())
}
