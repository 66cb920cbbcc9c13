//! Key derivation and verification.
//!
//! Two derivation methods exist:
//! - **salted**: Argon2id over the password with a random per-installation
//!   salt. Memory-hard and resistant to precomputation.
//! - **legacy**: a single unsalted SHA-256 of the password. Only read, never
//!   newly adopted; installations using it are migrated to the salted method.

use argon2::Argon2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{Result, SealnoteError};

/// Length of derived key in bytes (32 bytes = 256 bits for XChaCha20-Poly1305).
pub const KEY_LENGTH: usize = 32;

/// Length of freshly generated salts in bytes.
pub const SALT_LENGTH: usize = 16;

/// Marker appended to the key before hashing into the verification hash.
const VERIFICATION_MARKER: &[u8] = b"sealnote:key-verification:v1";

/// Argon2id cost parameters, persisted alongside the salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Time cost (passes over memory)
    pub iterations: u32,
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Lanes
    pub parallelism: u32,
}

impl KdfParams {
    pub fn new(iterations: u32, memory_kib: u32, parallelism: u32) -> Self {
        Self {
            iterations,
            memory_kib,
            parallelism,
        }
    }
}

impl Default for KdfParams {
    /// 64 MiB, 3 passes, single lane.
    fn default() -> Self {
        Self::new(3, 64 * 1024, 1)
    }
}

/// A cryptographic key derived from a password.
///
/// This type ensures that key material is securely zeroized from memory
/// when dropped, reducing the window of exposure.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Wrap raw key bytes.
    ///
    /// # Security
    ///
    /// The caller is responsible for ensuring the bytes come from a secure source.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.key[..].ct_eq(&other.key[..]).into()
    }
}

impl Eq for DerivedKey {}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random salt from the OS entropy source.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH]> {
    let mut salt = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt)
        .map_err(|e| SealnoteError::Crypto(format!("Failed to generate salt: {}", e)))?;
    Ok(salt)
}

/// Derive an encryption key from a password using Argon2id.
///
/// # Security
///
/// - Same password + salt + params always produces the same key
/// - Different salt produces a different key (salt is stored in the key config)
pub fn derive_salted_key(password: &str, salt: &[u8], params: &KdfParams) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(SealnoteError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    if salt.len() < SALT_LENGTH {
        return Err(SealnoteError::InvalidInput(format!(
            "Salt must be at least {} bytes",
            SALT_LENGTH
        )));
    }

    let argon_params = argon2::Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_LENGTH),
    )
    .map_err(|e| SealnoteError::Crypto(format!("Failed to create Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut key_bytes = Zeroizing::new([0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key_bytes[..])
        .map_err(|e| SealnoteError::Crypto(format!("Key derivation failed: {}", e)))?;

    Ok(DerivedKey::from_bytes(*key_bytes))
}

/// Derive a key with the legacy unsalted method: `SHA-256(password)`.
pub fn derive_legacy_key(password: &str) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(SealnoteError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }
    let digest = Sha256::digest(password.as_bytes());
    let mut key_bytes = Zeroizing::new([0u8; KEY_LENGTH]);
    key_bytes.copy_from_slice(&digest);
    Ok(DerivedKey::from_bytes(*key_bytes))
}

/// Hash of the derived key concatenated with a fixed marker.
///
/// Stored in the key config so a candidate password can be checked without
/// storing the password or the key.
pub fn verification_hash(key: &DerivedKey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(VERIFICATION_MARKER);
    hasher.finalize().into()
}

/// Compare a key's verification hash against a stored one in constant time.
pub fn verify_key(key: &DerivedKey, expected: &[u8]) -> bool {
    let actual = verification_hash(key);
    if expected.len() != actual.len() {
        return false;
    }
    actual[..].ct_eq(expected).into()
}
