//! Cryptographic operations for Sealnote.
//!
//! This module provides encryption and key derivation services using
//! well-audited libraries:
//! - **XChaCha20-Poly1305**: authenticated encryption with random 24-byte nonces
//! - **Argon2id**: memory-hard key derivation for the salted method
//! - **SHA-256**: the legacy unsalted method and verification hashes
//!
//! ## Security Model
//!
//! - The password is never stored; only a verification hash of the derived key
//! - The derived key lives in memory only and is zeroized on drop
//! - Every record carries its own nonce; nonces are never reused for a key
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft or inspection of the synced notes directory
//! - Offline brute-force attacks on the password (salted method)
//! - Tampering with record files, including their plaintext timestamps
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an unlocked session / memory
//! - Edit-frequency metadata visible in record timestamps

pub mod envelope;
pub mod key;
pub mod passphrase;

pub use envelope::{decrypt, decrypt_bound, encrypt, encrypt_bound};
pub use key::{
    derive_legacy_key, derive_salted_key, generate_salt, verification_hash, verify_key, DerivedKey,
    KdfParams, KEY_LENGTH, SALT_LENGTH,
};
pub use passphrase::validate_passphrase;
