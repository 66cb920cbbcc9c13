//! Password-derived key management.
//!
//! The [`KeyManager`] is the only writer of key configs, verification hashes
//! and shared salts. It hands out [`DerivedKey`](crate::crypto::DerivedKey)s;
//! it never persists the key or the password.

pub mod config;
pub mod manager;

pub use config::{KeyDerivationConfig, KeyMethod, SharedSalt, SHARED_SALT_VERSION};
pub use manager::{
    import_legacy_password, KeyManager, Verified, KEY_CONFIG_FILE, LEGACY_KEY_FILE,
    PENDING_KEY_FILE, SHARED_SALT_FILE,
};
