//! # Sealnote Core
//!
//! Core library for Sealnote - a local-first encrypted note store whose
//! directory can sit under a folder-sync tool.
//!
//! This crate provides key management, the encrypted record store and the
//! change watcher, independent of any CLI or UI.
//!
//! ## Architecture
//!
//! - **crypto**: key derivation, envelope codec, verification hashes
//! - **keys**: password setup, verification and legacy migration
//! - **storage**: one-file-per-note records and the in-memory note map
//! - **watcher**: debounced reconciliation of external file changes
//! - **session**: password to unlocked store, including transparent migration

pub mod crypto;
pub mod error;
pub mod fs;
pub mod keys;
pub mod session;
pub mod storage;
pub mod watcher;

pub use crypto::DerivedKey;
pub use error::{Result, SealnoteError};
pub use keys::{KeyManager, Verified};
pub use session::{unlock_with_password, UnlockOutcome};
pub use storage::{Category, Note, NoteStore, StoreOptions};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
