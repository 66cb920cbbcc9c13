//! Password to unlocked store.
//!
//! [`unlock_with_password`] verifies the password and unlocks the store,
//! upgrading legacy installations and adopting a shared salt on the way.

use std::cell::Cell;

use tracing::{info, warn};

use crate::error::{Result, SealnoteError};
use crate::keys::{KeyManager, Verified};
use crate::storage::{NoteStore, ReloadReport};

/// How a store was unlocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Salted config verified
    Unlocked(ReloadReport),
    /// Legacy config verified, records re-encrypted and config upgraded
    Migrated {
        report: ReloadReport,
        reencrypted: usize,
    },
    /// Key taken from the shared salt and stored locally, replacing any
    /// local config that no longer matched
    Bootstrapped(ReloadReport),
}

impl UnlockOutcome {
    pub fn report(&self) -> &ReloadReport {
        match self {
            UnlockOutcome::Unlocked(report)
            | UnlockOutcome::Bootstrapped(report)
            | UnlockOutcome::Migrated { report, .. } => report,
        }
    }
}

/// Verify `password` and unlock `store`.
///
/// A legacy installation is migrated first: every record is re-encrypted in
/// place under the new salted key before the config is upgraded. A device
/// bootstrapping from a shared salt only persists the key once it opens at
/// least one existing record (or the directory has none). Replacing a local
/// config that rejected the password always requires an opened record.
///
/// # Errors
///
/// - `AuthenticationFailed` for a wrong password, including a shared-salt key
///   that opens none of the existing records; the local config is untouched
/// - `NotInitialized` if nothing is configured
/// - any migration or I/O error; a failed migration leaves the legacy config usable
pub fn unlock_with_password(
    keys: &KeyManager,
    store: &NoteStore,
    password: &str,
) -> Result<UnlockOutcome> {
    match keys.verify(password)? {
        Verified::Salted(key) => Ok(UnlockOutcome::Unlocked(store.unlock(key)?)),
        Verified::Legacy(_) => {
            store.lock();
            let reencrypted = Cell::new(0);
            let key = keys.migrate_to_salted(password, |old, new| {
                reencrypted.set(store.reencrypt_all(old, new)?);
                Ok(())
            })?;
            let report = store.unlock(key)?;
            info!(reencrypted = reencrypted.get(), "migrated to salted key derivation");
            Ok(UnlockOutcome::Migrated {
                report,
                reencrypted: reencrypted.get(),
            })
        }
        Verified::SharedSalt(key) => {
            let replaces_local = keys.method()?.is_some();
            let report = store.unlock(key.clone())?;
            let unproven = if replaces_local {
                report.loaded == 0
            } else {
                report.loaded == 0 && report.failed > 0
            };
            if unproven {
                store.lock();
                warn!(
                    failed = report.failed,
                    replaces_local,
                    "key from shared salt opens none of the existing records"
                );
                return Err(SealnoteError::AuthenticationFailed);
            }
            keys.adopt_shared_key(&key)?;
            Ok(UnlockOutcome::Bootstrapped(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KdfParams;
    use crate::keys::{import_legacy_password, KeyMethod};
    use crate::storage::StoreOptions;
    use tempfile::tempdir;

    const PASSWORD: &str = "correct-horse";

    fn fast() -> KdfParams {
        KdfParams::new(1, 64, 1)
    }

    fn store(dir: &std::path::Path) -> NoteStore {
        NoteStore::open(dir, StoreOptions::default().without_watcher()).unwrap()
    }

    #[test]
    fn test_salted_unlock_and_wrong_password() {
        let config = tempdir().unwrap();
        let notes = tempdir().unwrap();
        let keys = KeyManager::new(config.path(), fast()).with_shared_dir(notes.path());
        keys.store_password(PASSWORD).unwrap();

        let store = store(notes.path());
        assert!(matches!(
            unlock_with_password(&keys, &store, "wrong"),
            Err(SealnoteError::AuthenticationFailed)
        ));
        assert!(!store.is_unlocked());

        let outcome = unlock_with_password(&keys, &store, PASSWORD).unwrap();
        assert!(matches!(outcome, UnlockOutcome::Unlocked(_)));
        assert!(store.is_unlocked());
    }

    #[test]
    fn test_legacy_install_migrates_records_transparently() {
        let config = tempdir().unwrap();
        let notes = tempdir().unwrap();
        import_legacy_password(config.path(), PASSWORD).unwrap();
        let keys = KeyManager::new(config.path(), fast()).with_shared_dir(notes.path());

        let legacy_key = keys.verify(PASSWORD).unwrap().into_key();
        let store = store(notes.path());
        store.unlock(legacy_key).unwrap();
        let note = store.create("written before the upgrade").unwrap();
        store.lock();

        let outcome = unlock_with_password(&keys, &store, PASSWORD).unwrap();
        match &outcome {
            UnlockOutcome::Migrated { reencrypted, report } => {
                assert_eq!(*reencrypted, 1);
                assert_eq!(report.loaded, 1);
            }
            other => panic!("expected migration, got {:?}", other),
        }
        assert_eq!(store.get(&note.id).unwrap().content, "written before the upgrade");
        assert_eq!(keys.method().unwrap(), Some(KeyMethod::Salted));
        assert!(!keys.legacy_path().exists());

        store.lock();
        let again = unlock_with_password(&keys, &store, PASSWORD).unwrap();
        assert!(matches!(again, UnlockOutcome::Unlocked(_)));
    }

    #[test]
    fn test_second_device_bootstraps_from_shared_salt() {
        let notes = tempdir().unwrap();
        let first_config = tempdir().unwrap();
        let second_config = tempdir().unwrap();

        let first = KeyManager::new(first_config.path(), fast()).with_shared_dir(notes.path());
        first.store_password(PASSWORD).unwrap();
        let first_store = store(notes.path());
        unlock_with_password(&first, &first_store, PASSWORD).unwrap();
        let note = first_store.create("synced").unwrap();
        first_store.close();

        let second = KeyManager::new(second_config.path(), fast()).with_shared_dir(notes.path());
        let second_store = store(notes.path());

        assert!(matches!(
            unlock_with_password(&second, &second_store, "not-the-password"),
            Err(SealnoteError::AuthenticationFailed)
        ));
        assert!(!second.config_path().exists());

        let outcome = unlock_with_password(&second, &second_store, PASSWORD).unwrap();
        assert!(matches!(outcome, UnlockOutcome::Bootstrapped(_)));
        assert_eq!(second_store.get(&note.id).unwrap().content, "synced");
        assert!(second.config_path().exists());
    }

    #[test]
    fn test_stale_local_config_is_replaced_by_shared_salt() {
        let notes = tempdir().unwrap();
        let first_config = tempdir().unwrap();
        let second_config = tempdir().unwrap();

        // The second device was set up on its own before syncing.
        KeyManager::new(second_config.path(), fast())
            .store_password("bravo-password")
            .unwrap();

        let first = KeyManager::new(first_config.path(), fast()).with_shared_dir(notes.path());
        first.store_password(PASSWORD).unwrap();
        let first_store = store(notes.path());
        unlock_with_password(&first, &first_store, PASSWORD).unwrap();
        let note = first_store.create("synced").unwrap();
        first_store.close();

        let second = KeyManager::new(second_config.path(), fast()).with_shared_dir(notes.path());
        let second_store = store(notes.path());
        let before = std::fs::read(second.config_path()).unwrap();

        assert!(matches!(
            unlock_with_password(&second, &second_store, "not-the-password"),
            Err(SealnoteError::AuthenticationFailed)
        ));
        assert!(!second_store.is_unlocked());
        assert_eq!(std::fs::read(second.config_path()).unwrap(), before);

        let outcome = unlock_with_password(&second, &second_store, PASSWORD).unwrap();
        assert!(matches!(outcome, UnlockOutcome::Bootstrapped(_)));
        assert_eq!(second_store.get(&note.id).unwrap().content, "synced");
        assert_ne!(std::fs::read(second.config_path()).unwrap(), before);

        second_store.lock();
        let again = unlock_with_password(&second, &second_store, PASSWORD).unwrap();
        assert!(matches!(again, UnlockOutcome::Unlocked(_)));
    }

    #[test]
    fn test_stale_local_config_kept_when_directory_is_empty() {
        let notes = tempdir().unwrap();
        let first_config = tempdir().unwrap();
        let second_config = tempdir().unwrap();

        KeyManager::new(second_config.path(), fast())
            .store_password("bravo-password")
            .unwrap();
        KeyManager::new(first_config.path(), fast())
            .with_shared_dir(notes.path())
            .store_password(PASSWORD)
            .unwrap();

        let second = KeyManager::new(second_config.path(), fast()).with_shared_dir(notes.path());
        let second_store = store(notes.path());
        let before = std::fs::read(second.config_path()).unwrap();

        assert!(matches!(
            unlock_with_password(&second, &second_store, PASSWORD),
            Err(SealnoteError::AuthenticationFailed)
        ));
        assert_eq!(std::fs::read(second.config_path()).unwrap(), before);
    }
}
