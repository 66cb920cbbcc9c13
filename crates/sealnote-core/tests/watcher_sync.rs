use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use sealnote_core::storage::{record_path, EncryptedRecord};
use sealnote_core::{DerivedKey, Note, NoteStore, SealnoteError, StoreOptions};
use tempfile::tempdir;

const DEBOUNCE: Duration = Duration::from_millis(50);

fn key() -> DerivedKey {
    DerivedKey::from_bytes([42u8; 32])
}

fn watched_store(dir: &Path) -> NoteStore {
    let store = NoteStore::open(dir, StoreOptions::default().with_debounce(DEBOUNCE))
        .expect("open should succeed");
    store.unlock(key()).expect("unlock should succeed");
    assert!(store.is_watching());
    store
}

fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

/// Replace a record the way a sync tool would: temp file, then rename.
fn external_write(dir: &Path, id: &str, bytes: &[u8]) {
    let temp = dir.join(format!(".sync-{}.partial", id));
    fs::write(&temp, bytes).expect("temp write should succeed");
    fs::rename(&temp, record_path(dir, id)).expect("rename should succeed");
}

fn seal(note: &Note) -> Vec<u8> {
    EncryptedRecord::seal(note, &key())
        .and_then(|record| record.to_bytes())
        .expect("seal should succeed")
}

fn content_is(store: &NoteStore, id: &str, expected: &str) -> bool {
    store.get(id).map(|n| n.content == expected).unwrap_or(false)
}

#[test]
fn test_external_newer_version_replaces_in_memory_note() {
    let dir = tempdir().expect("tempdir should succeed");
    let store = watched_store(dir.path());
    let note = store.create("hello").expect("create should succeed");

    let mut remote = note.clone();
    remote.content = "world".to_string();
    remote.updated_at = note.updated_at + chrono::Duration::seconds(1);
    let bytes = EncryptedRecord::seal(&remote, &key())
        .and_then(|record| record.to_bytes())
        .expect("seal should succeed");
    external_write(dir.path(), &note.id, &bytes);

    assert!(eventually(|| store
        .get(&note.id)
        .map(|n| n.content == "world")
        .unwrap_or(false)));
    store.close();
}

#[test]
fn test_external_older_version_is_discarded() {
    let dir = tempdir().expect("tempdir should succeed");
    let store = watched_store(dir.path());
    let note = store.create("v1").expect("create should succeed");
    let newer = store.update(&note.id, "v2").expect("update should succeed");

    let bytes = EncryptedRecord::seal(&note, &key())
        .and_then(|record| record.to_bytes())
        .expect("seal should succeed");
    external_write(dir.path(), &note.id, &bytes);

    thread::sleep(DEBOUNCE * 6);
    assert_eq!(store.get(&note.id).expect("get should succeed"), newer);
}

#[test]
fn test_external_removal_and_own_deletion() {
    let dir = tempdir().expect("tempdir should succeed");
    let store = watched_store(dir.path());
    let theirs = store.create("removed by a peer").expect("create should succeed");
    let mine = store.create("removed here").expect("create should succeed");

    store.delete(&mine.id).expect("delete should succeed");
    fs::remove_file(record_path(dir.path(), &theirs.id)).expect("remove should succeed");

    assert!(eventually(|| matches!(
        store.get(&theirs.id),
        Err(SealnoteError::NotFound(_))
    )));
    assert!(store.is_empty());
}

#[test]
fn test_two_stores_on_one_directory_converge() {
    let dir = tempdir().expect("tempdir should succeed");
    let laptop = watched_store(dir.path());
    let desktop = watched_store(dir.path());

    let note = laptop.create("shared thought").expect("create should succeed");
    assert!(eventually(|| desktop.get(&note.id).is_ok()));

    let edited = desktop
        .update(&note.id, "shared thought, refined")
        .expect("update should succeed");
    assert!(eventually(|| laptop
        .get(&note.id)
        .map(|n| n == edited)
        .unwrap_or(false)));
}

#[test]
fn test_stray_and_undecryptable_files_are_ignored() {
    let dir = tempdir().expect("tempdir should succeed");
    let store = watched_store(dir.path());
    let note = store.create("stable").expect("create should succeed");

    fs::write(dir.path().join("README.txt"), b"not a note").expect("write should succeed");
    fs::write(dir.path().join("abcdef123456.json"), b"{}").expect("write should succeed");

    let other_key = DerivedKey::from_bytes([7u8; 32]);
    let mut foreign = note.clone();
    foreign.content = "other key".to_string();
    foreign.updated_at = note.updated_at + chrono::Duration::seconds(1);
    let bytes = EncryptedRecord::seal(&foreign, &other_key)
        .and_then(|record| record.to_bytes())
        .expect("seal should succeed");
    external_write(dir.path(), &note.id, &bytes);

    thread::sleep(DEBOUNCE * 6);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&note.id).expect("get should succeed").content, "stable");
}

#[test]
fn test_lock_stops_watching() {
    let dir = tempdir().expect("tempdir should succeed");
    let store = watched_store(dir.path());
    store.lock();
    assert!(!store.is_watching());

    let other = NoteStore::open(dir.path(), StoreOptions::default().without_watcher())
        .expect("open should succeed");
    other.unlock(key()).expect("unlock should succeed");
    other.create("written while locked").expect("create should succeed");

    thread::sleep(DEBOUNCE * 4);
    assert!(store.is_empty());
}

#[test]
fn test_burst_of_external_writes_settles_on_last() {
    let dir = tempdir().expect("tempdir should succeed");
    let store = watched_store(dir.path());
    let note = store.create("v0").expect("create should succeed");

    // Five writes inside one debounce window.
    let mut remote = note.clone();
    for version in 1..=5 {
        remote.content = format!("v{}", version);
        remote.updated_at = note.updated_at + chrono::Duration::seconds(version);
        external_write(dir.path(), &note.id, &seal(&remote));
        thread::sleep(DEBOUNCE / 10);
    }

    assert!(eventually(|| content_is(&store, &note.id, "v5")));
    thread::sleep(DEBOUNCE * 4);
    assert_eq!(store.get(&note.id).expect("get should succeed"), remote);
}

#[test]
fn test_interleaved_writes_across_windows_converge() {
    let dir = tempdir().expect("tempdir should succeed");
    let store = watched_store(dir.path());
    let first = store.create("first v0").expect("create should succeed");
    let second = store.create("second v0").expect("create should succeed");

    let (mut a, mut b) = (first.clone(), second.clone());
    for round in 1..=3 {
        for step in 0..2 {
            let version = round * 2 + step;
            a.content = format!("first v{}", version);
            a.updated_at = first.updated_at + chrono::Duration::seconds(version);
            external_write(dir.path(), &first.id, &seal(&a));
            b.content = format!("second v{}", version);
            b.updated_at = second.updated_at + chrono::Duration::seconds(version);
            external_write(dir.path(), &second.id, &seal(&b));
            thread::sleep(DEBOUNCE / 5);
        }
        // Let some bursts straddle a flush.
        thread::sleep(DEBOUNCE * round as u32 / 2);
    }

    assert!(eventually(|| content_is(&store, &first.id, &a.content)
        && content_is(&store, &second.id, &b.content)));
    thread::sleep(DEBOUNCE * 4);
    assert_eq!(store.get(&first.id).expect("get should succeed"), a);
    assert_eq!(store.get(&second.id).expect("get should succeed"), b);
}

#[test]
fn test_quarantine_during_reload_keeps_note_in_memory() {
    let dir = tempdir().expect("tempdir should succeed");
    let store = watched_store(dir.path());
    let damaged = store.create("damaged on disk").expect("create should succeed");
    store.create("healthy").expect("create should succeed");

    fs::write(record_path(dir.path(), &damaged.id), b"garbage").expect("write should succeed");
    thread::sleep(DEBOUNCE * 4);

    let report = store.reload().expect("reload should succeed");
    assert_eq!(report.quarantined, 1);
    assert!(!record_path(dir.path(), &damaged.id).exists());

    // The watcher sees the move but must not treat it as a peer deletion.
    thread::sleep(DEBOUNCE * 6);
    assert_eq!(store.get(&damaged.id).expect("get should succeed"), damaged);
    assert_eq!(store.len(), 2);
}
