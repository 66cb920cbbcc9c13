//! The encrypted note store.
//!
//! One JSON record per note lives in the notes directory; all notes are
//! decrypted into an in-memory map on unlock and every mutation writes
//! through to disk.
//!
//! ## Locking
//!
//! - `notes` (`RwLock`) guards the map. Crypto and disk work happen outside it.
//! - `own_writes` (`Mutex`) holds the digest of this process's last write per
//!   record. It is held across "atomic write + digest update" and across the
//!   watcher's "read file + digest compare", so an own write is never
//!   mistaken for an external one.
//! - When both are needed, `own_writes` is taken before `notes`.
//! - `scan_touched` records ids the watcher changed while a reload or refresh
//!   was scanning; it is only taken while `notes` is held.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::record::{content_digest, record_id, record_path, EncryptedRecord};
use super::types::{
    sort_newest_first, Category, Note, ReconcileOutcome, RefreshReport, ReloadReport,
    StoreOptions, WatchPolicy,
};
use crate::crypto::DerivedKey;
use crate::error::{Result, SealnoteError};
use crate::fs::{quarantine, write_atomic};
use crate::watcher::{watch_directory, Reconcile, WatcherHandle};

/// Length of generated note ids (hex characters).
const ID_LENGTH: usize = 12;

/// Handle to one notes directory.
///
/// Lifecycle: [`open`](Self::open) → [`unlock`](Self::unlock) → operations →
/// [`lock`](Self::lock) / [`close`](Self::close). Any number of stores may
/// exist in one process.
pub struct NoteStore {
    inner: Arc<StoreInner>,
    watcher: Mutex<Option<WatcherHandle>>,
}

pub(crate) struct StoreInner {
    dir: RwLock<PathBuf>,
    options: StoreOptions,
    key: RwLock<Option<DerivedKey>>,
    notes: RwLock<HashMap<String, Note>>,
    own_writes: Mutex<HashMap<String, [u8; 32]>>,
    expected_deletions: Mutex<HashMap<String, Instant>>,
    scan_touched: Mutex<Option<HashSet<String>>>,
}

/// Result of reading every record file once.
struct Scan {
    started: DateTime<Utc>,
    loaded: Vec<Note>,
    failed: Vec<ScanFailure>,
}

struct ScanFailure {
    id: String,
    path: PathBuf,
    error: SealnoteError,
}

impl NoteStore {
    /// Open a store on `dir`, creating the directory. The store starts locked.
    pub fn open(dir: impl Into<PathBuf>, options: StoreOptions) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            inner: Arc::new(StoreInner {
                dir: RwLock::new(dir),
                options,
                key: RwLock::new(None),
                notes: RwLock::new(HashMap::new()),
                own_writes: Mutex::new(HashMap::new()),
                expected_deletions: Mutex::new(HashMap::new()),
                scan_touched: Mutex::new(None),
            }),
            watcher: Mutex::new(None),
        })
    }

    pub fn dir(&self) -> PathBuf {
        self.inner.dir()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    pub fn is_unlocked(&self) -> bool {
        self.inner.key.read().is_some()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.lock().is_some()
    }

    /// Install `key`, start the watcher and load every record.
    ///
    /// The watcher runs before the scan so changes landing mid-scan are
    /// reconciled too. Unlocking an already unlocked store replaces the key
    /// and reloads.
    pub fn unlock(&self, key: DerivedKey) -> Result<ReloadReport> {
        self.stop_watcher();
        *self.inner.key.write() = Some(key);

        if let Err(err) = self.start_watcher() {
            self.inner.clear();
            return Err(err);
        }
        match self.inner.reload() {
            Ok(report) => Ok(report),
            Err(err) => {
                self.stop_watcher();
                self.inner.clear();
                Err(err)
            }
        }
    }

    /// Stop the watcher, drop the key and forget every decrypted note.
    pub fn lock(&self) {
        self.stop_watcher();
        self.inner.clear();
        debug!(dir = %self.inner.dir().display(), "store locked");
    }

    pub fn close(self) {
        self.lock();
    }

    /// Point the store at another directory.
    ///
    /// The watcher is stopped first; when the store is unlocked the new
    /// directory is loaded and watched. Returns the reload report in that case.
    pub fn relocate(&self, new_dir: impl Into<PathBuf>) -> Result<Option<ReloadReport>> {
        let new_dir = new_dir.into();
        fs::create_dir_all(&new_dir)?;

        self.stop_watcher();
        *self.inner.dir.write() = new_dir;
        self.inner.notes.write().clear();
        self.inner.own_writes.lock().clear();
        self.inner.expected_deletions.lock().clear();

        if !self.is_unlocked() {
            return Ok(None);
        }
        self.start_watcher()?;
        Ok(Some(self.inner.reload()?))
    }

    /// Create a new active note.
    ///
    /// If the record cannot be written the note is removed from memory again.
    pub fn create(&self, content: &str) -> Result<Note> {
        let key = self.inner.key()?;
        let dir = self.inner.dir();

        let note = loop {
            let id = generate_id();
            if record_path(&dir, &id).exists() {
                continue;
            }
            let mut notes = self.inner.notes.write();
            if notes.contains_key(&id) {
                continue;
            }
            let note = Note::new(id, content.to_string(), Utc::now());
            notes.insert(note.id.clone(), note.clone());
            break note;
        };

        if let Err(err) = self.inner.persist(&note, &key) {
            self.inner.notes.write().remove(&note.id);
            return Err(err);
        }
        debug!(id = %note.id, "created note");
        Ok(note)
    }

    pub fn get(&self, id: &str) -> Result<Note> {
        self.inner.ensure_unlocked()?;
        self.inner
            .notes
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| SealnoteError::NotFound(id.to_string()))
    }

    /// Replace the content of a note.
    ///
    /// Memory is updated before the write and is not rolled back if the
    /// write fails; the error is returned and the next reload or refresh
    /// brings memory and disk back in line.
    pub fn update(&self, id: &str, content: &str) -> Result<Note> {
        self.mutate(id, |note| {
            note.content = content.to_string();
            Ok(true)
        })
    }

    /// Move a note to the trash, remembering its category.
    pub fn trash(&self, id: &str) -> Result<Note> {
        self.mutate(id, |note| {
            if note.is_trashed() {
                return Ok(false);
            }
            note.previous_category = Some(note.category);
            note.category = Category::Trash;
            Ok(true)
        })
    }

    /// Return a trashed note to its previous category, or an archived note to active.
    pub fn restore(&self, id: &str) -> Result<Note> {
        self.mutate(id, |note| match note.category {
            Category::Trash => {
                note.category = note.previous_category.take().unwrap_or_default();
                Ok(true)
            }
            Category::Archived => {
                note.category = Category::Active;
                Ok(true)
            }
            Category::Active => Err(SealnoteError::Validation(format!(
                "Note {} is already active",
                note.id
            ))),
        })
    }

    pub fn archive(&self, id: &str) -> Result<Note> {
        self.mutate(id, |note| match note.category {
            Category::Archived => Ok(false),
            Category::Trash => Err(SealnoteError::Validation(format!(
                "Note {} is in the trash; restore it first",
                note.id
            ))),
            Category::Active => {
                note.category = Category::Archived;
                Ok(true)
            }
        })
    }

    /// Remove a note from memory and disk.
    ///
    /// The id is registered as an expected deletion so the watcher does not
    /// report the removal as external. If the file cannot be removed the note
    /// is put back.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.inner.ensure_unlocked()?;
        let removed = self
            .inner
            .notes
            .write()
            .remove(id)
            .ok_or_else(|| SealnoteError::NotFound(id.to_string()))?;

        self.inner.expect_deletion(id);
        if let Err(err) = self.inner.remove_record(id) {
            self.inner.expected_deletions.lock().remove(id);
            self.inner
                .notes
                .write()
                .entry(id.to_string())
                .or_insert(removed);
            return Err(err);
        }
        debug!(id, "deleted note");
        Ok(())
    }

    /// Permanently delete a note that is already in the trash.
    pub fn purge(&self, id: &str) -> Result<()> {
        let note = self.get(id)?;
        if !note.is_trashed() {
            return Err(SealnoteError::Validation(format!(
                "Note {} is not in the trash",
                id
            )));
        }
        self.delete(id)
    }

    /// Purge every trashed note; returns how many were removed.
    pub fn empty_trash(&self) -> Result<usize> {
        let trashed = self.list_category(Category::Trash)?;
        for note in &trashed {
            self.delete(&note.id)?;
        }
        Ok(trashed.len())
    }

    /// Case-insensitive substring search over content, newest first.
    /// An empty query returns every note.
    pub fn search(&self, query: &str) -> Result<Vec<Note>> {
        let needle = query.to_lowercase();
        self.collect(|note| needle.is_empty() || note.content.to_lowercase().contains(&needle))
    }

    /// Every note, newest first.
    pub fn list(&self) -> Result<Vec<Note>> {
        self.collect(|_| true)
    }

    pub fn list_category(&self, category: Category) -> Result<Vec<Note>> {
        self.collect(|note| note.category == category)
    }

    pub fn len(&self) -> usize {
        self.inner.notes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reload the whole directory; memory mirrors disk afterwards.
    pub fn reload(&self) -> Result<ReloadReport> {
        self.inner.reload()
    }

    /// Merge the directory into memory with last-writer-wins.
    pub fn refresh(&self) -> Result<RefreshReport> {
        self.inner.refresh()
    }

    /// Reconcile one record file immediately, without debouncing.
    pub fn reconcile_path(&self, path: &Path) -> ReconcileOutcome {
        self.inner.reconcile_path(path)
    }

    /// Re-encrypt every record in place from `old` to `new`.
    ///
    /// Works on a locked store. Records that already open under `new` are
    /// left alone, so an interrupted run can be repeated. Records readable by
    /// neither key are logged and skipped. Returns the number rewritten.
    pub fn reencrypt_all(&self, old: &DerivedKey, new: &DerivedKey) -> Result<usize> {
        self.inner.reencrypt_all(old, new)
    }

    fn mutate<F>(&self, id: &str, change: F) -> Result<Note>
    where
        F: FnOnce(&mut Note) -> Result<bool>,
    {
        let key = self.inner.key()?;
        let note = {
            let mut notes = self.inner.notes.write();
            let current = notes
                .get_mut(id)
                .ok_or_else(|| SealnoteError::NotFound(id.to_string()))?;

            let mut draft = current.clone();
            if !change(&mut draft)? {
                return Ok(draft);
            }
            draft.updated_at = current.next_timestamp(Utc::now());
            *current = draft.clone();
            draft
        };

        self.inner.persist(&note, &key)?;
        Ok(note)
    }

    fn collect<P>(&self, predicate: P) -> Result<Vec<Note>>
    where
        P: Fn(&Note) -> bool,
    {
        self.inner.ensure_unlocked()?;
        let mut notes: Vec<Note> = self
            .inner
            .notes
            .read()
            .values()
            .filter(|note| predicate(note))
            .cloned()
            .collect();
        sort_newest_first(&mut notes);
        Ok(notes)
    }

    fn start_watcher(&self) -> Result<()> {
        let WatchPolicy::Debounced { window } = self.inner.options.watch else {
            return Ok(());
        };
        let reconciler: Arc<dyn Reconcile> = self.inner.clone();
        let handle = watch_directory(&self.inner.dir(), window, reconciler)?;
        *self.watcher.lock() = Some(handle);
        Ok(())
    }

    fn stop_watcher(&self) {
        let handle = self.watcher.lock().take();
        if let Some(handle) = handle {
            handle.stop();
        }
    }
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteStore")
            .field("dir", &self.inner.dir())
            .field("unlocked", &self.is_unlocked())
            .field("notes", &self.len())
            .finish()
    }
}

impl StoreInner {
    fn dir(&self) -> PathBuf {
        self.dir.read().clone()
    }

    fn key(&self) -> Result<DerivedKey> {
        self.key.read().clone().ok_or(SealnoteError::Locked)
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.key.read().is_some() {
            Ok(())
        } else {
            Err(SealnoteError::Locked)
        }
    }

    fn clear(&self) {
        *self.key.write() = None;
        self.notes.write().clear();
        self.own_writes.lock().clear();
        self.expected_deletions.lock().clear();
    }

    /// Encrypt and write `note`, unless memory already holds a newer version
    /// or the note was deleted meanwhile.
    fn persist(&self, note: &Note, key: &DerivedKey) -> Result<()> {
        let bytes = EncryptedRecord::seal(note, key)?.to_bytes()?;
        let path = record_path(&self.dir(), &note.id);

        let mut own_writes = self.own_writes.lock();
        let superseded = match self.notes.read().get(&note.id) {
            Some(current) => current.updated_at > note.updated_at,
            None => true,
        };
        if superseded {
            debug!(id = %note.id, "skipping write of superseded version");
            return Ok(());
        }
        write_atomic(&path, &bytes)?;
        own_writes.insert(note.id.clone(), content_digest(&bytes));
        Ok(())
    }

    fn write_record(&self, id: &str, record: &EncryptedRecord) -> Result<()> {
        let bytes = record.to_bytes()?;
        let path = record_path(&self.dir(), id);

        let mut own_writes = self.own_writes.lock();
        write_atomic(&path, &bytes)?;
        own_writes.insert(id.to_string(), content_digest(&bytes));
        Ok(())
    }

    fn remove_record(&self, id: &str) -> Result<()> {
        let path = record_path(&self.dir(), id);

        let mut own_writes = self.own_writes.lock();
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        own_writes.remove(id);
        Ok(())
    }

    fn expect_deletion(&self, id: &str) {
        let deadline = Instant::now() + self.options.expected_deletion_ttl;
        self.expected_deletions
            .lock()
            .insert(id.to_string(), deadline);
    }

    fn is_expected_deletion(&self, id: &str) -> bool {
        self.expected_deletions
            .lock()
            .get(id)
            .is_some_and(|deadline| *deadline > Instant::now())
    }

    /// Consume a pending expected deletion; expired entries are pruned.
    fn take_expected_deletion(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut expected = self.expected_deletions.lock();
        expected.retain(|_, deadline| *deadline > now);
        expected.remove(id).is_some()
    }

    fn begin_scan_tracking(&self) {
        *self.scan_touched.lock() = Some(HashSet::new());
    }

    /// Stop tracking and return the ids the watcher changed during the scan.
    fn finish_scan_tracking(&self) -> HashSet<String> {
        self.scan_touched.lock().take().unwrap_or_default()
    }

    /// Call with `notes` write-locked, after changing `id` in memory.
    fn mark_reconciled(&self, id: &str) {
        if let Some(touched) = self.scan_touched.lock().as_mut() {
            touched.insert(id.to_string());
        }
    }

    /// Scan `dir` while recording watcher changes that race the scan.
    fn tracked_scan(&self, dir: &Path, key: &DerivedKey) -> Result<Scan> {
        self.begin_scan_tracking();
        self.scan(dir, key).inspect_err(|_| {
            self.finish_scan_tracking();
        })
    }

    fn scan(&self, dir: &Path, key: &DerivedKey) -> Result<Scan> {
        let mut scan = Scan {
            started: Utc::now(),
            loaded: Vec::new(),
            failed: Vec::new(),
        };

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(id) = record_id(&path) else {
                continue;
            };
            if !entry.file_type().map(|kind| kind.is_file()).unwrap_or(false) {
                continue;
            }

            match read_note(&path, &id, key) {
                Ok(note) => scan.loaded.push(note),
                Err(error) => scan.failed.push(ScanFailure { id, path, error }),
            }
        }
        Ok(scan)
    }

    fn reload(&self) -> Result<ReloadReport> {
        let key = self.key()?;
        let dir = self.dir();
        let scan = self.tracked_scan(&dir, &key)?;
        Ok(self.apply_reload(&dir, scan))
    }

    /// Replace the in-memory set with `scan`, keeping anything written
    /// locally or by the watcher after the scan began.
    fn apply_reload(&self, dir: &Path, scan: Scan) -> ReloadReport {
        let mut report = ReloadReport {
            loaded: scan.loaded.len(),
            failed: scan.failed.len(),
            ..ReloadReport::default()
        };

        // A failure to authenticate only counts as corruption when the key
        // demonstrably works on some other record.
        let key_proven = !scan.loaded.is_empty();
        for failure in &scan.failed {
            warn!(id = %failure.id, error = %failure.error, "skipping unreadable record");
            if self.options.quarantine_corrupted && should_quarantine(&failure.error, key_proven) {
                // Moving the file away must not read as an external removal.
                self.expect_deletion(&failure.id);
                match quarantine(&failure.path) {
                    Ok(target) => {
                        report.quarantined += 1;
                        warn!(id = %failure.id, target = %target.display(), "quarantined record");
                    }
                    Err(err) => {
                        self.expected_deletions.lock().remove(&failure.id);
                        warn!(id = %failure.id, error = %err, "could not quarantine record")
                    }
                }
            }
        }

        let mut notes = self.notes.write();
        let touched = self.finish_scan_tracking();
        let mut next: HashMap<String, Note> = HashMap::with_capacity(scan.loaded.len());
        for incoming in scan.loaded {
            let current = notes.get(&incoming.id);
            if current.is_none() && self.is_expected_deletion(&incoming.id) {
                debug!(id = %incoming.id, "ignoring record deleted during reload");
                continue;
            }
            // The watcher saw a later state of this file than the scan did.
            if touched.contains(&incoming.id) {
                if let Some(current) = current {
                    let note = if current.updated_at >= incoming.updated_at {
                        current.clone()
                    } else {
                        incoming
                    };
                    next.insert(note.id.clone(), note);
                }
                continue;
            }
            let keep_local = current.is_some_and(|current| {
                current.updated_at >= scan.started && current.updated_at > incoming.updated_at
            });
            let note = match current {
                Some(current) if keep_local => current.clone(),
                _ => incoming,
            };
            next.insert(note.id.clone(), note);
        }
        for failure in &scan.failed {
            if let Some(previous) = notes.get(&failure.id) {
                next.insert(failure.id.clone(), previous.clone());
            }
        }
        // Notes written locally or by the watcher while the scan ran are not
        // on its listing.
        for (id, note) in notes.iter() {
            if !next.contains_key(id) && (note.updated_at >= scan.started || touched.contains(id)) {
                next.insert(id.clone(), note.clone());
            }
        }

        report.removed = notes.keys().filter(|id| !next.contains_key(*id)).count();
        *notes = next;
        drop(notes);

        info!(
            dir = %dir.display(),
            loaded = report.loaded,
            failed = report.failed,
            quarantined = report.quarantined,
            removed = report.removed,
            "reloaded notes"
        );
        report
    }

    fn refresh(&self) -> Result<RefreshReport> {
        let key = self.key()?;
        let dir = self.dir();
        let scan = self.tracked_scan(&dir, &key)?;

        let mut report = RefreshReport {
            failed: scan.failed.len(),
            ..RefreshReport::default()
        };
        for failure in &scan.failed {
            warn!(id = %failure.id, error = %failure.error, "skipping unreadable record");
        }

        let on_disk: HashSet<String> = scan
            .loaded
            .iter()
            .map(|note| note.id.clone())
            .chain(scan.failed.iter().map(|failure| failure.id.clone()))
            .collect();

        let mut notes = self.notes.write();
        let touched = self.finish_scan_tracking();
        for incoming in scan.loaded {
            match notes.get(&incoming.id) {
                _ if touched.contains(&incoming.id) => {
                    debug!(id = %incoming.id, "watcher already applied a later state");
                    report.unchanged += 1;
                }
                None if self.is_expected_deletion(&incoming.id) => {
                    debug!(id = %incoming.id, "ignoring record deleted during refresh");
                }
                None => {
                    notes.insert(incoming.id.clone(), incoming);
                    report.added += 1;
                }
                Some(current) if incoming.updated_at > current.updated_at => {
                    notes.insert(incoming.id.clone(), incoming);
                    report.updated += 1;
                }
                Some(_) => report.unchanged += 1,
            }
        }

        let gone: Vec<String> = notes
            .iter()
            .filter(|(id, note)| {
                !on_disk.contains(*id) && note.updated_at < scan.started && !touched.contains(*id)
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in &gone {
            notes.remove(id);
            warn!(id = %id, "note removed externally");
        }
        report.removed = gone.len();
        drop(notes);

        info!(
            added = report.added,
            updated = report.updated,
            unchanged = report.unchanged,
            removed = report.removed,
            failed = report.failed,
            "refreshed notes"
        );
        Ok(report)
    }

    fn reconcile_path(&self, path: &Path) -> ReconcileOutcome {
        let Some(id) = record_id(path) else {
            return ReconcileOutcome::Ignored;
        };
        let Some(key) = self.key.read().clone() else {
            return ReconcileOutcome::Ignored;
        };

        let bytes = {
            let own_writes = self.own_writes.lock();
            match fs::read(path) {
                Ok(bytes) => {
                    if own_writes.get(&id) == Some(&content_digest(&bytes)) {
                        debug!(id = %id, "skipping own write");
                        return ReconcileOutcome::OwnWrite;
                    }
                    bytes
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    drop(own_writes);
                    return self.reconcile_removal(&id);
                }
                Err(err) => {
                    warn!(id = %id, error = %err, "could not read changed record");
                    return ReconcileOutcome::Failed;
                }
            }
        };

        let incoming = match EncryptedRecord::from_bytes(&bytes).and_then(|record| record.open_as(&id, &key)) {
            Ok(note) => note,
            Err(err) => {
                warn!(id = %id, error = %err, "skipping unreadable record");
                return ReconcileOutcome::Failed;
            }
        };

        let mut notes = self.notes.write();
        match notes.get(&id) {
            Some(current) if incoming.updated_at <= current.updated_at => {
                debug!(id = %id, "discarding stale version");
                ReconcileOutcome::Stale
            }
            Some(_) => {
                self.mark_reconciled(&id);
                notes.insert(id, incoming);
                ReconcileOutcome::Applied
            }
            None => {
                self.mark_reconciled(&id);
                notes.insert(id, incoming);
                ReconcileOutcome::Inserted
            }
        }
    }

    fn reconcile_removal(&self, id: &str) -> ReconcileOutcome {
        if self.take_expected_deletion(id) {
            return ReconcileOutcome::ExpectedDeletion;
        }
        let mut notes = self.notes.write();
        match notes.remove(id) {
            Some(_) => {
                self.mark_reconciled(id);
                warn!(id, "note removed externally");
                ReconcileOutcome::Removed
            }
            None => ReconcileOutcome::Ignored,
        }
    }

    fn reencrypt_all(&self, old: &DerivedKey, new: &DerivedKey) -> Result<usize> {
        let dir = self.dir();
        let mut rewritten = 0;

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(id) = record_id(&path) else {
                continue;
            };
            let record = match fs::read(&path)
                .map_err(SealnoteError::from)
                .and_then(|bytes| EncryptedRecord::from_bytes(&bytes))
            {
                Ok(record) => record,
                Err(err) => {
                    warn!(id = %id, error = %err, "skipping unreadable record during re-encryption");
                    continue;
                }
            };

            match record.reseal(old, new) {
                Ok(resealed) => {
                    self.write_record(&id, &resealed)?;
                    rewritten += 1;
                }
                Err(SealnoteError::TamperedOrWrongKey) if record.open(new).is_ok() => {
                    debug!(id = %id, "record already uses the new key");
                }
                Err(err) => {
                    warn!(id = %id, error = %err, "skipping record that does not open under the old key");
                }
            }
        }

        info!(dir = %dir.display(), rewritten, "re-encrypted records");
        Ok(rewritten)
    }
}

impl Reconcile for StoreInner {
    fn reconcile(&self, path: &Path) {
        let outcome = self.reconcile_path(path);
        debug!(path = %path.display(), ?outcome, "reconciled change");
    }
}

fn read_note(path: &Path, id: &str, key: &DerivedKey) -> Result<Note> {
    let bytes = fs::read(path)?;
    EncryptedRecord::from_bytes(&bytes)?.open_as(id, key)
}

fn should_quarantine(error: &SealnoteError, key_proven: bool) -> bool {
    match error {
        SealnoteError::TamperedOrWrongKey => key_proven,
        other => other.is_record_level(),
    }
}

fn generate_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LENGTH);
    id
}
