//! Core data types for the storage layer.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SealnoteError;

/// Closed set of note categories; `Trash` is the soft-delete state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Active,
    Archived,
    Trash,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Active => write!(f, "active"),
            Category::Archived => write!(f, "archived"),
            Category::Trash => write!(f, "trash"),
        }
    }
}

impl FromStr for Category {
    type Err = SealnoteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Category::Active),
            "archived" | "archive" => Ok(Category::Archived),
            "trash" => Ok(Category::Trash),
            other => Err(SealnoteError::InvalidInput(format!(
                "Unknown category '{}' (expected active, archived or trash)",
                other
            ))),
        }
    }
}

/// A decrypted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Short opaque identifier, also the record file stem
    pub id: String,

    /// Plaintext content (may be empty)
    pub content: String,

    pub category: Category,

    /// Category to restore to; set while the note is in the trash
    pub previous_category: Option<Category>,

    pub created_at: DateTime<Utc>,

    /// Logical timestamp used for last-writer-wins
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub(crate) fn new(id: String, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            content,
            category: Category::Active,
            previous_category: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_trashed(&self) -> bool {
        self.category == Category::Trash
    }

    /// Timestamp for the next local edit: never earlier than, or equal to, the current one.
    pub(crate) fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let floor = self.updated_at + chrono::Duration::milliseconds(1);
        if now > floor {
            now
        } else {
            floor
        }
    }
}

/// Sort newest `updated_at` first, ties broken by id ascending.
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// How the store observes its directory for external changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPolicy {
    /// No background watcher; external changes arrive only via `refresh`/`reload`
    Disabled,
    /// Watch the directory, coalescing events per file within `window`
    Debounced { window: Duration },
}

/// Store behavior injected at construction.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub watch: WatchPolicy,

    /// How long a self-initiated deletion suppresses the watcher's removal report
    pub expected_deletion_ttl: Duration,

    /// Move unreadable records into `corrupted/` during reload
    pub quarantine_corrupted: bool,
}

/// Default debounce window for watcher events.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            watch: WatchPolicy::Debounced {
                window: DEFAULT_DEBOUNCE,
            },
            expected_deletion_ttl: Duration::from_secs(10),
            quarantine_corrupted: true,
        }
    }
}

impl StoreOptions {
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.watch = WatchPolicy::Debounced { window };
        self
    }

    pub fn without_watcher(mut self) -> Self {
        self.watch = WatchPolicy::Disabled;
        self
    }

    pub fn with_quarantine(mut self, enabled: bool) -> Self {
        self.quarantine_corrupted = enabled;
        self
    }
}

/// Summary of a full reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    pub loaded: usize,
    pub failed: usize,
    pub quarantined: usize,
    pub removed: usize,
}

/// Summary of a merge-style refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub failed: usize,
}

impl RefreshReport {
    pub fn changed(&self) -> bool {
        self.added + self.updated + self.removed > 0
    }
}

/// What a single-file reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Not a record file, store locked, or nothing to do
    Ignored,
    /// File content matches this process's last write
    OwnWrite,
    /// New note from disk
    Inserted,
    /// Newer version replaced the in-memory note
    Applied,
    /// Incoming version was not newer; discarded
    Stale,
    /// File gone; in-memory note removed
    Removed,
    /// File gone because this process deleted it
    ExpectedDeletion,
    /// Unreadable or undecryptable; in-memory state untouched
    Failed,
}
