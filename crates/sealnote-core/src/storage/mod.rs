//! Encrypted one-file-per-note storage.
//!
//! See [`NoteStore`] for the lifecycle and [`record`] for the file format.

pub mod record;
pub mod store;
pub mod types;

pub use record::{is_record_file, record_path, EncryptedRecord};
pub use store::NoteStore;
pub use types::{
    sort_newest_first, Category, Note, ReconcileOutcome, RefreshReport, ReloadReport,
    StoreOptions, WatchPolicy, DEFAULT_DEBOUNCE,
};
