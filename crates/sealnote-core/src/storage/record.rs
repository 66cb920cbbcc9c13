//! On-disk record format: one JSON file per note.
//!
//! ```json
//! {
//!   "id": "3f9c2a7b81d0",
//!   "createdAt": "2026-10-18T09:12:44.120Z",
//!   "updatedAt": "2026-10-18T09:15:02.377Z",
//!   "encryptedPayload": "<base64(nonce || ciphertext || tag)>"
//! }
//! ```
//!
//! The timestamps stay in cleartext so peers can run last-writer-wins
//! without the key, but `id`, `createdAt` and `updatedAt` are bound to the
//! ciphertext as associated data: editing any of them makes the record fail
//! authentication.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::types::{Category, Note};
use crate::crypto::{decrypt_bound, encrypt_bound, DerivedKey};
use crate::error::{Result, SealnoteError};

/// Record file extension.
pub const RECORD_EXTENSION: &str = "json";

const AAD_PREFIX: &str = "sealnote:record:v1";

static RECORD_FILE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}\.json$").expect("record file pattern is valid")
});

/// True if `path` names a note record. Temp files and dotfiles (such as the
/// shared salt) never match.
pub fn is_record_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| RECORD_FILE_PATTERN.is_match(name))
}

/// Note id encoded in a record filename.
pub fn record_id(path: &Path) -> Option<String> {
    if !is_record_file(path) {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// True if `id` can be used as a record file stem.
pub fn is_valid_id(id: &str) -> bool {
    RECORD_FILE_PATTERN.is_match(&format!("{}.{}", id, RECORD_EXTENSION))
}

pub fn record_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.{}", id, RECORD_EXTENSION))
}

/// SHA-256 of record bytes, used to recognise this process's own writes.
pub fn content_digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Serialized form of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub encrypted_payload: String,
}

/// Encrypted part of a record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteBody {
    content: String,
    category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    previous_category: Option<Category>,
}

impl EncryptedRecord {
    /// Encrypt `note` under `key`.
    pub fn seal(note: &Note, key: &DerivedKey) -> Result<Self> {
        let body = NoteBody {
            content: note.content.clone(),
            category: note.category,
            previous_category: note.previous_category,
        };
        let plaintext = zeroize::Zeroizing::new(serde_json::to_vec(&body)?);
        let aad = associated_data(&note.id, &note.created_at, &note.updated_at);

        Ok(Self {
            id: note.id.clone(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            encrypted_payload: encrypt_bound(&plaintext, &aad, key)?,
        })
    }

    /// Decrypt into a [`Note`].
    ///
    /// # Errors
    ///
    /// - `Validation` if the id is unusable or `updatedAt` precedes `createdAt`
    /// - `TamperedOrWrongKey` / `MalformedEnvelope` from the envelope
    /// - `Json` if the decrypted body is not a note body
    pub fn open(&self, key: &DerivedKey) -> Result<Note> {
        if !is_valid_id(&self.id) {
            return Err(SealnoteError::Validation(format!(
                "Invalid record id '{}'",
                self.id
            )));
        }
        if self.updated_at < self.created_at {
            return Err(SealnoteError::Validation(format!(
                "Record {} was updated before it was created",
                self.id
            )));
        }

        let aad = associated_data(&self.id, &self.created_at, &self.updated_at);
        let plaintext = zeroize::Zeroizing::new(decrypt_bound(&self.encrypted_payload, &aad, key)?);
        let body: NoteBody = serde_json::from_slice(&plaintext)?;

        Ok(Note {
            id: self.id.clone(),
            content: body.content,
            category: body.category,
            previous_category: body.previous_category,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// Decrypt and check the record belongs in the file named `expected_id`.
    pub fn open_as(&self, expected_id: &str, key: &DerivedKey) -> Result<Note> {
        if self.id != expected_id {
            return Err(SealnoteError::Validation(format!(
                "Record id '{}' does not match file name '{}'",
                self.id, expected_id
            )));
        }
        self.open(key)
    }

    /// Same record, payload re-encrypted from `old` to `new`. Timestamps are kept.
    pub fn reseal(&self, old: &DerivedKey, new: &DerivedKey) -> Result<Self> {
        let note = self.open(old)?;
        Self::seal(&note, new)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn associated_data(id: &str, created_at: &DateTime<Utc>, updated_at: &DateTime<Utc>) -> Vec<u8> {
    format!(
        "{}|{}|{}|{}",
        AAD_PREFIX,
        id,
        created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
        updated_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes([byte; 32])
    }

    fn note() -> Note {
        let mut note = Note::new("3f9c2a7b81d0".to_string(), "hello".to_string(), Utc::now());
        note.category = Category::Trash;
        note.previous_category = Some(Category::Archived);
        note
    }

    #[test]
    fn test_record_file_filter() {
        assert!(is_record_file(Path::new("/notes/3f9c2a7b81d0.json")));
        assert!(is_record_file(Path::new("a_b-c.json")));
        assert!(!is_record_file(Path::new(".sealnote-salt.json")));
        assert!(!is_record_file(Path::new(".abc.json.123.tmp")));
        assert!(!is_record_file(Path::new("abc.json.tmp")));
        assert!(!is_record_file(Path::new("abc.txt")));
        assert!(!is_record_file(Path::new("a b.json")));
        assert_eq!(
            record_id(Path::new("/notes/3f9c2a7b81d0.json")).as_deref(),
            Some("3f9c2a7b81d0")
        );
        assert_eq!(record_id(Path::new("/notes/.hidden.json")), None);
    }

    #[test]
    fn test_seal_open_preserves_fields_through_json() {
        let original = note();
        let record = EncryptedRecord::seal(&original, &key(1)).unwrap();
        let bytes = record.to_bytes().unwrap();

        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"encryptedPayload\""));
        assert!(text.contains("\"updatedAt\""));
        assert!(!text.contains("hello"));

        let parsed = EncryptedRecord::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.open(&key(1)).unwrap(), original);
    }

    #[test]
    fn test_timestamp_tampering_fails_authentication() {
        let record = EncryptedRecord::seal(&note(), &key(1)).unwrap();
        let mut tampered = record.clone();
        tampered.updated_at = tampered.updated_at + chrono::Duration::seconds(5);

        assert!(matches!(
            tampered.open(&key(1)),
            Err(SealnoteError::TamperedOrWrongKey)
        ));
    }

    #[test]
    fn test_wrong_key_and_mismatched_name() {
        let record = EncryptedRecord::seal(&note(), &key(1)).unwrap();
        assert!(matches!(
            record.open(&key(2)),
            Err(SealnoteError::TamperedOrWrongKey)
        ));
        assert!(matches!(
            record.open_as("other", &key(1)),
            Err(SealnoteError::Validation(_))
        ));
    }

    #[test]
    fn test_reseal_keeps_timestamps() {
        let record = EncryptedRecord::seal(&note(), &key(1)).unwrap();
        let resealed = record.reseal(&key(1), &key(2)).unwrap();

        assert_eq!(resealed.updated_at, record.updated_at);
        assert_ne!(resealed.encrypted_payload, record.encrypted_payload);
        assert_eq!(resealed.open(&key(2)).unwrap().content, "hello");
        assert!(record.reseal(&key(3), &key(2)).is_err());
    }
}
