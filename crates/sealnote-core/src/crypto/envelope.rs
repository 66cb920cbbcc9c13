//! Authenticated encryption envelopes using XChaCha20-Poly1305.
//!
//! Envelope format: `base64(nonce (24 bytes) || ciphertext || tag (16 bytes))`.
//! The 24-byte nonce is drawn at random for every call, which is safe for
//! XChaCha20 without tracking nonce state per key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};

use super::key::DerivedKey;
use crate::error::{Result, SealnoteError};

/// Nonce length for XChaCha20-Poly1305.
pub const NONCE_LENGTH: usize = 24;

/// Poly1305 authentication tag length.
pub const TAG_LENGTH: usize = 16;

/// Encrypt `plaintext` under `key`, returning a text-safe envelope.
///
/// # Examples
///
/// ```
/// use sealnote_core::crypto::{decrypt, encrypt, DerivedKey};
///
/// let key = DerivedKey::from_bytes([7u8; 32]);
/// let envelope = encrypt(b"secret note", &key).unwrap();
/// assert_eq!(decrypt(&envelope, &key).unwrap(), b"secret note");
/// ```
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<String> {
    encrypt_bound(plaintext, &[], key)
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// # Errors
///
/// - `MalformedEnvelope` if the input is not base64 or is shorter than nonce + tag
/// - `TamperedOrWrongKey` if authentication fails
pub fn decrypt(envelope: &str, key: &DerivedKey) -> Result<Vec<u8>> {
    decrypt_bound(envelope, &[], key)
}

/// Encrypt with associated data that must be presented again to decrypt.
pub fn encrypt_bound(plaintext: &[u8], aad: &[u8], key: &DerivedKey) -> Result<String> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| SealnoteError::Crypto("Encryption failed".to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(sealed))
}

/// Decrypt an envelope produced by [`encrypt_bound`] with the same associated data.
pub fn decrypt_bound(envelope: &str, aad: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    let sealed = STANDARD
        .decode(envelope.trim().as_bytes())
        .map_err(|e| SealnoteError::MalformedEnvelope(format!("invalid base64: {}", e)))?;

    if sealed.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(SealnoteError::MalformedEnvelope(format!(
            "envelope is {} bytes, minimum is {}",
            sealed.len(),
            NONCE_LENGTH + TAG_LENGTH
        )));
    }

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let (nonce, ciphertext) = sealed.split_at(NONCE_LENGTH);

    cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| SealnoteError::TamperedOrWrongKey)
}
