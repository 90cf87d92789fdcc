//! AES-256-GCM sealing and opening
//!
//! The sealed layout is:
//! - ciphertext: same length as the plaintext
//! - tag: 16 bytes, appended
//!
//! This is what WebCrypto's `AES-GCM` decrypt expects, and what Node's
//! `createCipheriv` output plus `getAuthTag()` concatenates to.

use crate::consts::{NONCE_LEN, TAG_LEN};
use crate::error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
use crate::kdf::DerivedKey;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use zeroize::Zeroizing;

/// Encrypt `plaintext`, returning ciphertext with the tag appended.
///
/// The caller must never reuse a nonce with the same key.
pub fn seal(plaintext: &[u8], key: &DerivedKey, nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| {
            KeepsakeError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::Cipher,
                format!("encryption failed: {e}"),
            )
        })
}

/// Verify and decrypt a sealed buffer.
///
/// Every failure, including input too short to hold a tag, yields the same
/// `AuthenticationFailed` error. No plaintext is released unless the tag
/// verifies.
pub fn open(
    sealed: &[u8],
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < TAG_LEN {
        return Err(KeepsakeError::authentication_failed());
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| KeepsakeError::authentication_failed())?;

    Ok(Zeroizing::new(plaintext))
}
