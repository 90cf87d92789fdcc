//! The plaintext payload and its canonical JSON form
//!
//! Serialized compactly with keys in the order `name`, `message`, `photos`.
//! That is byte-identical to `JSON.stringify` of the same object, which is
//! what the browser viewer parses after decryption.

use crate::consts::MAX_PHOTO_BYTES;
use crate::error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    name: String,
    #[serde(default)]
    message: String,
    /// Self-describing image entries, normally `data:` URIs.
    #[serde(default)]
    photos: Vec<String>,
}

impl Payload {
    /// Build a payload, enforcing the field invariants.
    ///
    /// `name` and `message` are trimmed. The name must be non-empty after
    /// trimming and the photo entries must fit under the size ceiling.
    pub fn new(
        name: impl AsRef<str>,
        message: impl AsRef<str>,
        photos: Vec<String>,
    ) -> Result<Self> {
        let payload = Self {
            name: name.as_ref().trim().to_string(),
            message: message.as_ref().trim().to_string(),
            photos,
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Checks the invariants a sealable payload must hold.
    ///
    /// Payloads can also be built through `Deserialize`, so the sealing path
    /// runs this again rather than trusting the constructor.
    pub fn validate(&self) -> Result<()> {
        check_name(&self.name).map_err(|msg| {
            KeepsakeError::with_kind(ErrorCategory::User, ErrorKind::InvalidPayload, msg)
        })?;
        check_photo_budget(&self.photos)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn photos(&self) -> &[String] {
        &self.photos
    }

    /// Total length in bytes of all photo entries.
    pub fn photo_bytes(&self) -> usize {
        total_photo_bytes(&self.photos)
    }

    /// Canonical plaintext bytes fed to the cipher.
    pub fn to_json(&self) -> Result<Zeroizing<Vec<u8>>> {
        serde_json::to_vec(self).map(Zeroizing::new).map_err(|e| {
            KeepsakeError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Codec,
                format!("failed to serialize payload: {e}"),
                e,
            )
        })
    }

    /// Parse verified plaintext back into a payload.
    ///
    /// Only called after the tag has verified, so any failure here means a
    /// format mismatch rather than a wrong password. The size ceiling is not
    /// applied on this path.
    pub fn from_json(plaintext: &[u8]) -> Result<Self> {
        let payload: Payload = serde_json::from_slice(plaintext).map_err(|e| {
            KeepsakeError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Codec,
                format!("decrypted data is not a valid payload: {e}"),
                e,
            )
        })?;

        check_name(&payload.name).map_err(|msg| {
            KeepsakeError::with_kind(
                ErrorCategory::User,
                ErrorKind::Codec,
                format!("decrypted payload is invalid: {msg}"),
            )
        })?;

        Ok(payload)
    }
}

fn check_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("name is required");
    }
    Ok(())
}

fn total_photo_bytes(photos: &[String]) -> usize {
    photos.iter().map(String::len).sum()
}

/// Checks a photo set against the aggregate size ceiling.
///
/// Run on the sealing side before any encryption happens. A total equal to
/// `MAX_PHOTO_BYTES` is accepted.
pub fn check_photo_budget(photos: &[String]) -> Result<()> {
    let total = total_photo_bytes(photos);
    if total > MAX_PHOTO_BYTES {
        return Err(KeepsakeError::with_kind(
            ErrorCategory::User,
            ErrorKind::PayloadTooLarge,
            format!(
                "photos total {total} bytes, over the {MAX_PHOTO_BYTES} byte limit; use fewer or smaller photos"
            ),
        ));
    }
    Ok(())
}
