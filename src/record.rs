//! The transport record: three independently base64-encoded fields
//!
//! ```json
//! { "salt": "...", "iv": "...", "encryptedData": "..." }
//! ```
//!
//! Each field is standard, padded base64 so the record can be embedded
//! verbatim in a JSON or JavaScript table and decoded with `atob`.

use crate::consts::{NONCE_LEN, SALT_LEN};
use crate::error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind a record id (16 base64url characters).
const ID_BYTES: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub salt: String,
    pub iv: String,
    /// Ciphertext with the 16-byte GCM tag appended.
    pub encrypted_data: String,
}

/// Raw bytes of a record after base64 decoding and length checks.
#[derive(Debug)]
pub struct RecordParts {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub sealed: Vec<u8>,
}

impl Record {
    /// Encode raw record parts.
    pub fn pack(salt: &[u8; SALT_LEN], nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Self {
        Self {
            salt: STANDARD.encode(salt),
            iv: STANDARD.encode(nonce),
            encrypted_data: STANDARD.encode(sealed),
        }
    }

    /// Decode the three fields, checking the salt and nonce lengths.
    ///
    /// The sealed field is only checked for valid base64; a sealed buffer
    /// too short to hold a tag is left to the cipher, which reports it as
    /// an authentication failure.
    pub fn unpack(&self) -> Result<RecordParts> {
        let salt = decode_field("salt", &self.salt)?;
        let nonce = decode_field("iv", &self.iv)?;
        let sealed = decode_field("encryptedData", &self.encrypted_data)?;

        let salt: [u8; SALT_LEN] = salt.try_into().map_err(|v: Vec<u8>| {
            malformed(format!(
                "salt must be {SALT_LEN} bytes, got {}",
                v.len()
            ))
        })?;
        let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|v: Vec<u8>| {
            malformed(format!("iv must be {NONCE_LEN} bytes, got {}", v.len()))
        })?;

        Ok(RecordParts {
            salt,
            nonce,
            sealed,
        })
    }

    /// Parse a record from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            KeepsakeError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::MalformedRecord,
                format!("input is not a keepsake record: {e}"),
                e,
            )
        })
    }

    /// Pretty JSON, suitable for pasting into a record table.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            KeepsakeError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::InternalInvariant,
                format!("failed to serialize record: {e}"),
                e,
            )
        })
    }
}

fn decode_field(field: &str, encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| {
        KeepsakeError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedRecord,
            format!("{field} is not valid base64: {e}"),
            e,
        )
    })
}

fn malformed(msg: String) -> KeepsakeError {
    KeepsakeError::with_kind(ErrorCategory::User, ErrorKind::MalformedRecord, msg)
}

/// Generate a fresh public identifier for a record.
///
/// 16 URL-safe characters, suitable as the fragment of a share link.
pub fn generate_id() -> Result<String> {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        KeepsakeError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Random,
            format!("OS random generator unavailable: {e}"),
            e,
        )
    })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
