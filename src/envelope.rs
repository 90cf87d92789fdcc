//! Password-sealed records: PBKDF2-SHA256 + AES-256-GCM
//!
//! Encode: fresh salt and nonce, derive the key, seal the canonical payload
//! JSON, base64-pack the three parts. Decode runs the same steps backwards
//! and fails closed.
//!
//! Every call is self-contained: keys and passwords live on the call stack
//! and are wiped on return, so concurrent calls never share key material.

use crate::cipher;
use crate::consts::{NONCE_LEN, SALT_LEN};
use crate::error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
use crate::kdf;
use crate::password::Password;
use crate::payload::Payload;
use crate::record::Record;
use crate::unlock::UnlockPhase;
use rand::RngCore;
use rand::rngs::OsRng;

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    OsRng.try_fill_bytes(&mut buf).map_err(|e| {
        KeepsakeError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Random,
            format!("OS random generator unavailable: {e}"),
            e,
        )
    })?;
    Ok(buf)
}

/// Seal a payload under a password with a fresh random salt and nonce.
///
/// Sealing the same payload twice gives two unrelated records.
pub fn encrypt(payload: &Payload, password: &Password) -> Result<Record> {
    let salt = random_bytes::<SALT_LEN>()?;
    let nonce = random_bytes::<NONCE_LEN>()?;

    encrypt_deterministic(payload, password, &salt, &nonce)
}

/// Seal a payload using a provided salt and nonce.
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates random salt/nonce.
pub fn encrypt_deterministic(
    payload: &Payload,
    password: &Password,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Record> {
    payload.validate()?;

    let plaintext = payload.to_json()?;
    let key = kdf::derive_key(password, salt)?;
    let sealed = cipher::seal(&plaintext, &key, nonce)?;

    tracing::debug!(
        plaintext_bytes = plaintext.len(),
        photos = payload.photos().len(),
        "sealed payload"
    );

    Ok(Record::pack(salt, nonce, &sealed))
}

/// Open a record with a password.
///
/// A wrong password, a tampered record, or parts mixed from different
/// records all fail with `AuthenticationFailed`.
pub fn decrypt(record: &Record, password: &Password) -> Result<Payload> {
    decrypt_observed(record, password, &mut |_| {})
}

/// Like `decrypt`, reporting each phase of the attempt to `observer`.
///
/// The observer sees `Deriving`, then `Verifying`, then exactly one of
/// `Revealed` or `Rejected`. A record that fails to unpack goes straight to
/// `Rejected`.
pub fn decrypt_observed(
    record: &Record,
    password: &Password,
    observer: &mut dyn FnMut(UnlockPhase),
) -> Result<Payload> {
    let result = run_decrypt(record, password, observer);
    observer(match &result {
        Ok(_) => UnlockPhase::Revealed,
        Err(_) => UnlockPhase::Rejected,
    });
    result
}

fn run_decrypt(
    record: &Record,
    password: &Password,
    observer: &mut dyn FnMut(UnlockPhase),
) -> Result<Payload> {
    let parts = record.unpack()?;

    observer(UnlockPhase::Deriving);
    let key = kdf::derive_key(password, &parts.salt)?;

    observer(UnlockPhase::Verifying);
    let plaintext = cipher::open(&parts.sealed, &key, &parts.nonce)?;

    Payload::from_json(&plaintext)
}

/// `encrypt` on Tokio's blocking pool, so the KDF never stalls the runtime.
///
/// Inputs are moved into the task and dropped (wiped) there. Dropping the
/// returned future abandons the result but lets the task finish.
pub async fn encrypt_async(payload: Payload, password: Password) -> Result<Record> {
    tokio::task::spawn_blocking(move || encrypt(&payload, &password))
        .await
        .map_err(join_error)?
}

/// `decrypt` on Tokio's blocking pool.
pub async fn decrypt_async(record: Record, password: Password) -> Result<Payload> {
    tokio::task::spawn_blocking(move || decrypt(&record, &password))
        .await
        .map_err(join_error)?
}

fn join_error(e: tokio::task::JoinError) -> KeepsakeError {
    KeepsakeError::with_kind_and_source(
        ErrorCategory::Internal,
        ErrorKind::InternalInvariant,
        format!("crypto task did not complete: {e}"),
        e,
    )
}
