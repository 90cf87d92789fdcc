//! Record file operations
//!
//! High-level helpers for sealing a payload into a record file, opening a
//! record file, and re-sealing an existing record with new content.

use crate::envelope;
use crate::error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
use crate::password::PasswordReader;
use crate::payload::Payload;
use crate::record::Record;
use crate::unlock::Unlocker;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Seal a payload and write the record JSON to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn seal_file(
    payload: &Payload,
    output_path: &Path,
    password_reader: &mut dyn PasswordReader,
) -> Result<Record> {
    let password = password_reader.read_password()?;
    let record =
        envelope::encrypt(payload, &password).map_err(|e| e.with_context("encryption failed"))?;
    let json = record.to_json()?;
    write_file_secure(output_path, json.as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(output = %output_path.display(), "record written");
    Ok(record)
}

/// Read a record file and open it, allowing up to `max_attempts` passwords.
///
/// A fresh password is requested from `password_reader` after each
/// authentication failure. Any other failure ends the loop immediately.
pub fn open_file(
    input_path: &Path,
    password_reader: &mut dyn PasswordReader,
    max_attempts: u32,
) -> Result<Payload> {
    let record = read_record(input_path)?;
    let mut unlocker = Unlocker::new(record, max_attempts);

    loop {
        let password = password_reader.read_password()?;
        match unlocker.try_password(&password).cloned() {
            Ok(payload) => return Ok(payload),
            Err(e) if e.is(ErrorKind::AuthenticationFailed) && !unlocker.is_locked() => continue,
            Err(e) => return Err(e.with_context("failed to open record")),
        }
    }
}

/// Replace an existing record with a new payload under the same password
///
/// This function:
/// 1. Opens the existing record at `crypt_path` to validate the password
/// 2. Seals `payload` with a fresh salt and nonce
/// 3. Atomically writes to `crypt_path` (tempfile + fsync + rename)
///
/// The atomic write ensures that either the old file or the new file exists,
/// never a partial/corrupted file.
///
/// The password validation prevents accidental password changes.
pub fn reseal_file(
    payload: &Payload,
    crypt_path: &Path,
    password_reader: &mut dyn PasswordReader,
) -> Result<Record> {
    let existing = read_record(crypt_path)?;
    let password = password_reader.read_password()?;

    // Validate password by opening the existing record (discard payload)
    envelope::decrypt(&existing, &password)
        .map_err(|e| e.with_context("failed to open existing record"))?;

    // Great, let's re-write it (atomically).
    let crypt_dir = match crypt_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(crypt_dir)
        .map_err(|e| internal_io("failed to create tempfile", e))?;

    let record =
        envelope::encrypt(payload, &password).map_err(|e| e.with_context("failed to encrypt"))?;
    let json = record.to_json()?;

    temp_file
        .write_all(json.as_bytes())
        .map_err(|e| internal_io("failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| internal_io("failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| internal_io("failed to sync file prior to rename", e))?;

    // NamedTempFile is already created 0o600 on Unix.
    temp_file.persist(crypt_path).map_err(|e| {
        KeepsakeError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", crypt_path.display()),
            e,
        )
    })?;

    tracing::info!(output = %crypt_path.display(), "record re-sealed");
    Ok(record)
}

/// Read and parse a record JSON file.
pub fn read_record(path: &Path) -> Result<Record> {
    let json = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
    Record::from_json(&json).map_err(|e| e.with_context(format!("failed to parse {}", path.display())))
}

/// Write file with secure permissions (0o600 on Unix)
pub fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                KeepsakeError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Io,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents)
            .map_err(|e| internal_io(&format!("failed to write {}", path.display()), e))?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            KeepsakeError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

fn internal_io(msg: &str, err: io::Error) -> KeepsakeError {
    KeepsakeError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}

fn read_error(path: &Path, err: io::Error) -> KeepsakeError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    KeepsakeError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
