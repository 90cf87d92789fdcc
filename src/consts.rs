//! Fixed protocol constants
//!
//! Every value here must match bit-for-bit between the tool that seals a
//! record and the viewer that opens it. Records carry no version field, so
//! changing any of these makes previously sealed records unreadable.

/// PBKDF2-HMAC-SHA256 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Length of the derived AES-256 key in bytes
pub const KEY_LEN: usize = 32;

/// Length of the per-record salt in bytes
pub const SALT_LEN: usize = 32;

/// Length of the AES-GCM nonce (IV) in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag appended to the ciphertext
pub const TAG_LEN: usize = 16;

/// Ceiling on the aggregate length of all photo entries (10 MiB)
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Minimum password length, in characters, accepted by the strength policy
pub const MIN_PASSWORD_CHARS: usize = 12;

/// Default number of unlock attempts a viewer offers before locking out
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
