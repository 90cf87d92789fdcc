//! Keepsake - password-sealed messages using PBKDF2-SHA256 and AES-256-GCM
//!
//! A payload (name, message, photos) is sealed into a record of three base64
//! fields that a browser viewer can open with the same password.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod consts;
pub mod envelope;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod password;
pub mod payload;
pub mod photo;
pub mod record;
pub mod unlock;

pub use envelope::{decrypt, decrypt_async, encrypt, encrypt_async};
pub use error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
pub use password::{Password, check_password_strength};
pub use payload::{Payload, check_photo_budget};
pub use record::Record;
pub use unlock::{UnlockPhase, Unlocker};
