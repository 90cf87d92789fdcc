//! PBKDF2-HMAC-SHA256 key derivation

use crate::consts::{KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN};
use crate::error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
use crate::password::Password;
use hmac::Hmac;
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

/// A 32-byte AES-256 key derived from a password and a record's salt.
///
/// Never stored. The key bytes are wiped when the value is dropped.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    /// Wraps raw key bytes. Mostly useful for exercising the cipher directly.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive the record key from a password and salt.
///
/// Deterministic: the same password and salt always give the same key.
/// Deliberately slow (`PBKDF2_ITERATIONS` rounds); async callers should go
/// through `encrypt_async`/`decrypt_async` instead of calling this on a runtime
/// thread.
pub fn derive_key(password: &Password, salt: &[u8; SALT_LEN]) -> Result<DerivedKey> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut *key)
        .map_err(|e| {
            KeepsakeError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::KeyDerivation,
                format!("PBKDF2 key derivation failed: {e}"),
            )
        })?;
    Ok(DerivedKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let password = Password::new("CorrectHorse42!");
        let salt = [42u8; SALT_LEN];

        let k1 = derive_key(&password, &salt).unwrap();
        let k2 = derive_key(&password, &salt).unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_salt_changes_key() {
        let password = Password::new("CorrectHorse42!");

        let k1 = derive_key(&password, &[1u8; SALT_LEN]).unwrap();
        let k2 = derive_key(&password, &[2u8; SALT_LEN]).unwrap();

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_password_changes_key() {
        let salt = [7u8; SALT_LEN];

        let k1 = derive_key(&Password::new("CorrectHorse42!"), &salt).unwrap();
        let k2 = derive_key(&Password::new("wrongpass123!"), &salt).unwrap();

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_known_vector() {
        // Produced by Node's crypto.pbkdf2Sync(pw, salt, 100000, 32, 'sha256')
        let key = derive_key(&Password::new("CorrectHorse42!"), &[0x42u8; SALT_LEN]).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "c77de51c5df01d302e2ac6e20d26b4f27637f93c41d4bfd9483fcd911b39829e"
        );
    }

    #[test]
    fn test_empty_password_still_derives() {
        let key = derive_key(&Password::new(""), &[0u8; SALT_LEN]).unwrap();
        assert_ne!(key.as_bytes(), &[0u8; KEY_LEN]);
    }
}
