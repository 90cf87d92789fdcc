//! Golden test vector validation
//!
//! The vectors in testdata/golden-vectors.json were produced by the
//! JavaScript encoder tool (Node `crypto.pbkdf2` + `aes-256-gcm`) with fixed
//! salts and IVs. Sealing the same payload here must reproduce each record
//! byte-for-byte, and each record must open with its password.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use keepsake::consts::{NONCE_LEN, SALT_LEN};
use keepsake::envelope::{decrypt, encrypt_deterministic};
use keepsake::kdf::derive_key;
use keepsake::{ErrorKind, Password, Payload, Record};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoldenVector {
    comment: String,
    password: String,
    payload: Payload,
    key: String,
    salt: String,
    iv: String,
    encrypted_data: String,
}

impl GoldenVector {
    fn record(&self) -> Record {
        Record {
            salt: self.salt.clone(),
            iv: self.iv.clone(),
            encrypted_data: self.encrypted_data.clone(),
        }
    }
}

fn load_golden_vectors() -> Vec<GoldenVector> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    serde_json::from_str(json_data).expect("failed to parse golden vectors")
}

#[test]
fn test_golden_vectors_encrypt_exactly() {
    let vectors = load_golden_vectors();
    assert!(!vectors.is_empty(), "No golden vectors were loaded");

    for vector in &vectors {
        let salt: [u8; SALT_LEN] = BASE64_STANDARD
            .decode(&vector.salt)
            .expect("failed to decode salt")
            .try_into()
            .expect("salt must be 32 bytes");
        let nonce: [u8; NONCE_LEN] = BASE64_STANDARD
            .decode(&vector.iv)
            .expect("failed to decode iv")
            .try_into()
            .expect("iv must be 12 bytes");
        let password = Password::new(vector.password.clone());

        let key = derive_key(&password, &salt).unwrap();
        assert_eq!(hex::encode(key.as_bytes()), vector.key, "{}", vector.comment);

        let record = encrypt_deterministic(&vector.payload, &password, &salt, &nonce).unwrap();
        assert_eq!(record, vector.record(), "{}", vector.comment);
    }
}

#[test]
fn test_golden_vectors_decrypt() {
    for vector in load_golden_vectors() {
        let password = Password::new(vector.password.clone());
        let payload = decrypt(&vector.record(), &password).unwrap();
        assert_eq!(payload, vector.payload, "{}", vector.comment);
    }
}

#[test]
fn test_golden_vector_rejects_wrong_password() {
    let vectors = load_golden_vectors();
    let minimal = &vectors[0];
    assert_eq!(minimal.password, "CorrectHorse42!");

    let err = decrypt(&minimal.record(), &Password::new("wrongpass123!"))
        .expect_err("wrong password must not open the record");
    assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
}

#[test]
fn test_golden_vector_tamper_positions() {
    let vectors = load_golden_vectors();
    let minimal = &vectors[0];
    let password = Password::new(minimal.password.clone());
    let sealed = BASE64_STANDARD.decode(&minimal.encrypted_data).unwrap();

    // First byte, a middle byte, and the last byte of the tag.
    for position in [0, sealed.len() / 2, sealed.len() - 1] {
        let mut tampered = sealed.clone();
        tampered[position] ^= 0x01;
        let record = Record {
            encrypted_data: BASE64_STANDARD.encode(&tampered),
            ..minimal.record()
        };

        let err = decrypt(&record, &password).expect_err("tampering went undetected");
        assert_eq!(
            err.kind,
            Some(ErrorKind::AuthenticationFailed),
            "position {position}"
        );
    }
}
