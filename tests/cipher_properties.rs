//! Property tests for the AEAD layer
//!
//! These run against raw keys so the KDF cost does not multiply across cases.

use keepsake::ErrorKind;
use keepsake::cipher::{open, seal};
use keepsake::consts::{KEY_LEN, NONCE_LEN, TAG_LEN};
use keepsake::kdf::DerivedKey;
use proptest::prelude::*;

proptest! {
    #[test]
    fn sealed_opens_to_original(
        key in any::<[u8; KEY_LEN]>(),
        nonce in any::<[u8; NONCE_LEN]>(),
        plaintext in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let key = DerivedKey::from_bytes(key);
        let sealed = seal(&plaintext, &key, &nonce).unwrap();
        prop_assert_eq!(sealed.len(), plaintext.len() + TAG_LEN);

        let opened = open(&sealed, &key, &nonce).unwrap();
        prop_assert_eq!(&opened[..], &plaintext[..]);
    }

    #[test]
    fn any_bit_flip_fails_closed(
        key in any::<[u8; KEY_LEN]>(),
        nonce in any::<[u8; NONCE_LEN]>(),
        plaintext in proptest::collection::vec(any::<u8>(), 0..256),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let key = DerivedKey::from_bytes(key);
        let mut sealed = seal(&plaintext, &key, &nonce).unwrap();
        let idx = position.index(sealed.len());
        sealed[idx] ^= 1 << bit;

        let err = open(&sealed, &key, &nonce).unwrap_err();
        prop_assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn other_key_fails_closed(
        key in any::<[u8; KEY_LEN]>(),
        other in any::<[u8; KEY_LEN]>(),
        nonce in any::<[u8; NONCE_LEN]>(),
        plaintext in proptest::collection::vec(any::<u8>(), 0..128),
    ) {
        prop_assume!(key != other);
        let sealed = seal(&plaintext, &DerivedKey::from_bytes(key), &nonce).unwrap();

        let err = open(&sealed, &DerivedKey::from_bytes(other), &nonce).unwrap_err();
        prop_assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }
}
