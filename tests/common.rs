#![allow(dead_code)]
extern crate didcomm_envelope;

pub use didcomm_envelope::{crypto::KeyAlg, Error, KeyIdentity};
use serde_json::Value;
use utilities::{get_keypair_set, KeyPairSet, ALICE_KID, BOB_KID, CAROL_KID};

pub const MESSAGE: &[u8] = b"Expecto patronum";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fixture X25519 identities with secret keys.
pub struct Parties {
    pub alice: KeyIdentity,
    pub bob: KeyIdentity,
    pub carol: KeyIdentity,
}

pub fn parties() -> Parties {
    let KeyPairSet {
        alice_private,
        bobs_private,
        carols_private,
        ..
    } = get_keypair_set();
    let identity = |secret: &[u8], kid: &str| {
        KeyIdentity::from_secret_bytes(KeyAlg::X25519, secret, kid).expect("fixture key")
    };
    Parties {
        alice: identity(&alice_private[..], ALICE_KID),
        bob: identity(&bobs_private[..], BOB_KID),
        carol: identity(&carols_private[..], CAROL_KID),
    }
}

/// Decoded protected header of a serialized envelope.
pub fn protected_header(envelope: &[u8]) -> Value {
    let jwe: Value = serde_json::from_slice(envelope).unwrap();
    let encoded = jwe["protected"].as_str().unwrap();
    serde_json::from_slice(&base64_url::decode(encoded).unwrap()).unwrap()
}

/// Flips the lowest bit of the first byte of a base64url encoded top-level member.
pub fn flip_bit(envelope: &[u8], member: &str) -> Vec<u8> {
    let mut jwe: Value = serde_json::from_slice(envelope).unwrap();
    let mut bytes = base64_url::decode(jwe[member].as_str().unwrap()).unwrap();
    bytes[0] ^= 0x01;
    jwe[member] = Value::from(base64_url::encode(&bytes));
    serde_json::to_vec(&jwe).unwrap()
}

/// Re-encodes the protected header after `edit` changed it.
pub fn edit_protected(envelope: &[u8], edit: impl FnOnce(&mut Value)) -> Vec<u8> {
    let mut jwe: Value = serde_json::from_slice(envelope).unwrap();
    let mut header = protected_header(envelope);
    edit(&mut header);
    jwe["protected"] = Value::from(base64_url::encode(&serde_json::to_vec(&header).unwrap()));
    serde_json::to_vec(&jwe).unwrap()
}

/// Flips the lowest bit of the last byte of a JWK `x` coordinate.
pub fn flip_jwk_x(jwk: &mut Value) {
    let mut x = base64_url::decode(jwk["x"].as_str().unwrap()).unwrap();
    let last = x.len() - 1;
    x[last] ^= 0x01;
    jwk["x"] = Value::from(base64_url::encode(&x));
}
