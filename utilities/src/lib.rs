use base58::FromBase58;
use x25519_dalek::{PublicKey, StaticSecret};

pub const ALICE_KID: &str = "did:example:alice#key-1";
pub const BOB_KID: &str = "did:example:bob#key-1";
pub const CAROL_KID: &str = "did:example:carol#key-2";

const ALICE_PRIVATE: &str = "6QN8DfuN9hjgHgPvLXqgzqYE3jRRGRrmJQZkd5tL8paR";
const BOBS_PRIVATE: &str = "HBTcN2MrXNRj9xF9oi8QqYyuEPv3JLLjQKuEgW9oxVKP";
const CAROLS_PRIVATE: &str = "4KeTJdPPue8FuP6vwknGx5P1wBcVghkFj7ffFKMqRoLB";

/// Fixed X25519 key pairs shared by the integration tests.
pub struct KeyPairSet {
    pub alice_public: [u8; 32],
    pub alice_private: [u8; 32],
    pub bobs_public: [u8; 32],
    pub bobs_private: [u8; 32],
    pub carols_public: [u8; 32],
    pub carols_private: [u8; 32],
}

fn x25519_pair(encoded_private: &str) -> ([u8; 32], [u8; 32]) {
    let private: [u8; 32] = encoded_private
        .from_base58()
        .expect("fixture key is valid base58")
        .try_into()
        .expect("fixture key is 32 bytes long");
    let secret = StaticSecret::from(private);
    let public = PublicKey::from(&secret);
    (public.to_bytes(), secret.to_bytes())
}

pub fn get_keypair_set() -> KeyPairSet {
    let (alice_public, alice_private) = x25519_pair(ALICE_PRIVATE);
    let (bobs_public, bobs_private) = x25519_pair(BOBS_PRIVATE);
    let (carols_public, carols_private) = x25519_pair(CAROLS_PRIVATE);

    KeyPairSet {
        alice_public,
        alice_private,
        bobs_public,
        bobs_private,
        carols_public,
        carols_private,
    }
}
