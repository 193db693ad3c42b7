//! Multikey encoding: base58btc multibase over a multicodec-prefixed public key.
//! Codec values follow the [multicodec table](https://github.com/multiformats/multicodec/blob/master/table.csv).
use multibase::Base;

use crate::{crypto::KeyAlg, Error, Result};

/// Entry of the multicodec table, prefix is the varint encoding of the code.
struct Codec {
    name: &'static str,
    alg: KeyAlg,
    prefix: [u8; 2],
}

/// Single source of truth for both encoding and decoding.
const CODECS: [Codec; 3] = [
    Codec {
        name: "ed25519-pub",
        alg: KeyAlg::Ed25519,
        prefix: [0xed, 0x01],
    },
    Codec {
        name: "x25519-pub",
        alg: KeyAlg::X25519,
        prefix: [0xec, 0x01],
    },
    Codec {
        name: "secp256k1-pub",
        alg: KeyAlg::K256,
        prefix: [0xe7, 0x01],
    },
];

fn codec_for_alg(alg: KeyAlg) -> &'static Codec {
    // every KeyAlg variant has a row in CODECS
    CODECS
        .iter()
        .find(|codec| codec.alg == alg)
        .unwrap_or(&CODECS[0])
}

/// Multicodec name of the public key type, e.g. `x25519-pub`.
pub fn codec_name(alg: KeyAlg) -> &'static str {
    codec_for_alg(alg).name
}

/// Prefixes `public_bytes` with the algorithm's multicodec tag.
pub fn wrap(alg: KeyAlg, public_bytes: &[u8]) -> Vec<u8> {
    let mut prefixed = codec_for_alg(alg).prefix.to_vec();
    prefixed.extend_from_slice(public_bytes);
    prefixed
}

/// Splits multicodec-prefixed bytes; unknown tags are rejected.
pub fn unwrap(prefixed: &[u8]) -> Result<(KeyAlg, &[u8])> {
    if prefixed.len() < 2 {
        return Err(Error::InvalidKeyMaterial(
            "multicodec value too short".to_string(),
        ));
    }
    let (prefix, key) = prefixed.split_at(2);
    CODECS
        .iter()
        .find(|codec| codec.prefix == prefix)
        .map(|codec| (codec.alg, key))
        .ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("multicodec 0x{}", hex::encode(prefix)))
        })
}

/// `z`-prefixed base58btc multikey string for the public key.
pub fn encode(alg: KeyAlg, public_bytes: &[u8]) -> String {
    multibase::encode(Base::Base58Btc, wrap(alg, public_bytes))
}

/// Decodes any multibase string and unwraps its multicodec tag.
pub fn decode(multikey: &str) -> Result<(KeyAlg, Vec<u8>)> {
    let decoded = decode_multibase(multikey)?;
    let (alg, key) = unwrap(&decoded)?;
    Ok((alg, key.to_vec()))
}

pub(crate) fn decode_multibase(encoded: &str) -> Result<Vec<u8>> {
    multibase::decode(encoded)
        .map(|(_, bytes)| bytes)
        .map_err(|e| Error::InvalidKeyMaterial(format!("multibase: {}", e)))
}
