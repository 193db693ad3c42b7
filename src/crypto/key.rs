use std::fmt;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::{util::base64helper::from_base64, Error, Jwk, Result};

/// Key algorithms a [`Key`] handle can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAlg {
    Ed25519,
    X25519,
    /// secp256k1
    K256,
}

impl KeyAlg {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAlg::Ed25519 => "ed25519",
            KeyAlg::X25519 => "x25519",
            KeyAlg::K256 => "k256",
        }
    }

    /// Ed25519 keys only sign; ECDH needs a Montgomery or Weierstrass curve.
    pub fn supports_key_agreement(&self) -> bool {
        !matches!(self, KeyAlg::Ed25519)
    }
}

impl fmt::Display for KeyAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque key handle holding public and, optionally, secret material.
///
/// Secret halves zeroize themselves on drop.
#[derive(Clone)]
pub enum Key {
    Ed25519 {
        public: ed25519_dalek::VerifyingKey,
        secret: Option<ed25519_dalek::SigningKey>,
    },
    X25519 {
        public: x25519_dalek::PublicKey,
        secret: Option<x25519_dalek::StaticSecret>,
    },
    K256 {
        public: k256::PublicKey,
        secret: Option<k256::SecretKey>,
    },
}

impl Key {
    /// Generates a fresh key pair. Also used for ephemeral keys.
    pub fn generate(alg: KeyAlg) -> Self {
        match alg {
            KeyAlg::Ed25519 => {
                let secret = ed25519_dalek::SigningKey::generate(&mut OsRng);
                Key::Ed25519 {
                    public: secret.verifying_key(),
                    secret: Some(secret),
                }
            }
            KeyAlg::X25519 => {
                let secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
                Key::X25519 {
                    public: x25519_dalek::PublicKey::from(&secret),
                    secret: Some(secret),
                }
            }
            KeyAlg::K256 => {
                let secret = k256::SecretKey::random(&mut OsRng);
                Key::K256 {
                    public: secret.public_key(),
                    secret: Some(secret),
                }
            }
        }
    }

    /// Imports raw public key bytes. secp256k1 expects a SEC1 encoded point.
    pub fn from_public_bytes(alg: KeyAlg, bytes: &[u8]) -> Result<Self> {
        match alg {
            KeyAlg::Ed25519 => {
                let public = ed25519_dalek::VerifyingKey::from_bytes(&to_array(alg, bytes)?)
                    .map_err(|_| invalid(alg, "public key is not a curve point"))?;
                Ok(Key::Ed25519 {
                    public,
                    secret: None,
                })
            }
            KeyAlg::X25519 => Ok(Key::X25519 {
                public: x25519_dalek::PublicKey::from(to_array(alg, bytes)?),
                secret: None,
            }),
            KeyAlg::K256 => {
                let public = k256::PublicKey::from_sec1_bytes(bytes)
                    .map_err(|_| invalid(alg, "public key is not a SEC1 point"))?;
                Ok(Key::K256 {
                    public,
                    secret: None,
                })
            }
        }
    }

    /// Imports a raw 32 byte secret scalar / seed, deriving the public half.
    pub fn from_secret_bytes(alg: KeyAlg, bytes: &[u8]) -> Result<Self> {
        match alg {
            KeyAlg::Ed25519 => {
                let secret = ed25519_dalek::SigningKey::from_bytes(&to_array(alg, bytes)?);
                Ok(Key::Ed25519 {
                    public: secret.verifying_key(),
                    secret: Some(secret),
                })
            }
            KeyAlg::X25519 => {
                let secret = x25519_dalek::StaticSecret::from(to_array(alg, bytes)?);
                Ok(Key::X25519 {
                    public: x25519_dalek::PublicKey::from(&secret),
                    secret: Some(secret),
                })
            }
            KeyAlg::K256 => {
                let secret = k256::SecretKey::from_slice(bytes)
                    .map_err(|_| invalid(alg, "secret key out of range"))?;
                Ok(Key::K256 {
                    public: secret.public_key(),
                    secret: Some(secret),
                })
            }
        }
    }

    /// Imports the public part of a JWK (`OKP` or `EC` key type).
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        let x = from_base64(&jwk.x)?;
        match (jwk.kty.as_str(), jwk.crv.as_str()) {
            ("OKP", "Ed25519") => Key::from_public_bytes(KeyAlg::Ed25519, &x),
            ("OKP", "X25519") => Key::from_public_bytes(KeyAlg::X25519, &x),
            ("EC", "secp256k1") => {
                let y = jwk
                    .y
                    .as_ref()
                    .ok_or_else(|| invalid(KeyAlg::K256, "JWK missing y coordinate"))?;
                let y = from_base64(y)?;
                if x.len() != 32 || y.len() != 32 {
                    return Err(invalid(KeyAlg::K256, "bad JWK coordinate length"));
                }
                let mut point = Vec::with_capacity(65);
                point.push(0x04);
                point.extend_from_slice(&x);
                point.extend_from_slice(&y);
                Key::from_public_bytes(KeyAlg::K256, &point)
            }
            (kty, crv) => Err(Error::UnsupportedAlgorithm(format!(
                "JWK kty={} crv={}",
                kty, crv
            ))),
        }
    }

    pub fn alg(&self) -> KeyAlg {
        match self {
            Key::Ed25519 { .. } => KeyAlg::Ed25519,
            Key::X25519 { .. } => KeyAlg::X25519,
            Key::K256 { .. } => KeyAlg::K256,
        }
    }

    pub fn has_secret(&self) -> bool {
        match self {
            Key::Ed25519 { secret, .. } => secret.is_some(),
            Key::X25519 { secret, .. } => secret.is_some(),
            Key::K256 { secret, .. } => secret.is_some(),
        }
    }

    /// Copy of this key with the secret half dropped.
    pub fn to_public(&self) -> Self {
        match self {
            Key::Ed25519 { public, .. } => Key::Ed25519 {
                public: *public,
                secret: None,
            },
            Key::X25519 { public, .. } => Key::X25519 {
                public: *public,
                secret: None,
            },
            Key::K256 { public, .. } => Key::K256 {
                public: public.clone(),
                secret: None,
            },
        }
    }

    /// Raw public bytes; secp256k1 keys use the 33 byte compressed form.
    pub fn public_bytes(&self) -> Vec<u8> {
        match self {
            Key::Ed25519 { public, .. } => public.to_bytes().to_vec(),
            Key::X25519 { public, .. } => public.as_bytes().to_vec(),
            Key::K256 { public, .. } => public.to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    pub fn to_jwk_public(&self) -> Jwk {
        match self {
            Key::Ed25519 { public, .. } => Jwk::okp("Ed25519", public.as_bytes()),
            Key::X25519 { public, .. } => Jwk::okp("X25519", public.as_bytes()),
            Key::K256 { public, .. } => {
                let point = public.to_encoded_point(false);
                // an uncompressed, non-identity point always carries both coordinates
                let x = point.x().map(|x| x.to_vec()).unwrap_or_default();
                let y = point.y().map(|y| y.to_vec()).unwrap_or_default();
                Jwk::ec("secp256k1", &x, &y)
            }
        }
    }

    /// ECDH between this key's secret and `other`'s public half.
    pub(crate) fn key_exchange(&self, other: &Key) -> Result<Zeroizing<Vec<u8>>> {
        match (self, other) {
            (Key::X25519 { secret, .. }, Key::X25519 { public, .. }) => {
                let secret = secret.as_ref().ok_or(Error::PlugCryptoFailure)?;
                let shared = secret.diffie_hellman(public);
                if !shared.was_contributory() {
                    return Err(Error::PlugCryptoFailure);
                }
                Ok(Zeroizing::new(shared.as_bytes().to_vec()))
            }
            (Key::K256 { secret, .. }, Key::K256 { public, .. }) => {
                let secret = secret.as_ref().ok_or(Error::PlugCryptoFailure)?;
                let shared =
                    k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
            (Key::Ed25519 { .. }, _) | (_, Key::Ed25519 { .. }) => Err(
                Error::UnsupportedAlgorithm("ed25519 key agreement".to_string()),
            ),
            _ => Err(Error::PlugCryptoFailure),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("alg", &self.alg())
            .field("public", &base64_url::encode(&self.public_bytes()))
            .field("secret", &self.has_secret())
            .finish()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.alg() == other.alg() && self.public_bytes() == other.public_bytes()
    }
}

fn to_array(alg: KeyAlg, bytes: &[u8]) -> Result<[u8; 32]> {
    bytes
        .try_into()
        .map_err(|_| invalid(alg, &format!("expected 32 bytes, got {}", bytes.len())))
}

fn invalid(alg: KeyAlg, reason: &str) -> Error {
    Error::InvalidKeyMaterial(format!("{}: {}", alg, reason))
}
