use std::{fmt, sync::OnceLock};

use crate::{
    crypto::{Key, KeyAlg},
    keys::multikey,
    Result,
};

/// A key handle paired with the identifier recipients and senders know it by.
///
/// The multikey form is derived from the public bytes on first use and then
/// kept, the key itself is never replaced.
#[derive(Clone)]
pub struct KeyIdentity {
    key: Key,
    kid: String,
    multikey: OnceLock<String>,
}

impl KeyIdentity {
    pub fn new(key: Key, kid: impl Into<String>) -> Self {
        KeyIdentity {
            key,
            kid: kid.into(),
            multikey: OnceLock::new(),
        }
    }

    /// Fresh key pair of `alg`.
    pub fn generate(alg: KeyAlg, kid: impl Into<String>) -> Self {
        Self::new(Key::generate(alg), kid)
    }

    pub fn from_public_bytes(alg: KeyAlg, bytes: &[u8], kid: impl Into<String>) -> Result<Self> {
        Ok(Self::new(Key::from_public_bytes(alg, bytes)?, kid))
    }

    pub fn from_secret_bytes(alg: KeyAlg, bytes: &[u8], kid: impl Into<String>) -> Result<Self> {
        Ok(Self::new(Key::from_secret_bytes(alg, bytes)?, kid))
    }

    /// Public-only identity from a `z...` multikey string.
    pub fn from_multikey(multikey: &str, kid: impl Into<String>) -> Result<Self> {
        let (alg, bytes) = multikey::decode(multikey)?;
        Self::from_public_bytes(alg, &bytes, kid)
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn alg(&self) -> KeyAlg {
        self.key.alg()
    }

    pub fn has_secret(&self) -> bool {
        self.key.has_secret()
    }

    pub fn multikey(&self) -> &str {
        self.multikey
            .get_or_init(|| multikey::encode(self.key.alg(), &self.key.public_bytes()))
    }

    /// Same identity without secret material.
    pub fn to_public(&self) -> Self {
        KeyIdentity {
            key: self.key.to_public(),
            kid: self.kid.clone(),
            multikey: self.multikey.clone(),
        }
    }
}

impl fmt::Debug for KeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyIdentity")
            .field("kid", &self.kid)
            .field("key", &self.key)
            .finish()
    }
}

impl PartialEq for KeyIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.kid == other.kid && self.key == other.key
    }
}
