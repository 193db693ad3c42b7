//! Capability interfaces around the envelope protocols and a default
//! implementation of each of them.
//!
//! [`Kms`] composes the [`RustCrypto`] services with any [`SecretsManager`]
//! and can unpack envelopes without being told which local key to use.
use std::{collections::HashMap, sync::RwLock};

use crate::{
    messages::helpers,
    EnvelopeSource,
    Error,
    KeyIdentity,
    Result,
    VerificationMethod,
};

/// Turns DID Document verification methods into usable public keys.
pub trait KeyManager {
    fn verification_method_to_public_key(&self, vm: &VerificationMethod) -> Result<KeyIdentity>;
}

/// The four envelope operations.
pub trait CryptoService {
    fn ecdh_es_encrypt(&self, recipients: &[&KeyIdentity], message: &[u8]) -> Result<Vec<u8>>;

    fn ecdh_es_decrypt(
        &self,
        envelope: EnvelopeSource<'_>,
        recipient: &KeyIdentity,
    ) -> Result<Vec<u8>>;

    fn ecdh_1pu_encrypt(
        &self,
        recipients: &[&KeyIdentity],
        sender: &KeyIdentity,
        message: &[u8],
    ) -> Result<Vec<u8>>;

    fn ecdh_1pu_decrypt(
        &self,
        envelope: EnvelopeSource<'_>,
        recipient: &KeyIdentity,
        sender: &KeyIdentity,
    ) -> Result<Vec<u8>>;
}

/// Lookup of local secret keys by `kid`.
pub trait SecretsManager: Send + Sync {
    fn get_secret_by_kid(&self, kid: &str) -> Result<Option<KeyIdentity>>;
}

/// Default services backed by the crate's own primitives.
#[derive(Clone, Copy, Debug, Default)]
pub struct RustCrypto;

impl KeyManager for RustCrypto {
    fn verification_method_to_public_key(&self, vm: &VerificationMethod) -> Result<KeyIdentity> {
        vm.resolve()
    }
}

impl CryptoService for RustCrypto {
    fn ecdh_es_encrypt(&self, recipients: &[&KeyIdentity], message: &[u8]) -> Result<Vec<u8>> {
        helpers::ecdh_es_encrypt(recipients, message)
    }

    fn ecdh_es_decrypt(
        &self,
        envelope: EnvelopeSource<'_>,
        recipient: &KeyIdentity,
    ) -> Result<Vec<u8>> {
        helpers::ecdh_es_decrypt(envelope, recipient)
    }

    fn ecdh_1pu_encrypt(
        &self,
        recipients: &[&KeyIdentity],
        sender: &KeyIdentity,
        message: &[u8],
    ) -> Result<Vec<u8>> {
        helpers::ecdh_1pu_encrypt(recipients, sender, message)
    }

    fn ecdh_1pu_decrypt(
        &self,
        envelope: EnvelopeSource<'_>,
        recipient: &KeyIdentity,
        sender: &KeyIdentity,
    ) -> Result<Vec<u8>> {
        helpers::ecdh_1pu_decrypt(envelope, recipient, sender)
    }
}

/// Process local secrets store.
#[derive(Debug, Default)]
pub struct InMemorySecrets {
    secrets: RwLock<HashMap<String, KeyIdentity>>,
}

impl InMemorySecrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `identity` under its kid, replacing any previous entry.
    /// Public-only identities are rejected.
    pub fn add_secret(&self, identity: KeyIdentity) -> Result<()> {
        if !identity.has_secret() {
            return Err(Error::MissingSecretKey(identity.kid().to_string()));
        }
        self.secrets
            .write()
            .map_err(|_| poisoned())?
            .insert(identity.kid().to_string(), identity);
        Ok(())
    }

    pub fn remove_secret(&self, kid: &str) -> Result<Option<KeyIdentity>> {
        Ok(self.secrets.write().map_err(|_| poisoned())?.remove(kid))
    }
}

impl SecretsManager for InMemorySecrets {
    fn get_secret_by_kid(&self, kid: &str) -> Result<Option<KeyIdentity>> {
        Ok(self
            .secrets
            .read()
            .map_err(|_| poisoned())?
            .get(kid)
            .cloned())
    }
}

fn poisoned() -> Error {
    Error::Configuration("secrets store lock poisoned".into())
}

/// Result of unpacking an envelope with a locally held key.
#[derive(Clone, Debug, PartialEq)]
pub struct Unpacked {
    pub message: Vec<u8>,
    pub recipient_kid: String,
}

/// [`RustCrypto`] services combined with a secrets store.
#[derive(Debug, Default)]
pub struct Kms<S> {
    crypto: RustCrypto,
    secrets: S,
}

impl<S: SecretsManager> Kms<S> {
    pub fn new(secrets: S) -> Self {
        Kms {
            crypto: RustCrypto,
            secrets,
        }
    }

    pub fn secrets(&self) -> &S {
        &self.secrets
    }

    /// Decrypts an anonymous envelope with the first recipient key found in the store.
    pub fn unpack_anoncrypt<'a>(
        &self,
        envelope: impl Into<EnvelopeSource<'a>>,
    ) -> Result<Unpacked> {
        let jwe = envelope.into().into_jwe()?;
        let local = self.find_local_recipient(jwe.recipient_kids())?;
        let message = self.crypto.ecdh_es_decrypt(EnvelopeSource::Parsed(&jwe), &local)?;
        Ok(Unpacked {
            message,
            recipient_kid: local.kid().to_string(),
        })
    }

    /// Decrypts an authenticated envelope from `sender` with the first recipient key
    /// found in the store.
    pub fn unpack_authcrypt<'a>(
        &self,
        envelope: impl Into<EnvelopeSource<'a>>,
        sender: &KeyIdentity,
    ) -> Result<Unpacked> {
        let jwe = envelope.into().into_jwe()?;
        let local = self.find_local_recipient(jwe.recipient_kids())?;
        let message = self
            .crypto
            .ecdh_1pu_decrypt(EnvelopeSource::Parsed(&jwe), &local, sender)?;
        Ok(Unpacked {
            message,
            recipient_kid: local.kid().to_string(),
        })
    }

    fn find_local_recipient<'k>(
        &self,
        kids: impl Iterator<Item = &'k str>,
    ) -> Result<KeyIdentity> {
        let mut tried = Vec::new();
        for kid in kids {
            if let Some(secret) = self.secrets.get_secret_by_kid(kid)? {
                debug!("unpacking with local key {}", kid);
                return Ok(secret);
            }
            tried.push(kid);
        }
        Err(Error::RecipientNotFound(tried.join(", ")))
    }
}

impl<S> KeyManager for Kms<S> {
    fn verification_method_to_public_key(&self, vm: &VerificationMethod) -> Result<KeyIdentity> {
        self.crypto.verification_method_to_public_key(vm)
    }
}

impl<S> CryptoService for Kms<S> {
    fn ecdh_es_encrypt(&self, recipients: &[&KeyIdentity], message: &[u8]) -> Result<Vec<u8>> {
        self.crypto.ecdh_es_encrypt(recipients, message)
    }

    fn ecdh_es_decrypt(
        &self,
        envelope: EnvelopeSource<'_>,
        recipient: &KeyIdentity,
    ) -> Result<Vec<u8>> {
        self.crypto.ecdh_es_decrypt(envelope, recipient)
    }

    fn ecdh_1pu_encrypt(
        &self,
        recipients: &[&KeyIdentity],
        sender: &KeyIdentity,
        message: &[u8],
    ) -> Result<Vec<u8>> {
        self.crypto.ecdh_1pu_encrypt(recipients, sender, message)
    }

    fn ecdh_1pu_decrypt(
        &self,
        envelope: EnvelopeSource<'_>,
        recipient: &KeyIdentity,
        sender: &KeyIdentity,
    ) -> Result<Vec<u8>> {
        self.crypto.ecdh_1pu_decrypt(envelope, recipient, sender)
    }
}

impl<S: SecretsManager> SecretsManager for Kms<S> {
    fn get_secret_by_kid(&self, kid: &str) -> Result<Option<KeyIdentity>> {
        self.secrets.get_secret_by_kid(kid)
    }
}
