use crate::{
    crypto::{ContentEncryption, Ecdh1Pu, EcdhEs, Key, KeyWrap},
    util::base64helper::from_base64,
    EnvelopeSource,
    Error,
    Header,
    KeyIdentity,
    Result,
};

/// Decrypts an anonymous (ECDH-ES) envelope addressed to `recipient`.
///
/// Failures of the key unwrap and of the content decryption are both reported
/// as [`Error::DecryptionFailed`].
pub fn ecdh_es_decrypt<'a>(
    envelope: impl Into<EnvelopeSource<'a>>,
    recipient: &KeyIdentity,
) -> Result<Vec<u8>> {
    let jwe = envelope.into().into_jwe()?;
    let protected = jwe.protected();

    let alg = protected
        .get_alg()
        .ok_or(Error::MissingRequiredHeader("alg"))?;
    let wrap = key_wrap_for(alg, "ECDH-ES+")?;

    let entry = jwe
        .get_recipient(recipient.kid())
        .ok_or_else(|| Error::RecipientNotFound(recipient.kid().to_string()))?;

    let enc = protected
        .get_enc()
        .or_else(|| entry.header.get_enc())
        .ok_or(Error::MissingRequiredHeader("enc"))?;
    let enc = ContentEncryption::try_from(enc)?;
    ensure_secret(recipient)?;

    let epk = ephemeral_key(&entry.header)?;
    // apu and apv are allowed to be absent
    let apu = party_info(&entry.header, protected, "apu")?;
    let apv = party_info(&entry.header, protected, "apv")?;
    trace!("anoncrypt unwrap for {} with {}/{}", recipient.kid(), alg, enc.id());

    let cek = EcdhEs::new(alg, &apu, &apv)
        .receiver_unwrap_key(wrap, enc, &epk, recipient.key(), &entry.encrypted_key)
        .map_err(decryption_failed)?;
    cek.decrypt(jwe.ciphertext(), jwe.iv(), jwe.tag(), &jwe.combined_aad())
        .map_err(decryption_failed)
}

/// Decrypts an authenticated (ECDH-1PU) envelope sent by `sender` to `recipient`.
///
/// Only the public half of `sender` is used.
pub fn ecdh_1pu_decrypt<'a>(
    envelope: impl Into<EnvelopeSource<'a>>,
    recipient: &KeyIdentity,
    sender: &KeyIdentity,
) -> Result<Vec<u8>> {
    let jwe = envelope.into().into_jwe()?;
    let protected = jwe.protected();

    let alg = protected
        .get_alg()
        .ok_or(Error::MissingRequiredHeader("alg"))?;
    let wrap = key_wrap_for(alg, "ECDH-1PU+")?;
    let enc = protected
        .get_enc()
        .ok_or(Error::MissingRequiredHeader("enc"))?;
    let enc = match ContentEncryption::try_from(enc)? {
        cbc if cbc.is_cbc_hmac() => cbc,
        other => {
            return Err(Error::UnsupportedAlgorithm(format!(
                "{} with {}",
                other.id(),
                alg
            )))
        }
    };

    let entry = jwe
        .get_recipient(recipient.kid())
        .ok_or_else(|| Error::RecipientNotFound(recipient.kid().to_string()))?;
    ensure_secret(recipient)?;

    let epk = ephemeral_key(protected)?;
    // apu and apv are allowed to be absent
    let apu = optional_base64(protected, "apu")?;
    let apv = optional_base64(protected, "apv")?;
    if let Some(skid) = protected.get_skid() {
        if skid != sender.kid() {
            debug!("skid {} differs from sender kid {}", skid, sender.kid());
        }
    }
    trace!("authcrypt unwrap for {} with {}/{}", recipient.kid(), alg, enc.id());

    let cek = Ecdh1Pu::new(alg, &apu, &apv)
        .receiver_unwrap_key(
            wrap,
            enc,
            &epk,
            sender.key(),
            recipient.key(),
            &entry.encrypted_key,
            jwe.tag(),
        )
        .map_err(decryption_failed)?;
    cek.decrypt(jwe.ciphertext(), jwe.iv(), jwe.tag(), &jwe.combined_aad())
        .map_err(decryption_failed)
}

/// Maps `ECDH-ES+A256KW` style identifiers onto the key wrap, rejecting other prefixes.
fn key_wrap_for(alg: &str, prefix: &str) -> Result<KeyWrap> {
    alg.strip_prefix(prefix)
        .and_then(|wrap| KeyWrap::try_from(wrap).ok())
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("key management {}", alg)))
}

fn ensure_secret(recipient: &KeyIdentity) -> Result<()> {
    if recipient.has_secret() {
        Ok(())
    } else {
        Err(Error::MissingSecretKey(recipient.kid().to_string()))
    }
}

/// A present but unusable `epk` is reported like any other unwrap failure.
fn ephemeral_key(header: &Header) -> Result<Key> {
    let jwk = header
        .epk()
        .map_err(decryption_failed)?
        .ok_or(Error::MissingEphemeralKey)?;
    Key::from_jwk(&jwk).map_err(decryption_failed)
}

fn party_info(recipient: &Header, protected: &Header, name: &str) -> Result<Vec<u8>> {
    match recipient.get(name) {
        Some(_) => optional_base64(recipient, name),
        None => optional_base64(protected, name),
    }
}

fn optional_base64(header: &Header, name: &str) -> Result<Vec<u8>> {
    match header.get(name).and_then(|value| value.as_str()) {
        Some(encoded) => from_base64(encoded),
        None => Ok(Vec::new()),
    }
}

fn decryption_failed(e: Error) -> Error {
    trace!("decryption failed: {}", e);
    Error::DecryptionFailed
}
