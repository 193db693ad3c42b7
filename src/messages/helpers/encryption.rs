use crate::{
    crypto::{ContentEncryption, ContentKey, Ecdh1Pu, EcdhEs, Key, KeyWrap},
    util::base64helper::to_base64,
    Error,
    Header,
    Jwe,
    JweBuilder,
    KeyIdentity,
    Recipient,
    Result,
};

/// Key agreement and wrapping used for anonymous envelopes.
pub const ECDH_ES_ALG: &str = "ECDH-ES+A256KW";
/// Content encryption used for anonymous envelopes.
pub const ECDH_ES_ENC: ContentEncryption = ContentEncryption::XC20P;
/// Key agreement and wrapping used for authenticated envelopes.
pub const ECDH_1PU_ALG: &str = "ECDH-1PU+A256KW";
/// Content encryption used for authenticated envelopes.
pub const ECDH_1PU_ENC: ContentEncryption = ContentEncryption::A256CbcHs512;

/// Anonymous (ECDH-ES) encryption of `message` to all `recipients`.
///
/// Returns the serialized envelope.
pub fn ecdh_es_encrypt(recipients: &[&KeyIdentity], message: &[u8]) -> Result<Vec<u8>> {
    ecdh_es_encrypt_jwe(JweBuilder::new(), recipients, message)?.to_vec()
}

/// Same as [`ecdh_es_encrypt`], building on a preconfigured `builder`.
///
/// One content key is used for the message, every recipient gets it wrapped
/// under its own ephemeral key.
pub fn ecdh_es_encrypt_jwe(
    mut builder: JweBuilder,
    recipients: &[&KeyIdentity],
    message: &[u8],
) -> Result<Jwe> {
    if recipients.is_empty() {
        return Err(Error::NoRecipients);
    }
    for recipient in recipients {
        ensure_key_agreement(recipient)?;
    }
    trace!(
        "anoncrypt to {} recipient(s) with {}/{}",
        recipients.len(),
        ECDH_ES_ALG,
        ECDH_ES_ENC.id()
    );

    let cek = ContentKey::generate(ECDH_ES_ENC);
    let ecdh = EcdhEs::new(ECDH_ES_ALG, &[], &[]);
    for recipient in recipients {
        let ephemeral = Key::generate(recipient.alg());
        let encrypted_key = ecdh
            .sender_wrap_key(KeyWrap::A256Kw, &ephemeral, recipient.key(), &cek)
            .map_err(|_| Error::EncryptionFailed("key wrap"))?;
        let header = Header::new()
            .with("kid", recipient.kid())
            .with("epk", ephemeral.to_jwk_public());
        builder.add_recipient(Recipient::new(header, encrypted_key))?;
        debug!("wrapped content key for {}", recipient.kid());
    }

    builder.set_protected(
        Header::new()
            .with("alg", ECDH_ES_ALG)
            .with("enc", ECDH_ES_ENC.id()),
    )?;
    let payload = cek
        .encrypt(message, &builder.combined_aad()?)
        .map_err(|_| Error::EncryptionFailed("content encryption"))?;
    builder.set_payload(payload)?;
    builder.build()
}

/// Authenticated (ECDH-1PU) encryption of `message` from `sender` to all `recipients`.
///
/// Returns the serialized envelope.
pub fn ecdh_1pu_encrypt(
    recipients: &[&KeyIdentity],
    sender: &KeyIdentity,
    message: &[u8],
) -> Result<Vec<u8>> {
    ecdh_1pu_encrypt_jwe(JweBuilder::new(), recipients, sender, message)?.to_vec()
}

/// Same as [`ecdh_1pu_encrypt`], building on a preconfigured `builder`.
///
/// A single ephemeral key serves all recipients. The content tag is bound into
/// every wrapping key, so the payload is encrypted before any key is wrapped.
pub fn ecdh_1pu_encrypt_jwe(
    mut builder: JweBuilder,
    recipients: &[&KeyIdentity],
    sender: &KeyIdentity,
    message: &[u8],
) -> Result<Jwe> {
    if recipients.is_empty() {
        return Err(Error::NoRecipients);
    }
    if !sender.has_secret() {
        return Err(Error::MissingSecretKey(sender.kid().to_string()));
    }
    ensure_key_agreement(sender)?;

    let mut kids = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        if recipient.alg() != sender.alg() {
            return Err(Error::InconsistentRecipientAlgorithms);
        }
        kids.push(recipient.kid());
    }
    kids.sort_unstable();
    let party_u = sender.kid().as_bytes();
    let party_v = kids.join(".");
    trace!(
        "authcrypt from {} to {} recipient(s) with {}/{}",
        sender.kid(),
        recipients.len(),
        ECDH_1PU_ALG,
        ECDH_1PU_ENC.id()
    );

    let ephemeral = Key::generate(sender.alg());
    builder.set_protected(
        Header::new()
            .with("alg", ECDH_1PU_ALG)
            .with("enc", ECDH_1PU_ENC.id())
            .with("apu", to_base64(party_u))
            .with("apv", to_base64(&party_v))
            .with("epk", ephemeral.to_jwk_public())
            .with("skid", sender.kid()),
    )?;

    let cek = ContentKey::generate(ECDH_1PU_ENC);
    let payload = cek
        .encrypt(message, &builder.combined_aad()?)
        .map_err(|_| Error::EncryptionFailed("content encryption"))?;

    let ecdh = Ecdh1Pu::new(ECDH_1PU_ALG, party_u, party_v.as_bytes());
    for recipient in recipients {
        let encrypted_key = ecdh
            .sender_wrap_key(
                KeyWrap::A256Kw,
                &ephemeral,
                sender.key(),
                recipient.key(),
                &cek,
                &payload.tag,
            )
            .map_err(|_| Error::EncryptionFailed("key wrap"))?;
        builder.add_recipient(Recipient::new(
            Header::new().with("kid", recipient.kid()),
            encrypted_key,
        ))?;
        debug!("wrapped content key for {}", recipient.kid());
    }

    builder.set_payload(payload)?;
    builder.build()
}

fn ensure_key_agreement(identity: &KeyIdentity) -> Result<()> {
    if identity.alg().supports_key_agreement() {
        Ok(())
    } else {
        Err(Error::UnsupportedAlgorithm(format!(
            "{} can not be used for key agreement ({})",
            identity.alg(),
            identity.kid()
        )))
    }
}
