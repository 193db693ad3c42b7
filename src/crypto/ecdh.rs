use aes_kw::{KekAes128, KekAes256};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::{
    crypto::{ContentEncryption, ContentKey, Key},
    Error,
    Result,
};

/// AES key wrapping algorithms (RFC 3394) used after key agreement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyWrap {
    A128Kw,
    A256Kw,
}

impl KeyWrap {
    pub fn key_len(&self) -> usize {
        match self {
            KeyWrap::A128Kw => 16,
            KeyWrap::A256Kw => 32,
        }
    }

    fn wrap(&self, kek: &[u8], cek: &[u8]) -> Result<Vec<u8>> {
        let wrapped = match self {
            KeyWrap::A128Kw => KekAes128::from(kek_array::<16>(kek)?).wrap_vec(cek),
            KeyWrap::A256Kw => KekAes256::from(kek_array::<32>(kek)?).wrap_vec(cek),
        };
        wrapped.map_err(|_| Error::PlugCryptoFailure)
    }

    fn unwrap(&self, kek: &[u8], wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let unwrapped = match self {
            KeyWrap::A128Kw => KekAes128::from(kek_array::<16>(kek)?).unwrap_vec(wrapped),
            KeyWrap::A256Kw => KekAes256::from(kek_array::<32>(kek)?).unwrap_vec(wrapped),
        };
        unwrapped
            .map(Zeroizing::new)
            .map_err(|_| Error::PlugCryptoFailure)
    }
}

impl TryFrom<&str> for KeyWrap {
    type Error = Error;
    fn try_from(incoming: &str) -> Result<Self> {
        match incoming {
            "A128KW" => Ok(Self::A128Kw),
            "A256KW" => Ok(Self::A256Kw),
            other => Err(Error::UnsupportedAlgorithm(format!("key wrap {}", other))),
        }
    }
}

/// ECDH-ES key agreement with key wrapping.
///
/// `apu` / `apv` are the decoded PartyUInfo / PartyVInfo values.
pub struct EcdhEs<'a> {
    alg: &'a str,
    apu: &'a [u8],
    apv: &'a [u8],
}

impl<'a> EcdhEs<'a> {
    /// `apu` and `apv` are the decoded party info, not the base64url header values.
    pub fn new(alg: &'a str, apu: &'a [u8], apv: &'a [u8]) -> Self {
        EcdhEs { alg, apu, apv }
    }

    pub fn sender_wrap_key(
        &self,
        wrap: KeyWrap,
        ephemeral: &Key,
        recipient: &Key,
        cek: &ContentKey,
    ) -> Result<Vec<u8>> {
        let ze = ephemeral.key_exchange(recipient)?;
        let kek = concat_kdf(&ze, self.alg, self.apu, self.apv, wrap.key_len(), &[])?;
        wrap.wrap(&kek, cek.secret_bytes())
    }

    pub fn receiver_unwrap_key(
        &self,
        wrap: KeyWrap,
        enc: ContentEncryption,
        ephemeral: &Key,
        recipient: &Key,
        wrapped: &[u8],
    ) -> Result<ContentKey> {
        let ze = recipient.key_exchange(ephemeral)?;
        let kek = concat_kdf(&ze, self.alg, self.apu, self.apv, wrap.key_len(), &[])?;
        ContentKey::from_bytes(enc, &wrap.unwrap(&kek, wrapped)?)
    }
}

/// ECDH-1PU key agreement with key wrapping
/// ([draft-madden-jose-ecdh-1pu-04](https://datatracker.ietf.org/doc/html/draft-madden-jose-ecdh-1pu-04)).
///
/// The content tag (`cc_tag`) is bound into the derived key, so the payload
/// has to be encrypted before any CEK is wrapped.
pub struct Ecdh1Pu<'a> {
    alg: &'a str,
    apu: &'a [u8],
    apv: &'a [u8],
}

impl<'a> Ecdh1Pu<'a> {
    /// `apu` and `apv` are the decoded party info, not the base64url header values.
    pub fn new(alg: &'a str, apu: &'a [u8], apv: &'a [u8]) -> Self {
        Ecdh1Pu { alg, apu, apv }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sender_wrap_key(
        &self,
        wrap: KeyWrap,
        ephemeral: &Key,
        sender: &Key,
        recipient: &Key,
        cek: &ContentKey,
        cc_tag: &[u8],
    ) -> Result<Vec<u8>> {
        let ze = ephemeral.key_exchange(recipient)?;
        let zs = sender.key_exchange(recipient)?;
        let z = Zeroizing::new([ze.as_slice(), zs.as_slice()].concat());
        let kek = concat_kdf(&z, self.alg, self.apu, self.apv, wrap.key_len(), cc_tag)?;
        wrap.wrap(&kek, cek.secret_bytes())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn receiver_unwrap_key(
        &self,
        wrap: KeyWrap,
        enc: ContentEncryption,
        ephemeral: &Key,
        sender: &Key,
        recipient: &Key,
        wrapped: &[u8],
        cc_tag: &[u8],
    ) -> Result<ContentKey> {
        let ze = recipient.key_exchange(ephemeral)?;
        let zs = recipient.key_exchange(sender)?;
        let z = Zeroizing::new([ze.as_slice(), zs.as_slice()].concat());
        let kek = concat_kdf(&z, self.alg, self.apu, self.apv, wrap.key_len(), cc_tag)?;
        ContentKey::from_bytes(enc, &wrap.unwrap(&kek, wrapped)?)
    }
}

/// Concatenates key derivation function (RFC 7518, section 4.6.2).
///
/// Only a single SHA-256 round is performed, so `key_len` is at most 32 bytes.
fn concat_kdf(
    secret: &[u8],
    alg: &str,
    producer_info: &[u8],
    consumer_info: &[u8],
    key_len: usize,
    cc_tag: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if key_len > 32 {
        return Err(Error::PlugCryptoFailure);
    }
    let mut value = get_length_and_input(alg.as_bytes())?;
    value.extend(get_length_and_input(producer_info)?);
    value.extend(get_length_and_input(consumer_info)?);
    // SuppPubInfo: key length in bits, then the tag for 1PU
    value.extend(&((key_len as u32) * 8).to_be_bytes());
    if !cc_tag.is_empty() {
        value.extend(get_length_and_input(cc_tag)?);
    }

    let mut hasher = Sha256::new();
    hasher.update([0u8, 0, 0, 1]);
    hasher.update(secret);
    hasher.update(&value);
    let hashed = hasher.finalize();

    Ok(Zeroizing::new(hashed[..key_len].to_vec()))
}

/// Combines length of array and its its length into a vector.
fn get_length_and_input(vector: &[u8]) -> Result<Vec<u8>> {
    let mut collected: Vec<u8> = u32::try_from(vector.len())
        .map_err(|_| Error::PlugCryptoFailure)?
        .to_be_bytes()
        .to_vec();
    collected.extend(vector);
    Ok(collected)
}

fn kek_array<const N: usize>(kek: &[u8]) -> Result<[u8; N]> {
    kek.try_into().map_err(|_| Error::PlugCryptoFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyAlg;

    #[test]
    fn concat_kdf_matches_rfc7518_appendix_c() -> Result<()> {
        // ECDH-ES direct key agreement example, A128GCM, apu "Alice", apv "Bob"
        let z = [
            158, 86, 217, 29, 129, 113, 53, 211, 114, 131, 66, 131, 191, 132, 38, 156, 251, 49,
            110, 163, 218, 128, 106, 72, 246, 218, 167, 121, 140, 254, 144, 196,
        ];
        let derived = concat_kdf(&z, "A128GCM", b"Alice", b"Bob", 16, &[])?;
        assert_eq!(
            &derived[..],
            &[86, 170, 141, 234, 248, 35, 109, 32, 92, 34, 40, 205, 113, 167, 16, 26]
        );
        Ok(())
    }

    #[test]
    fn es_wrap_unwrap_for_agreement_curves() -> Result<()> {
        for alg in [KeyAlg::X25519, KeyAlg::K256] {
            let recipient = Key::generate(alg);
            let ephemeral = Key::generate(alg);
            let cek = ContentKey::generate(ContentEncryption::XC20P);
            let ecdh = EcdhEs::new("ECDH-ES+A256KW", &[], &[]);

            let wrapped =
                ecdh.sender_wrap_key(KeyWrap::A256Kw, &ephemeral, &recipient.to_public(), &cek)?;
            let unwrapped = ecdh.receiver_unwrap_key(
                KeyWrap::A256Kw,
                ContentEncryption::XC20P,
                &ephemeral.to_public(),
                &recipient,
                &wrapped,
            )?;
            assert_eq!(unwrapped.secret_bytes(), cek.secret_bytes());
        }
        Ok(())
    }

    #[test]
    fn one_pu_unwrap_requires_matching_tag() -> Result<()> {
        let sender = Key::generate(KeyAlg::X25519);
        let recipient = Key::generate(KeyAlg::X25519);
        let ephemeral = Key::generate(KeyAlg::X25519);
        let cek = ContentKey::generate(ContentEncryption::A256CbcHs512);
        let ecdh = Ecdh1Pu::new("ECDH-1PU+A128KW", b"alice", b"bob");

        let wrapped = ecdh.sender_wrap_key(
            KeyWrap::A128Kw,
            &ephemeral,
            &sender,
            &recipient.to_public(),
            &cek,
            &[7u8; 32],
        )?;
        let unwrapped = ecdh.receiver_unwrap_key(
            KeyWrap::A128Kw,
            ContentEncryption::A256CbcHs512,
            &ephemeral.to_public(),
            &sender.to_public(),
            &recipient,
            &wrapped,
            &[7u8; 32],
        )?;
        assert_eq!(unwrapped.secret_bytes(), cek.secret_bytes());

        let tampered = ecdh.receiver_unwrap_key(
            KeyWrap::A128Kw,
            ContentEncryption::A256CbcHs512,
            &ephemeral.to_public(),
            &sender.to_public(),
            &recipient,
            &wrapped,
            &[8u8; 32],
        );
        assert!(matches!(tampered, Err(Error::PlugCryptoFailure)));
        Ok(())
    }

    #[test]
    fn unknown_wrap_algorithm() {
        assert!(KeyWrap::try_from("A192KW").is_err());
    }
}
