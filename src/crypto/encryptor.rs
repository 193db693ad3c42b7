use aes_gcm::{
    aead::{AeadInPlace, KeyInit, Nonce, Tag},
    Aes128Gcm,
    Aes256Gcm,
};
use chacha20poly1305::XChaCha20Poly1305;
use hmac::{digest::KeyInit as MacKeyInit, Hmac, Mac};
use rand::Rng;
use rand_core::{OsRng, RngCore};
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

use crate::{Error, Result};

/// Content encryption algorithms (JWA `enc` values), see
/// [DIDComm content encryption](https://identity.foundation/didcomm-messaging/spec/#curves-and-content-encryption-algorithms).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContentEncryption {
    A128Gcm,
    A256Gcm,
    A128CbcHs256,
    A256CbcHs512,
    XC20P,
}

impl ContentEncryption {
    /// Header value of the algorithm.
    pub fn id(&self) -> &'static str {
        match self {
            ContentEncryption::A128Gcm => "A128GCM",
            ContentEncryption::A256Gcm => "A256GCM",
            ContentEncryption::A128CbcHs256 => "A128CBC-HS256",
            ContentEncryption::A256CbcHs512 => "A256CBC-HS512",
            ContentEncryption::XC20P => "XC20P",
        }
    }

    pub fn key_len(&self) -> usize {
        match self {
            ContentEncryption::A128Gcm => 16,
            ContentEncryption::A256Gcm | ContentEncryption::A128CbcHs256 => 32,
            ContentEncryption::A256CbcHs512 => 64,
            ContentEncryption::XC20P => 32,
        }
    }

    pub fn nonce_len(&self) -> usize {
        match self {
            ContentEncryption::A128Gcm | ContentEncryption::A256Gcm => 12,
            ContentEncryption::A128CbcHs256 | ContentEncryption::A256CbcHs512 => 16,
            ContentEncryption::XC20P => 24,
        }
    }

    pub fn tag_len(&self) -> usize {
        match self {
            ContentEncryption::A256CbcHs512 => 32,
            _ => 16,
        }
    }

    /// Whether this is one of the AES-CBC + HMAC-SHA2 composite constructions.
    pub fn is_cbc_hmac(&self) -> bool {
        matches!(
            self,
            ContentEncryption::A128CbcHs256 | ContentEncryption::A256CbcHs512
        )
    }
}

impl TryFrom<&str> for ContentEncryption {
    type Error = Error;
    fn try_from(incoming: &str) -> Result<Self> {
        match incoming {
            "A128GCM" => Ok(Self::A128Gcm),
            "A256GCM" => Ok(Self::A256Gcm),
            "A128CBC-HS256" => Ok(Self::A128CbcHs256),
            "A256CBC-HS512" => Ok(Self::A256CbcHs512),
            "XC20P" => Ok(Self::XC20P),
            other => Err(Error::UnsupportedAlgorithm(format!(
                "content encryption {}",
                other
            ))),
        }
    }
}

/// Output of a single content encryption.
#[derive(Clone, Debug)]
pub struct EncryptedPayload {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Symmetric content encryption key (CEK). Zeroized on drop.
pub struct ContentKey {
    alg: ContentEncryption,
    secret: Zeroizing<Vec<u8>>,
}

impl ContentKey {
    pub fn generate(alg: ContentEncryption) -> Self {
        let mut secret = Zeroizing::new(vec![0u8; alg.key_len()]);
        OsRng.fill_bytes(&mut secret);
        ContentKey { alg, secret }
    }

    /// Rebuilds a CEK from unwrapped key bytes.
    pub fn from_bytes(alg: ContentEncryption, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != alg.key_len() {
            return Err(Error::PlugCryptoFailure);
        }
        Ok(ContentKey {
            alg,
            secret: Zeroizing::new(bytes.to_vec()),
        })
    }

    pub fn alg(&self) -> ContentEncryption {
        self.alg
    }

    pub(crate) fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }

    /// Encrypts `message` under a fresh random nonce, authenticating `aad`.
    pub fn encrypt(&self, message: &[u8], aad: &[u8]) -> Result<EncryptedPayload> {
        let mut nonce = vec![0u8; self.alg.nonce_len()];
        rand::thread_rng().fill(&mut nonce[..]);
        let (ciphertext, tag) = match self.alg {
            ContentEncryption::A128Gcm => {
                seal::<Aes128Gcm>(&self.secret, &nonce, message, aad)?
            }
            ContentEncryption::A256Gcm => {
                seal::<Aes256Gcm>(&self.secret, &nonce, message, aad)?
            }
            ContentEncryption::XC20P => {
                seal::<XChaCha20Poly1305>(&self.secret, &nonce, message, aad)?
            }
            ContentEncryption::A128CbcHs256 => {
                let (mac_key, enc_key) = self.secret.split_at(16);
                let ciphertext =
                    libaes::Cipher::new_128(to_array(enc_key)?).cbc_encrypt(&nonce, message);
                let mac = cbc_hmac::<Hmac<Sha256>>(mac_key, aad, &nonce, &ciphertext)?;
                let tag = mac.finalize().into_bytes()[..self.alg.tag_len()].to_vec();
                (ciphertext, tag)
            }
            ContentEncryption::A256CbcHs512 => {
                let (mac_key, enc_key) = self.secret.split_at(32);
                let ciphertext =
                    libaes::Cipher::new_256(to_array(enc_key)?).cbc_encrypt(&nonce, message);
                let mac = cbc_hmac::<Hmac<Sha512>>(mac_key, aad, &nonce, &ciphertext)?;
                let tag = mac.finalize().into_bytes()[..self.alg.tag_len()].to_vec();
                (ciphertext, tag)
            }
        };
        Ok(EncryptedPayload {
            ciphertext,
            nonce,
            tag,
        })
    }

    /// Authenticates and decrypts. Any mismatch is a `PlugCryptoFailure`.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        if nonce.len() != self.alg.nonce_len() || tag.len() != self.alg.tag_len() {
            return Err(Error::PlugCryptoFailure);
        }
        match self.alg {
            ContentEncryption::A128Gcm => {
                open::<Aes128Gcm>(&self.secret, nonce, ciphertext, tag, aad)
            }
            ContentEncryption::A256Gcm => {
                open::<Aes256Gcm>(&self.secret, nonce, ciphertext, tag, aad)
            }
            ContentEncryption::XC20P => {
                open::<XChaCha20Poly1305>(&self.secret, nonce, ciphertext, tag, aad)
            }
            ContentEncryption::A128CbcHs256 => {
                let (mac_key, enc_key) = self.secret.split_at(16);
                cbc_hmac::<Hmac<Sha256>>(mac_key, aad, nonce, ciphertext)?
                    .verify_truncated_left(tag)
                    .map_err(|_| Error::PlugCryptoFailure)?;
                cbc_open(libaes::Cipher::new_128(to_array(enc_key)?), nonce, ciphertext)
            }
            ContentEncryption::A256CbcHs512 => {
                let (mac_key, enc_key) = self.secret.split_at(32);
                cbc_hmac::<Hmac<Sha512>>(mac_key, aad, nonce, ciphertext)?
                    .verify_truncated_left(tag)
                    .map_err(|_| Error::PlugCryptoFailure)?;
                cbc_open(libaes::Cipher::new_256(to_array(enc_key)?), nonce, ciphertext)
            }
        }
    }
}

// inner helper functions
fn seal<A: AeadInPlace + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    message: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let aead = A::new_from_slice(key).map_err(|_| Error::PlugCryptoFailure)?;
    let mut buffer = message.to_vec();
    let tag = aead
        .encrypt_in_place_detached(Nonce::<A>::from_slice(nonce), aad, &mut buffer)
        .map_err(|_| Error::PlugCryptoFailure)?;
    Ok((buffer, tag.to_vec()))
}

fn open<A: AeadInPlace + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let aead = A::new_from_slice(key).map_err(|_| Error::PlugCryptoFailure)?;
    let mut buffer = ciphertext.to_vec();
    aead.decrypt_in_place_detached(
        Nonce::<A>::from_slice(nonce),
        aad,
        &mut buffer,
        Tag::<A>::from_slice(tag),
    )
    .map_err(|_| Error::PlugCryptoFailure)?;
    Ok(buffer)
}

/// MAC over `AAD || IV || ciphertext || AL` (RFC 7518, section 5.2.2.1).
fn cbc_hmac<M: Mac + MacKeyInit>(
    mac_key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<M> {
    let mut mac =
        <M as Mac>::new_from_slice(mac_key).map_err(|_| Error::PlugCryptoFailure)?;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&((aad.len() as u64) * 8).to_be_bytes());
    Ok(mac)
}

fn cbc_open(cipher: libaes::Cipher, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return Err(Error::PlugCryptoFailure);
    }
    Ok(cipher.cbc_decrypt(iv, ciphertext))
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<&[u8; N]> {
    bytes.try_into().map_err(|_| Error::PlugCryptoFailure)
}
