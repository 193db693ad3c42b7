use crate::crypto::KeyAlg;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no message recipients")]
    NoRecipients,
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("unsupported verification method type: {0}")]
    UnsupportedVerificationMethodType(String),
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
    #[error("key algorithm mismatch: expected {expected}, found {found}")]
    AlgorithmMismatch { expected: KeyAlg, found: KeyAlg },
    #[error("verification method missing {0}")]
    MissingRequiredField(&'static str),
    #[error("recipient key types must be consistent")]
    InconsistentRecipientAlgorithms,
    #[error("secret key material required for {0}")]
    MissingSecretKey(String),
    #[error("recipient header not found: {0}")]
    RecipientNotFound(String),
    #[error("missing ephemeral key")]
    MissingEphemeralKey,
    #[error("missing required header: {0}")]
    MissingRequiredHeader(&'static str),
    #[error("failed to parse as JWE: {0}")]
    JweParseError(String),
    #[error("error {0}")]
    EncryptionFailed(&'static str),
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("plugged cryptography failure")]
    PlugCryptoFailure,
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
}
