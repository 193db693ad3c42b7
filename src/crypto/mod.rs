//! Collection of cryptographic primitives the envelope protocols are built on:
//! key handles, content encryption and ECDH key agreement with key wrapping.
//! Underlying algorithms are implemented by Rust-crypto crate family.
pub mod ecdh;
pub mod encryptor;
pub mod key;

pub use ecdh::{Ecdh1Pu, EcdhEs, KeyWrap};
pub use encryptor::{ContentEncryption, ContentKey, EncryptedPayload};
pub use key::{Key, KeyAlg};
