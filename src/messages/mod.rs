mod builder;
pub(crate) mod helpers;
mod jwe;
mod jwk;

pub use builder::*;
pub use helpers::{
    ecdh_1pu_decrypt,
    ecdh_1pu_encrypt,
    ecdh_1pu_encrypt_jwe,
    ecdh_es_decrypt,
    ecdh_es_encrypt,
    ecdh_es_encrypt_jwe,
    ECDH_1PU_ALG,
    ECDH_1PU_ENC,
    ECDH_ES_ALG,
    ECDH_ES_ENC,
};
pub use jwe::*;
pub use jwk::*;
