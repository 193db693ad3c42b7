//! DIDComm v2 encrypted envelopes.
//!
//! Anonymous encryption (`ECDH-ES+A256KW` / `XC20P`) and sender authenticated
//! encryption (`ECDH-1PU+A256KW` / `A256CBC-HS512`) of a message to one or more
//! recipients, using the JWE JSON serialization.
#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

pub mod crypto;
mod error;
pub mod keys;
#[cfg(feature = "kms")]
pub mod kms;
mod messages;
mod result;
pub(crate) mod util;

pub use error::*;
pub use keys::{KeyIdentity, VerificationMethod, VerificationMethodType};
pub use messages::*;
pub use result::Result;
