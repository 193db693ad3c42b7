//! Key identities: key handles bound to a `kid`, their multikey encoding and
//! extraction from DID Document verification methods.
mod identity;
pub mod multikey;
mod verification_method;

pub use identity::KeyIdentity;
pub use verification_method::{VerificationMethod, VerificationMethodType};
