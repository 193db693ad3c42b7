mod encryption;
mod getters;
mod receive;
mod serialization;

pub use encryption::*;
pub(crate) use getters::*;
pub use receive::*;
pub(crate) use serialization::*;
