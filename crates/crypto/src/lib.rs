//! Hashing primitives shared by the canopy verifiable data structures.

#![warn(rust_2018_idioms, unused_lifetimes)]
#![warn(unused_qualifications, missing_docs)]
#![forbid(unsafe_code)]

mod digest;
mod hash;

pub use digest::Digest;
pub use hash::{Hasher, Sha256Hasher, XorHasher};
