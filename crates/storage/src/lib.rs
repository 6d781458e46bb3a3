//! Ordered key-value storage contract consumed by the canopy trees.
//!
//! The trees only rely on three capabilities: batched atomic writes,
//! point lookups, and prefix-scoped ordered range scans. [`MemoryStore`]
//! implements the contract over an in-memory B-tree; persistent backends
//! can plug in behind the same [`Store`] trait.

#![warn(rust_2018_idioms, unused_lifetimes)]
#![warn(unused_qualifications)]
#![forbid(unsafe_code)]

mod kv;
mod memory;
mod store;

pub use kv::{KVPair, KVRange};
pub use memory::MemoryStore;
pub use store::{Mutation, Prefix, Store, StoreError};
