use std::sync::Arc;

use thiserror::Error;

use crate::kv::{KVPair, KVRange};

/// Key-space prefixes. Every stored key is `prefix byte ‖ key bytes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Prefix {
    /// Version counter maintained by the outer log.
    Version = 0x0,
    /// Hyper tree leaves: event digest → version bytes.
    Index = 0x1,
    /// Frozen hyper tree node digests.
    HyperCache = 0x2,
    /// Frozen history tree node digests.
    HistoryCache = 0x3,
}

impl Prefix {
    /// The single byte prepended to keys stored under this prefix.
    pub fn byte(self) -> u8 {
        self as u8
    }
}

/// An error raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed to complete the operation.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// A single write in a batch: `key` is stored under `prefix` with `value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    /// The key space the write lands in.
    pub prefix: Prefix,
    /// Key bytes, without the prefix byte.
    pub key: Vec<u8>,
    /// Value bytes.
    pub value: Vec<u8>,
}

impl Mutation {
    /// Create a mutation.
    pub fn new(prefix: Prefix, key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { prefix, key, value }
    }
}

/// An ordered key-value store with prefix-scoped range scans.
///
/// Once `mutate` returns, subsequent `get`/`get_range` calls observe all
/// writes of the batch; a batch is applied atomically.
pub trait Store {
    /// Apply a batch of writes atomically.
    fn mutate(&self, mutations: Vec<Mutation>) -> Result<(), StoreError>;

    /// Look up a single key under a prefix.
    fn get(&self, prefix: Prefix, key: &[u8]) -> Result<Option<KVPair>, StoreError>;

    /// All pairs under `prefix` with `start ≤ key ≤ end`, ascending by key.
    /// Returned keys do not carry the prefix byte.
    fn get_range(&self, prefix: Prefix, start: &[u8], end: &[u8]) -> Result<KVRange, StoreError>;
}

impl<S: Store + ?Sized> Store for &S {
    fn mutate(&self, mutations: Vec<Mutation>) -> Result<(), StoreError> {
        (**self).mutate(mutations)
    }

    fn get(&self, prefix: Prefix, key: &[u8]) -> Result<Option<KVPair>, StoreError> {
        (**self).get(prefix, key)
    }

    fn get_range(&self, prefix: Prefix, start: &[u8], end: &[u8]) -> Result<KVRange, StoreError> {
        (**self).get_range(prefix, start, end)
    }
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn mutate(&self, mutations: Vec<Mutation>) -> Result<(), StoreError> {
        (**self).mutate(mutations)
    }

    fn get(&self, prefix: Prefix, key: &[u8]) -> Result<Option<KVPair>, StoreError> {
        (**self).get(prefix, key)
    }

    fn get_range(&self, prefix: Prefix, start: &[u8], end: &[u8]) -> Result<KVRange, StoreError> {
        (**self).get_range(prefix, start, end)
    }
}
