use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::kv::{KVPair, KVRange};
use crate::store::{Mutation, Prefix, Store, StoreError};

/// An ordered in-memory store backed by a B-tree map.
///
/// Batches are applied under a single write lock, so readers observe each
/// batch atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn prefixed(prefix: Prefix, key: &[u8]) -> Vec<u8> {
    let mut full = Vec::with_capacity(key.len() + 1);
    full.push(prefix.byte());
    full.extend_from_slice(key);
    full
}

impl Store for MemoryStore {
    fn mutate(&self, mutations: Vec<Mutation>) -> Result<(), StoreError> {
        let mut map = self.inner.write();
        for m in mutations {
            map.insert(prefixed(m.prefix, &m.key), m.value);
        }
        Ok(())
    }

    fn get(&self, prefix: Prefix, key: &[u8]) -> Result<Option<KVPair>, StoreError> {
        let map = self.inner.read();
        Ok(map
            .get(&prefixed(prefix, key))
            .map(|value| KVPair::new(key.to_vec(), value.clone())))
    }

    fn get_range(&self, prefix: Prefix, start: &[u8], end: &[u8]) -> Result<KVRange, StoreError> {
        let map = self.inner.read();
        let mut range = KVRange::new();
        for (key, value) in map.range(prefixed(prefix, start)..=prefixed(prefix, end)) {
            range.push(KVPair::new(key[1..].to_vec(), value.clone()));
        }
        Ok(range)
    }
}
