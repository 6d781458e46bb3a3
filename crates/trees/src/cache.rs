use std::collections::HashMap;

use canopy_crypto::Digest;
use canopy_storage::{Prefix, Store};

use crate::position::Position;

/// A read-only view of frozen node digests.
pub trait Cache<P: Position> {
    /// The digest frozen at `pos`, if present.
    fn get(&self, pos: &P) -> Option<Digest>;
}

impl<P: Position, C: Cache<P> + ?Sized> Cache<P> for &C {
    fn get(&self, pos: &P) -> Option<Digest> {
        (**self).get(pos)
    }
}

/// A cache that also accepts insertions.
pub trait ModifiableCache<P: Position>: Cache<P> {
    /// Freeze `digest` at `pos`.
    fn put(&mut self, pos: &P, digest: Digest);
}

/// Reads digests straight from one prefix of a [`Store`].
///
/// A backend failure reads as a miss.
pub struct PassThroughCache<'a, S> {
    prefix: Prefix,
    store: &'a S,
}

impl<'a, S> PassThroughCache<'a, S> {
    /// View the `prefix` column of `store` as a cache.
    pub fn new(prefix: Prefix, store: &'a S) -> Self {
        Self { prefix, store }
    }
}

impl<P: Position, S: Store> Cache<P> for PassThroughCache<'_, S> {
    fn get(&self, pos: &P) -> Option<Digest> {
        self.store
            .get(self.prefix, &pos.bytes())
            .ok()
            .flatten()
            .map(|pair| Digest::from(pair.value))
    }
}

/// An in-memory map of frozen digests, keyed by position bytes.
#[derive(Debug, Default)]
pub struct SimpleCache(HashMap<Vec<u8>, Digest>);

impl SimpleCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frozen entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<P: Position> Cache<P> for SimpleCache {
    fn get(&self, pos: &P) -> Option<Digest> {
        self.0.get(&pos.bytes()).cloned()
    }
}

impl<P: Position> ModifiableCache<P> for SimpleCache {
    fn put(&mut self, pos: &P, digest: Digest) {
        self.0.insert(pos.bytes(), digest);
    }
}

/// A hot tier consulted before a colder decorated cache.
pub struct LayeredCache<'a, C> {
    hot: &'a SimpleCache,
    cold: C,
}

impl<'a, C> LayeredCache<'a, C> {
    /// Consult `hot` first, then `cold`.
    pub fn new(hot: &'a SimpleCache, cold: C) -> Self {
        Self { hot, cold }
    }
}

impl<P: Position, C: Cache<P>> Cache<P> for LayeredCache<'_, C> {
    fn get(&self, pos: &P) -> Option<Digest> {
        Cache::<P>::get(self.hot, pos).or_else(|| self.cold.get(pos))
    }
}

/// Resolves every miss of the decorated cache to the default digest of
/// an all-empty subtree at the position's height.
pub struct FallbackCache<'a, C> {
    inner: C,
    default_hashes: &'a [Digest],
}

impl<'a, C> FallbackCache<'a, C> {
    /// Decorate `inner` with `default_hashes`, indexed by height.
    pub fn new(inner: C, default_hashes: &'a [Digest]) -> Self {
        Self {
            inner,
            default_hashes,
        }
    }
}

impl<P: Position, C: Cache<P>> Cache<P> for FallbackCache<'_, C> {
    fn get(&self, pos: &P) -> Option<Digest> {
        self.inner
            .get(pos)
            .or_else(|| self.default_hashes.get(pos.height() as usize).cloned())
    }
}

#[cfg(test)]
mod tests {
    use canopy_storage::{MemoryStore, Mutation};
    use pretty_assertions::assert_eq;

    use crate::history::HistoryPosition;
    use crate::position::Position as _;

    use super::*;

    #[test]
    fn test_pass_through_reads_store_column() {
        let store = MemoryStore::new();
        let pos = HistoryPosition::new(2, 1);
        store
            .mutate(vec![Mutation::new(
                Prefix::HistoryCache,
                pos.bytes(),
                vec![0x3],
            )])
            .unwrap();

        let cache = PassThroughCache::new(Prefix::HistoryCache, &store);
        assert_eq!(cache.get(&pos), Some(Digest::from([0x3])));
        assert_eq!(cache.get(&HistoryPosition::new(0, 1)), None);
    }

    #[test]
    fn test_layered_prefers_hot_tier() {
        let store = MemoryStore::new();
        let pos = HistoryPosition::new(0, 0);
        store
            .mutate(vec![Mutation::new(
                Prefix::HyperCache,
                pos.bytes(),
                vec![0xc0],
            )])
            .unwrap();

        let mut hot = SimpleCache::new();
        hot.put(&pos, Digest::from([0x01]));

        let cache = LayeredCache::new(&hot, PassThroughCache::new(Prefix::HyperCache, &store));
        assert_eq!(cache.get(&pos), Some(Digest::from([0x01])));

        let cold_only = HistoryPosition::new(4, 0);
        store
            .mutate(vec![Mutation::new(
                Prefix::HyperCache,
                cold_only.bytes(),
                vec![0xc1],
            )])
            .unwrap();
        assert_eq!(cache.get(&cold_only), Some(Digest::from([0xc1])));
    }

    #[test]
    fn test_fallback_resolves_misses_by_height() {
        let defaults = vec![Digest::from([0x0]), Digest::from([0x1]), Digest::from([0x2])];
        let cache = FallbackCache::new(SimpleCache::new(), &defaults);

        assert_eq!(cache.get(&HistoryPosition::new(0, 0)), Some(Digest::from([0x0])));
        assert_eq!(cache.get(&HistoryPosition::new(0, 2)), Some(Digest::from([0x2])));
        assert_eq!(cache.get(&HistoryPosition::new(0, 3)), None);
    }
}
