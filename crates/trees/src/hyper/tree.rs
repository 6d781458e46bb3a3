use canopy_crypto::{Digest, Hasher};
use canopy_storage::{Mutation, Prefix, Store};
use parking_lot::RwLock;
use tracing::debug;

use crate::audit::AuditPathVisitor;
use crate::cache::{FallbackCache, LayeredCache, ModifiableCache, PassThroughCache, SimpleCache};
use crate::caching::CachingVisitor;
use crate::compute::ComputeHashVisitor;
use crate::error::Error;
use crate::position::Position;
use crate::proof::{Commitment, MembershipProof};

use super::navigator::HyperNavigator;
use super::pruner::{HyperPruningContext, InsertPruner, SearchPruner, VerifyPruner};
use super::resolver::{MembershipVerifyResolver, SingleTargetedResolver};

/// The sparse hyper tree: event digest → version, with membership proofs.
///
/// Frozen digests above the cache level live both in the store (under
/// [`Prefix::HyperCache`]) and in an in-memory hot tier; leaves live in
/// the store under [`Prefix::Index`]. All operations hold the tree lock
/// exclusively for their duration, so the hot tier and the store batch of
/// an add are observed atomically.
pub struct HyperTree<H, S> {
    hasher: H,
    store: S,
    cache_level: u16,
    default_hashes: Vec<Digest>,
    hot_cache: RwLock<SimpleCache>,
}

impl<H, S> HyperTree<H, S>
where
    H: Hasher,
    S: Store,
{
    /// Create a tree over `store`, freezing nodes strictly above
    /// `cache_level`.
    pub fn new(hasher: H, store: S, cache_level: u16) -> Self {
        let bits = hasher.bit_len() as usize;
        let mut default_hashes = Vec::with_capacity(bits);
        default_hashes.push(hasher.digest(&[&[0x0], &[0x0]]));
        for height in 1..bits {
            let below = &default_hashes[height - 1];
            default_hashes.push(hasher.digest(&[below.bytes(), below.bytes()]));
        }

        Self {
            hasher,
            store,
            cache_level,
            default_hashes,
            hot_cache: RwLock::new(SimpleCache::new()),
        }
    }

    fn num_bits(&self) -> u16 {
        self.hasher.bit_len()
    }

    /// Map `event_digest` to `version` and commit to the new root.
    ///
    /// The frozen-digest batch and the new leaf are flushed to the store
    /// atomically; the hot tier is updated in the same critical section.
    /// Re-adding a known event digest overwrites its version.
    pub fn add(&self, event_digest: &Digest, version: u64) -> Result<Commitment, Error> {
        let mut hot = self.hot_cache.write();
        debug!(version, "adding event to hyper tree");

        let resolver = SingleTargetedResolver::new(
            self.num_bits(),
            self.cache_level,
            event_digest.bytes().to_vec(),
        );
        let value = version.to_le_bytes().to_vec();

        let (root_digest, elements) = {
            let pass_through = PassThroughCache::new(Prefix::HyperCache, &self.store);
            let cache = LayeredCache::new(&hot, pass_through);
            let context = HyperPruningContext {
                navigator: HyperNavigator::new(self.num_bits()),
                cache: &cache,
                store: &self.store,
                default_hashes: &self.default_hashes,
            };
            let pruner = InsertPruner::new(
                event_digest.bytes().to_vec(),
                value.clone(),
                resolver,
                context,
            );
            let pruned = pruner.prune()?;

            let mut caching = CachingVisitor::new(ComputeHashVisitor::new(&self.hasher));
            let root_digest = pruned.post_order(&mut caching);
            (root_digest, caching.into_elements())
        };

        let mut mutations = Vec::with_capacity(elements.len() + 1);
        for (pos, digest) in elements {
            mutations.push(Mutation::new(
                Prefix::HyperCache,
                pos.bytes(),
                digest.bytes().to_vec(),
            ));
            hot.put(&pos, digest);
        }
        mutations.push(Mutation::new(
            Prefix::Index,
            event_digest.bytes().to_vec(),
            value,
        ));
        self.store.mutate(mutations)?;

        Ok(Commitment::new(version, root_digest))
    }

    /// Look up `event_digest`, returning its stored value (the version
    /// as little-endian bytes) and a membership proof.
    pub fn get(&self, event_digest: &Digest) -> Result<(Vec<u8>, MembershipProof), Error> {
        let hot = self.hot_cache.write();
        debug!("proving membership in hyper tree");

        let pair = self
            .store
            .get(Prefix::Index, event_digest.bytes())?
            .ok_or_else(|| Error::EventNotIndexed(event_digest.clone()))?;

        let resolver = SingleTargetedResolver::new(
            self.num_bits(),
            self.cache_level,
            event_digest.bytes().to_vec(),
        );
        let pass_through = PassThroughCache::new(Prefix::HyperCache, &self.store);
        let cache = LayeredCache::new(&hot, pass_through);
        let context = HyperPruningContext {
            navigator: HyperNavigator::new(self.num_bits()),
            cache: &cache,
            store: &self.store,
            default_hashes: &self.default_hashes,
        };
        let pruned = SearchPruner::new(resolver, context).prune()?;

        let mut visitor = AuditPathVisitor::new(ComputeHashVisitor::new(&self.hasher));
        pruned.post_order(&mut visitor);
        Ok((pair.value, MembershipProof::new(visitor.into_path())))
    }

    /// Check a membership proof: recompute the root for `event_digest`
    /// mapped to `version` and compare it against `expected_digest`.
    pub fn verify_membership(
        &self,
        proof: &MembershipProof,
        version: u64,
        event_digest: &Digest,
        expected_digest: &Digest,
    ) -> bool {
        let _guard = self.hot_cache.write();
        debug!(version, "verifying membership in hyper tree");

        let resolver =
            MembershipVerifyResolver::new(self.num_bits(), event_digest.bytes().to_vec());
        let cache = FallbackCache::new(&proof.audit_path, &self.default_hashes);
        let pruner = VerifyPruner::new(
            version.to_le_bytes().to_vec(),
            resolver,
            HyperNavigator::new(self.num_bits()),
            &cache,
        );
        let pruned = pruner.prune();

        let mut compute = ComputeHashVisitor::new(&self.hasher);
        pruned.post_order(&mut compute) == *expected_digest
    }
}
