use canopy_crypto::Digest;
use canopy_storage::{KVPair, KVRange, Prefix, Store};

use crate::cache::Cache;
use crate::error::Error;
use crate::navigator::TreeNavigator;
use crate::position::Position;
use crate::resolver::CacheResolver;
use crate::visit::Visitable;

use super::navigator::HyperNavigator;
use super::position::HyperPosition;
use super::resolver::{MembershipVerifyResolver, SingleTargetedResolver};

/// Everything a hyper pruner needs: the tree geometry, the frozen-digest
/// cache, the leaf store for range scans, and the default hashes of
/// empty subtrees.
pub struct HyperPruningContext<'a, S> {
    /// Geometry of the fixed-depth tree.
    pub navigator: HyperNavigator,
    /// Frozen digests above the cache level.
    pub cache: &'a dyn Cache<HyperPosition>,
    /// The leaf store scanned below the cache level.
    pub store: &'a S,
    /// Digest of an all-empty subtree, indexed by height.
    pub default_hashes: &'a [Digest],
}

impl<S: Store> HyperPruningContext<'_, S> {
    fn cached_or_default(&self, pos: &HyperPosition) -> Digest {
        self.cache
            .get(pos)
            .unwrap_or_else(|| self.default_digest(pos))
    }

    fn default_digest(&self, pos: &HyperPosition) -> Digest {
        self.default_hashes[pos.height() as usize].clone()
    }

    /// The one range scan of a subtree: every stored leaf between the
    /// subtree's first and last descendant.
    fn scan(&self, pos: &HyperPosition) -> Result<KVRange, Error> {
        let first = self.navigator.descend_first(pos);
        let last = self.navigator.descend_last(pos);
        Ok(self
            .store
            .get_range(Prefix::Index, first.index(), last.index())?)
    }
}

/// Builds the pruned tree for inserting one `(key, value)` leaf.
///
/// Off-path subtrees above the cache level collapse to their frozen (or
/// default) digests; at the cache level the stored leaves of the subtree
/// are scanned once, the new pair is merged in, and the subtree is
/// rebuilt bottom-up. Every recomputed node above the cache level is
/// marked `Cacheable`.
pub struct InsertPruner<'a, S> {
    key: Vec<u8>,
    value: Vec<u8>,
    resolver: SingleTargetedResolver,
    context: HyperPruningContext<'a, S>,
}

impl<'a, S: Store> InsertPruner<'a, S> {
    /// Pruner inserting `value` at the leaf indexed by `key`.
    pub fn new(
        key: Vec<u8>,
        value: Vec<u8>,
        resolver: SingleTargetedResolver,
        context: HyperPruningContext<'a, S>,
    ) -> Self {
        Self {
            key,
            value,
            resolver,
            context,
        }
    }

    /// Build the pruned tree.
    pub fn prune(&self) -> Result<Visitable<HyperPosition>, Error> {
        let mut leaves = KVRange::new();
        leaves.insert_sorted(KVPair::new(self.key.clone(), self.value.clone()));
        self.traverse(self.context.navigator.root(), leaves)
    }

    fn traverse(
        &self,
        pos: HyperPosition,
        leaves: KVRange,
    ) -> Result<Visitable<HyperPosition>, Error> {
        let ctx = &self.context;
        if self.resolver.should_be_in_cache(&pos) {
            let digest = ctx.cached_or_default(&pos);
            return Ok(Visitable::Cached { pos, digest });
        }
        if !self.resolver.should_cache(&pos) {
            let mut scanned = ctx.scan(&pos)?;
            for pair in leaves {
                scanned.insert_sorted(pair);
            }
            return Ok(self.traverse_without_cache(pos, scanned));
        }
        let right_pos = ctx.navigator.right(&pos);
        let (left_leaves, right_leaves) = leaves.split(right_pos.index());
        let left = Box::new(self.traverse(ctx.navigator.go_left(&pos), left_leaves)?);
        let right = Box::new(self.traverse(right_pos, right_leaves)?);
        if ctx.navigator.is_root(&pos) {
            return Ok(Visitable::Root { pos, left, right });
        }
        Ok(Visitable::Cacheable {
            pos: pos.clone(),
            underlying: Box::new(Visitable::Node { pos, left, right }),
        })
    }

    fn traverse_without_cache(
        &self,
        pos: HyperPosition,
        leaves: KVRange,
    ) -> Visitable<HyperPosition> {
        let ctx = &self.context;
        if ctx.navigator.is_leaf(&pos) && leaves.len() == 1 {
            return Visitable::Leaf {
                pos,
                value: leaves.into_single().value,
            };
        }
        if !ctx.navigator.is_root(&pos) && leaves.is_empty() {
            let digest = ctx.default_digest(&pos);
            return Visitable::Cached { pos, digest };
        }
        if ctx.navigator.is_leaf(&pos) {
            panic!(
                "leaf position {} resolved to {} pairs; leaf range is unsorted or split is broken",
                pos.string_id(),
                leaves.len(),
            );
        }
        let right_pos = ctx.navigator.right(&pos);
        let (left_leaves, right_leaves) = leaves.split(right_pos.index());
        let left = Box::new(self.traverse_without_cache(ctx.navigator.go_left(&pos), left_leaves));
        let right = Box::new(self.traverse_without_cache(right_pos, right_leaves));
        if ctx.navigator.is_root(&pos) {
            Visitable::Root { pos, left, right }
        } else {
            Visitable::Node { pos, left, right }
        }
    }
}

/// Builds the pruned tree for a membership query on one key.
///
/// The pruner walks only the root-to-target path. Every sibling subtree
/// is marked `Cacheable` so the audit-path fold records exactly one
/// digest per level: frozen digests above the cache level, and digests
/// recomputed from a range scan below it.
pub struct SearchPruner<'a, S> {
    resolver: SingleTargetedResolver,
    context: HyperPruningContext<'a, S>,
}

impl<'a, S: Store> SearchPruner<'a, S> {
    /// Pruner for the resolver's target key.
    pub fn new(resolver: SingleTargetedResolver, context: HyperPruningContext<'a, S>) -> Self {
        Self { resolver, context }
    }

    /// Build the pruned tree.
    ///
    /// # Panics
    ///
    /// Panics if the target leaf is absent from the store; callers check
    /// the index before pruning.
    pub fn prune(&self) -> Result<Visitable<HyperPosition>, Error> {
        self.traverse(self.context.navigator.root())
    }

    fn traverse(&self, pos: HyperPosition) -> Result<Visitable<HyperPosition>, Error> {
        let ctx = &self.context;
        if self.resolver.should_be_in_cache(&pos) {
            let digest = ctx.cached_or_default(&pos);
            return Ok(Visitable::Cacheable {
                pos: pos.clone(),
                underlying: Box::new(Visitable::Cached { pos, digest }),
            });
        }
        if !self.resolver.should_cache(&pos) {
            let leaves = ctx.scan(&pos)?;
            return Ok(self.traverse_scanned(pos, leaves));
        }
        let right_pos = ctx.navigator.right(&pos);
        let left = Box::new(self.traverse(ctx.navigator.go_left(&pos))?);
        let right = Box::new(self.traverse(right_pos)?);
        if ctx.navigator.is_root(&pos) {
            Ok(Visitable::Root { pos, left, right })
        } else {
            Ok(Visitable::Node { pos, left, right })
        }
    }

    /// Continue below the cache level with the scanned leaves of the
    /// subtree at `pos`.
    fn traverse_scanned(&self, pos: HyperPosition, leaves: KVRange) -> Visitable<HyperPosition> {
        let ctx = &self.context;
        if !self.resolver.on_path(&pos) {
            let underlying = Box::new(self.subtree(pos.clone(), leaves));
            return Visitable::Cacheable { pos, underlying };
        }
        if ctx.navigator.is_leaf(&pos) {
            assert_eq!(
                leaves.len(),
                1,
                "target leaf {} resolved to {} pairs",
                pos.string_id(),
                leaves.len(),
            );
            return Visitable::Leaf {
                pos,
                value: leaves.into_single().value,
            };
        }
        let right_pos = ctx.navigator.right(&pos);
        let (left_leaves, right_leaves) = leaves.split(right_pos.index());
        let left = Box::new(self.traverse_scanned(ctx.navigator.go_left(&pos), left_leaves));
        let right = Box::new(self.traverse_scanned(right_pos, right_leaves));
        if ctx.navigator.is_root(&pos) {
            Visitable::Root { pos, left, right }
        } else {
            Visitable::Node { pos, left, right }
        }
    }

    /// Materialize an off-path sibling subtree from its scanned leaves.
    fn subtree(&self, pos: HyperPosition, leaves: KVRange) -> Visitable<HyperPosition> {
        let ctx = &self.context;
        if leaves.is_empty() {
            let digest = ctx.default_digest(&pos);
            return Visitable::Cached { pos, digest };
        }
        if ctx.navigator.is_leaf(&pos) {
            if leaves.len() > 1 {
                panic!(
                    "leaf position {} resolved to {} pairs; leaf range is unsorted or split is broken",
                    pos.string_id(),
                    leaves.len(),
                );
            }
            return Visitable::Leaf {
                pos,
                value: leaves.into_single().value,
            };
        }
        let right_pos = ctx.navigator.right(&pos);
        let (left_leaves, right_leaves) = leaves.split(right_pos.index());
        let left = Box::new(self.subtree(ctx.navigator.go_left(&pos), left_leaves));
        let right = Box::new(self.subtree(right_pos, right_leaves));
        Visitable::Node { pos, left, right }
    }
}

/// Builds the pruned tree for verification: off-path digests come from
/// the audit path (with default-hash fallback), and the target leaf is
/// rebuilt from the claimed version.
pub struct VerifyPruner<'a> {
    value: Vec<u8>,
    resolver: MembershipVerifyResolver,
    navigator: HyperNavigator,
    cache: &'a dyn Cache<HyperPosition>,
}

impl<'a> VerifyPruner<'a> {
    /// Pruner recomputing a root for a leaf holding `value`.
    pub fn new(
        value: Vec<u8>,
        resolver: MembershipVerifyResolver,
        navigator: HyperNavigator,
        cache: &'a dyn Cache<HyperPosition>,
    ) -> Self {
        Self {
            value,
            resolver,
            navigator,
            cache,
        }
    }

    /// Build the pruned tree.
    ///
    /// # Panics
    ///
    /// Panics if an off-path position resolves to nothing, which cannot
    /// happen while the cache is composed with default-hash fallback.
    pub fn prune(&self) -> Visitable<HyperPosition> {
        self.traverse(self.navigator.root())
    }

    fn traverse(&self, pos: HyperPosition) -> Visitable<HyperPosition> {
        if self.resolver.should_be_in_cache(&pos) {
            match self.cache.get(&pos) {
                Some(digest) => return Visitable::Cached { pos, digest },
                None => panic!(
                    "digest missing for off-path position {}",
                    pos.string_id(),
                ),
            }
        }
        if self.navigator.is_leaf(&pos) {
            return Visitable::Leaf {
                pos,
                value: self.value.clone(),
            };
        }
        let right_pos = self.navigator.right(&pos);
        let left = Box::new(self.traverse(self.navigator.go_left(&pos)));
        let right = Box::new(self.traverse(right_pos));
        if self.navigator.is_root(&pos) {
            Visitable::Root { pos, left, right }
        } else {
            Visitable::Node { pos, left, right }
        }
    }
}

#[cfg(test)]
mod tests {
    use canopy_storage::{MemoryStore, Mutation};
    use pretty_assertions::assert_eq;

    use crate::cache::SimpleCache;

    use super::*;

    fn defaults() -> Vec<Digest> {
        // XOR defaults are all zero at every height.
        vec![Digest::from([0x0]); 8]
    }

    #[test]
    fn test_insert_into_empty_tree_keeps_one_scan_per_subtree() {
        let store = MemoryStore::new();
        let cache = SimpleCache::new();
        let default_hashes = defaults();
        let resolver = SingleTargetedResolver::new(8, 6, vec![0x00]);
        let context = HyperPruningContext {
            navigator: HyperNavigator::new(8),
            cache: &cache,
            store: &store,
            default_hashes: &default_hashes,
        };

        let pruned = InsertPruner::new(vec![0x00], vec![0xaa], resolver, context)
            .prune()
            .unwrap();

        // Height 7: off-path sibling pruned to its default digest; height
        // 6: the scan takes over and finds only the inserted leaf.
        assert_eq!(
            pruned.to_string(),
            "Root(00|8)[ \
             Cacheable[ Node(00|7)[ \
             Node(00|6)[ \
             Node(00|5)[ \
             Node(00|4)[ \
             Node(00|3)[ \
             Node(00|2)[ \
             Node(00|1)[ Leaf(00|0)[ aa ] | Cached(01|0)[ 00 ] ] | \
             Cached(02|1)[ 00 ] ] | \
             Cached(04|2)[ 00 ] ] | \
             Cached(08|3)[ 00 ] ] | \
             Cached(10|4)[ 00 ] ] | \
             Cached(20|5)[ 00 ] ] | \
             Cached(40|6)[ 00 ] ] ] | \
             Cached(80|7)[ 00 ] ]",
        );
    }

    #[test]
    fn test_search_merges_stored_neighbours() {
        let store = MemoryStore::new();
        store
            .mutate(vec![
                Mutation::new(Prefix::Index, vec![0x00], vec![0x0a]),
                Mutation::new(Prefix::Index, vec![0x01], vec![0x0b]),
            ])
            .unwrap();

        let cache = SimpleCache::new();
        let default_hashes = defaults();
        let resolver = SingleTargetedResolver::new(8, 6, vec![0x00]);
        let context = HyperPruningContext {
            navigator: HyperNavigator::new(8),
            cache: &cache,
            store: &store,
            default_hashes: &default_hashes,
        };

        let pruned = SearchPruner::new(resolver, context).prune().unwrap();

        // The stored neighbour at key 0x01 surfaces as the cacheable
        // sibling of the target leaf.
        assert_eq!(
            pruned.to_string(),
            "Root(00|8)[ \
             Node(00|7)[ \
             Node(00|6)[ \
             Node(00|5)[ \
             Node(00|4)[ \
             Node(00|3)[ \
             Node(00|2)[ \
             Node(00|1)[ Leaf(00|0)[ 0a ] | Cacheable[ Leaf(01|0)[ 0b ] ] ] | \
             Cacheable[ Cached(02|1)[ 00 ] ] ] | \
             Cacheable[ Cached(04|2)[ 00 ] ] ] | \
             Cacheable[ Cached(08|3)[ 00 ] ] ] | \
             Cacheable[ Cached(10|4)[ 00 ] ] ] | \
             Cacheable[ Cached(20|5)[ 00 ] ] ] | \
             Cacheable[ Cached(40|6)[ 00 ] ] ] | \
             Cacheable[ Cached(80|7)[ 00 ] ] ]",
        );
    }
}
