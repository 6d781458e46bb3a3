use canopy_crypto::Digest;

use crate::cache::Cache;
use crate::navigator::TreeNavigator;
use crate::position::Position;
use crate::resolver::CacheResolver;
use crate::visit::Visitable;

use super::navigator::HistoryNavigator;
use super::position::HistoryPosition;

/// Everything a history pruner needs: the tree geometry at the target
/// version, the operation's resolver, and the frozen-digest cache.
pub struct HistoryPruningContext<'a> {
    /// Geometry of the tree at the operation's version.
    pub navigator: HistoryNavigator,
    /// Pruning predicates for the operation.
    pub resolver: &'a dyn CacheResolver<HistoryPosition>,
    /// Frozen digests; the audit path when verifying.
    pub cache: &'a dyn Cache<HistoryPosition>,
}

impl HistoryPruningContext<'_> {
    fn cached_digest(&self, pos: &HistoryPosition) -> Digest {
        match self.cache.get(pos) {
            Some(digest) => digest,
            None => panic!(
                "digest missing for frozen position {}; resolver and cache disagree",
                pos.string_id(),
            ),
        }
    }
}

/// Builds the pruned tree for an insertion at the context's version.
///
/// Frozen subtrees collapse to `Cached` placeholders; every node whose
/// subtree the insertion completes is marked `Cacheable` so the fold can
/// persist its digest.
pub struct InsertPruner<'a> {
    event_digest: Digest,
    context: HistoryPruningContext<'a>,
}

impl<'a> InsertPruner<'a> {
    /// Pruner inserting `event_digest` as the newest leaf.
    pub fn new(event_digest: Digest, context: HistoryPruningContext<'a>) -> Self {
        Self {
            event_digest,
            context,
        }
    }

    /// Build the pruned tree.
    pub fn prune(&self) -> Visitable<HistoryPosition> {
        self.traverse(self.context.navigator.root())
    }

    fn traverse(&self, pos: HistoryPosition) -> Visitable<HistoryPosition> {
        let ctx = &self.context;
        if ctx.resolver.should_be_in_cache(&pos) {
            let digest = ctx.cached_digest(&pos);
            return Visitable::Cached { pos, digest };
        }
        if ctx.navigator.is_leaf(&pos) {
            let leaf = Visitable::Leaf {
                pos,
                value: self.event_digest.bytes().to_vec(),
            };
            if ctx.resolver.should_cache(&pos) {
                return Visitable::Cacheable {
                    pos,
                    underlying: Box::new(leaf),
                };
            }
            return leaf;
        }
        let left = Box::new(self.traverse(ctx.navigator.go_left(&pos)));
        let Some(right_pos) = ctx.navigator.go_right(&pos) else {
            return Visitable::PartialNode { pos, left };
        };
        let right = Box::new(self.traverse(right_pos));
        let node = if ctx.navigator.is_root(&pos) {
            Visitable::Root { pos, left, right }
        } else {
            Visitable::Node { pos, left, right }
        };
        if ctx.resolver.should_cache(&pos) {
            return Visitable::Cacheable {
                pos,
                underlying: Box::new(node),
            };
        }
        node
    }
}

/// Builds the pruned tree for a proof query.
///
/// Frozen subtrees become `Cacheable(Cached(..))` so the audit-path fold
/// records exactly the pruned-away sibling digests; leaves carry no value
/// because proofs never rehash the target event.
pub struct SearchPruner<'a> {
    context: HistoryPruningContext<'a>,
}

impl<'a> SearchPruner<'a> {
    /// Pruner for the context's resolver.
    pub fn new(context: HistoryPruningContext<'a>) -> Self {
        Self { context }
    }

    /// Build the pruned tree.
    ///
    /// # Panics
    ///
    /// Panics if a frozen position is missing from the cache, which means
    /// the resolver does not match the one used at insert time.
    pub fn prune(&self) -> Visitable<HistoryPosition> {
        self.traverse(self.context.navigator.root())
    }

    fn traverse(&self, pos: HistoryPosition) -> Visitable<HistoryPosition> {
        let ctx = &self.context;
        if ctx.resolver.should_be_in_cache(&pos) {
            let digest = ctx.cached_digest(&pos);
            return Visitable::Cacheable {
                pos,
                underlying: Box::new(Visitable::Cached { pos, digest }),
            };
        }
        if ctx.navigator.is_leaf(&pos) {
            return Visitable::Leaf {
                pos,
                value: Vec::new(),
            };
        }
        let left = Box::new(self.traverse(ctx.navigator.go_left(&pos)));
        let Some(right_pos) = ctx.navigator.go_right(&pos) else {
            return Visitable::PartialNode { pos, left };
        };
        let right = Box::new(self.traverse(right_pos));
        if ctx.navigator.is_root(&pos) {
            Visitable::Root { pos, left, right }
        } else {
            Visitable::Node { pos, left, right }
        }
    }
}

/// Builds the pruned tree for verification, with the proof's audit path
/// standing in as the cache.
pub struct VerifyPruner<'a> {
    event_digest: Digest,
    context: HistoryPruningContext<'a>,
}

impl<'a> VerifyPruner<'a> {
    /// Pruner recomputing a root from `event_digest` and the context's
    /// cache. Incremental verification passes an empty digest: its
    /// resolvers pull every leaf from the audit path instead.
    pub fn new(event_digest: Digest, context: HistoryPruningContext<'a>) -> Self {
        Self {
            event_digest,
            context,
        }
    }

    /// Build the pruned tree.
    ///
    /// # Panics
    ///
    /// Panics if the audit path lacks a position the resolver requires.
    pub fn prune(&self) -> Visitable<HistoryPosition> {
        self.traverse(self.context.navigator.root())
    }

    fn traverse(&self, pos: HistoryPosition) -> Visitable<HistoryPosition> {
        let ctx = &self.context;
        if ctx.resolver.should_be_in_cache(&pos) {
            let digest = ctx.cached_digest(&pos);
            return Visitable::Cached { pos, digest };
        }
        if ctx.navigator.is_leaf(&pos) {
            return Visitable::Leaf {
                pos,
                value: self.event_digest.bytes().to_vec(),
            };
        }
        let left = Box::new(self.traverse(ctx.navigator.go_left(&pos)));
        let Some(right_pos) = ctx.navigator.go_right(&pos) else {
            return Visitable::PartialNode { pos, left };
        };
        let right = Box::new(self.traverse(right_pos));
        if ctx.navigator.is_root(&pos) {
            Visitable::Root { pos, left, right }
        } else {
            Visitable::Node { pos, left, right }
        }
    }
}
