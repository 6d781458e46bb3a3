use crate::position::Position;

/// Decides, per position, whether a pruner may replace the subtree with
/// its cached digest and whether the freshly computed digest should be
/// written back to the cache.
///
/// Resolvers are pure predicates over positions; each tree operation
/// (insert, single-target search, windowed search, incremental proof)
/// supplies its own. The pair of predicates fully determines the shape
/// of the pruned tree, so the resolver used when verifying must match
/// the one used when the proof was produced.
pub trait CacheResolver<P: Position> {
    /// The subtree at `pos` is frozen and its digest must be taken from
    /// the cache instead of being recomputed.
    fn should_be_in_cache(&self, pos: &P) -> bool;

    /// The digest computed at `pos` is stable and safe to freeze.
    fn should_cache(&self, pos: &P) -> bool;
}
