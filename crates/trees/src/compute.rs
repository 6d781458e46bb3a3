use canopy_crypto::{Digest, Hasher};

use crate::position::Position;
use crate::visit::Visitor;

/// Folds a pruned tree into its root digest.
///
/// Leaves hash as `H(value)`, interior nodes as `H(left ‖ right)` and a
/// partial node as `H(left)`. Position bytes are not mixed into the
/// hashes.
pub struct ComputeHashVisitor<'a, H> {
    hasher: &'a H,
}

impl<'a, H> ComputeHashVisitor<'a, H> {
    /// Create a visitor computing digests with `hasher`.
    pub fn new(hasher: &'a H) -> Self {
        Self { hasher }
    }
}

impl<P: Position, H: Hasher> Visitor<P> for ComputeHashVisitor<'_, H> {
    type Output = Digest;

    fn visit_root(&mut self, _pos: &P, left: Digest, right: Digest) -> Digest {
        self.hasher.digest(&[left.bytes(), right.bytes()])
    }

    fn visit_node(&mut self, _pos: &P, left: Digest, right: Digest) -> Digest {
        self.hasher.digest(&[left.bytes(), right.bytes()])
    }

    fn visit_partial_node(&mut self, _pos: &P, left: Digest) -> Digest {
        self.hasher.digest(&[left.bytes()])
    }

    fn visit_leaf(&mut self, _pos: &P, value: &[u8]) -> Digest {
        self.hasher.digest(&[value])
    }

    fn visit_cached(&mut self, _pos: &P, digest: &Digest) -> Digest {
        digest.clone()
    }

    fn visit_cacheable(&mut self, _pos: &P, result: Digest) -> Digest {
        result
    }
}

#[cfg(test)]
mod tests {
    use canopy_crypto::XorHasher;
    use pretty_assertions::assert_eq;

    use crate::history::HistoryPosition;
    use crate::visit::Visitable;

    use super::*;

    #[test]
    fn test_fold_mixed_tree() {
        // Root over a cached left subtree and a fresh right leaf.
        let tree: Visitable<HistoryPosition> = Visitable::Root {
            pos: HistoryPosition::new(0, 1),
            left: Box::new(Visitable::Cached {
                pos: HistoryPosition::new(0, 0),
                digest: Digest::from([0x5]),
            }),
            right: Box::new(Visitable::Leaf {
                pos: HistoryPosition::new(1, 0),
                value: vec![0x3],
            }),
        };

        let hasher = XorHasher;
        let mut visitor = ComputeHashVisitor::new(&hasher);
        assert_eq!(tree.post_order(&mut visitor), Digest::from([0x6]));
    }

    #[test]
    fn test_partial_node_hashes_as_leaf_of_left() {
        let tree: Visitable<HistoryPosition> = Visitable::PartialNode {
            pos: HistoryPosition::new(2, 1),
            left: Box::new(Visitable::Leaf {
                pos: HistoryPosition::new(2, 0),
                value: vec![0x9],
            }),
        };

        let hasher = XorHasher;
        let mut visitor = ComputeHashVisitor::new(&hasher);
        assert_eq!(tree.post_order(&mut visitor), Digest::from([0x9]));
    }
}
