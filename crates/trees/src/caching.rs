use canopy_crypto::Digest;

use crate::position::Position;
use crate::visit::Visitor;

/// Decorates a digest-computing visitor and collects the digest of every
/// [`Cacheable`](crate::Visitable::Cacheable) node it passes through.
///
/// Used on insert: the collected `(position, digest)` pairs become the
/// batch of frozen-node writes flushed to the store.
pub struct CachingVisitor<P, V> {
    inner: V,
    elements: Vec<(P, Digest)>,
}

impl<P, V> CachingVisitor<P, V> {
    /// Wrap `inner`.
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            elements: Vec::new(),
        }
    }

    /// The collected `(position, digest)` pairs, in post-order.
    pub fn into_elements(self) -> Vec<(P, Digest)> {
        self.elements
    }
}

impl<P, V> Visitor<P> for CachingVisitor<P, V>
where
    P: Position,
    V: Visitor<P, Output = Digest>,
{
    type Output = Digest;

    fn visit_root(&mut self, pos: &P, left: Digest, right: Digest) -> Digest {
        self.inner.visit_root(pos, left, right)
    }

    fn visit_node(&mut self, pos: &P, left: Digest, right: Digest) -> Digest {
        self.inner.visit_node(pos, left, right)
    }

    fn visit_partial_node(&mut self, pos: &P, left: Digest) -> Digest {
        self.inner.visit_partial_node(pos, left)
    }

    fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> Digest {
        self.inner.visit_leaf(pos, value)
    }

    fn visit_cached(&mut self, pos: &P, digest: &Digest) -> Digest {
        self.inner.visit_cached(pos, digest)
    }

    fn visit_cacheable(&mut self, pos: &P, result: Digest) -> Digest {
        let digest = self.inner.visit_cacheable(pos, result);
        self.elements.push((pos.clone(), digest.clone()));
        digest
    }
}
