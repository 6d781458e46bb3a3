use std::collections::BTreeMap;

use canopy_crypto::Digest;
use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::position::Position;
use crate::visit::Visitor;

/// The sibling digests along a root-to-leaf walk, keyed by the canonical
/// string id of their positions.
///
/// An audit path is exactly the information a verifier needs to rebuild
/// the root digest, so it implements [`Cache`]: the verifying pruner
/// reads pruned-away digests from the path the same way the proving
/// pruner read them from the frozen-node cache.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPath(BTreeMap<String, Digest>);

impl AuditPath {
    /// An empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `digest` for the position rendered as `id`.
    pub fn insert(&mut self, id: String, digest: Digest) {
        self.0.insert(id, digest);
    }

    /// The digest recorded under `id`, if any.
    pub fn get(&self, id: &str) -> Option<&Digest> {
        self.0.get(id)
    }

    /// Number of recorded positions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path records nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(id, digest)` entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Digest)> {
        self.0.iter()
    }
}

impl<P: Position> Cache<P> for AuditPath {
    fn get(&self, pos: &P) -> Option<Digest> {
        self.0.get(&pos.string_id()).cloned()
    }
}

impl FromIterator<(String, Digest)> for AuditPath {
    fn from_iter<I: IntoIterator<Item = (String, Digest)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decorates a digest-computing visitor and records the digest of every
/// [`Cacheable`](crate::Visitable::Cacheable) node into an [`AuditPath`].
///
/// Search pruners mark exactly the pruned-away sibling subtree roots as
/// cacheable, so the recorded set is precisely the audit path of the
/// proof. Target leaves are never marked and never recorded.
pub struct AuditPathVisitor<V> {
    inner: V,
    path: AuditPath,
}

impl<V> AuditPathVisitor<V> {
    /// Wrap `inner`.
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            path: AuditPath::new(),
        }
    }

    /// The recorded audit path.
    pub fn into_path(self) -> AuditPath {
        self.path
    }
}

impl<P, V> Visitor<P> for AuditPathVisitor<V>
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
        // Target leaves are not part of the path.
        self.inner.visit_leaf(pos, value)
    }

    fn visit_cached(&mut self, pos: &P, digest: &Digest) -> Digest {
        self.inner.visit_cached(pos, digest)
    }

    fn visit_cacheable(&mut self, pos: &P, result: Digest) -> Digest {
        let digest = self.inner.visit_cacheable(pos, result);
        self.path.insert(pos.string_id(), digest.clone());
        digest
    }
}
