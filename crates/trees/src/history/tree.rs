use canopy_crypto::{Digest, Hasher};
use canopy_storage::{Mutation, Prefix, Store};
use parking_lot::RwLock;
use tracing::debug;

use crate::audit::AuditPathVisitor;
use crate::cache::PassThroughCache;
use crate::caching::CachingVisitor;
use crate::compute::ComputeHashVisitor;
use crate::error::Error;
use crate::position::Position;
use crate::proof::{Commitment, IncrementalProof, MembershipProof};
use crate::resolver::CacheResolver;

use super::navigator::HistoryNavigator;
use super::position::HistoryPosition;
use super::pruner::{HistoryPruningContext, InsertPruner, SearchPruner, VerifyPruner};
use super::resolver::{
    DoubleTargetedResolver, IncrementalResolver, IncrementalVerifyResolver, SingleTargetedResolver,
};

/// The append-only history tree.
///
/// Frozen node digests live in the store under
/// [`Prefix::HistoryCache`]; there is no in-memory tier because every
/// proof touches only a logarithmic number of frozen nodes.
///
/// All operations hold the tree lock exclusively for their duration, so
/// operations on one tree linearize in lock order.
pub struct HistoryTree<H, S> {
    hasher: H,
    store: S,
    lock: RwLock<()>,
}

impl<H, S> HistoryTree<H, S>
where
    H: Hasher,
    S: Store,
{
    /// Create a tree over `store`.
    pub fn new(hasher: H, store: S) -> Self {
        Self {
            hasher,
            store,
            lock: RwLock::new(()),
        }
    }

    fn cache(&self) -> PassThroughCache<'_, S> {
        PassThroughCache::new(Prefix::HistoryCache, &self.store)
    }

    /// Append `event_digest` as the leaf at `version` and commit to the
    /// new root. Frozen digests are flushed to the store in one atomic
    /// batch.
    pub fn add(&self, event_digest: Digest, version: u64) -> Result<Commitment, Error> {
        let _guard = self.lock.write();
        debug!(version, "adding event to history tree");

        let resolver = SingleTargetedResolver::new(version);
        let cache = self.cache();
        let context = HistoryPruningContext {
            navigator: HistoryNavigator::new(version),
            resolver: &resolver,
            cache: &cache,
        };
        let pruned = InsertPruner::new(event_digest, context).prune();

        let mut caching = CachingVisitor::new(ComputeHashVisitor::new(&self.hasher));
        let root_digest = pruned.post_order(&mut caching);

        let mutations = caching
            .into_elements()
            .into_iter()
            .map(|(pos, digest)| {
                Mutation::new(Prefix::HistoryCache, pos.bytes(), digest.into_bytes())
            })
            .collect();
        self.store.mutate(mutations)?;

        Ok(Commitment::new(version, root_digest))
    }

    /// Prove that the event at `index` is committed by the root at
    /// `version` (`index ≤ version`).
    ///
    /// # Panics
    ///
    /// Panics if the tree has not been filled up to `version`.
    pub fn prove_membership(&self, index: u64, version: u64) -> MembershipProof {
        let _guard = self.lock.write();
        debug!(index, version, "proving membership");

        let single;
        let double;
        let resolver: &dyn CacheResolver<HistoryPosition> = if index == version {
            single = SingleTargetedResolver::new(version);
            &single
        } else {
            double = DoubleTargetedResolver::new(index, version);
            &double
        };

        let cache = self.cache();
        let context = HistoryPruningContext {
            navigator: HistoryNavigator::new(version),
            resolver,
            cache: &cache,
        };
        let pruned = SearchPruner::new(context).prune();

        let mut visitor = AuditPathVisitor::new(ComputeHashVisitor::new(&self.hasher));
        pruned.post_order(&mut visitor);
        MembershipProof::new(visitor.into_path())
    }

    /// Check a membership proof produced with `index == version`:
    /// recompute the root from `event_digest` and the audit path, and
    /// compare it against `expected_digest`.
    pub fn verify_membership(
        &self,
        proof: &MembershipProof,
        version: u64,
        event_digest: Digest,
        expected_digest: &Digest,
    ) -> bool {
        let _guard = self.lock.write();
        debug!(version, "verifying membership");

        let resolver = SingleTargetedResolver::new(version);
        let context = HistoryPruningContext {
            navigator: HistoryNavigator::new(version),
            resolver: &resolver,
            cache: &proof.audit_path,
        };
        let pruned = VerifyPruner::new(event_digest, context).prune();

        let mut compute = ComputeHashVisitor::new(&self.hasher);
        pruned.post_order(&mut compute) == *expected_digest
    }

    /// Prove that the root at `start` and the root at `end` commit the
    /// same events up to `start` (`start ≤ end`).
    ///
    /// # Panics
    ///
    /// Panics if the tree has not been filled up to `end`.
    pub fn prove_consistency(&self, start: u64, end: u64) -> IncrementalProof {
        let _guard = self.lock.write();
        debug!(start, end, "proving consistency");

        let resolver = IncrementalResolver::new(start, end);
        let cache = self.cache();
        let context = HistoryPruningContext {
            navigator: HistoryNavigator::new(end),
            resolver: &resolver,
            cache: &cache,
        };
        let pruned = SearchPruner::new(context).prune();

        let mut visitor = AuditPathVisitor::new(ComputeHashVisitor::new(&self.hasher));
        pruned.post_order(&mut visitor);
        IncrementalProof::new(visitor.into_path())
    }

    /// Check a consistency proof: recompute both roots from the shared
    /// audit path and compare them against the expected digests.
    pub fn verify_incremental(
        &self,
        proof: &IncrementalProof,
        start: u64,
        end: u64,
        start_digest: &Digest,
        end_digest: &Digest,
    ) -> bool {
        let _guard = self.lock.write();
        debug!(start, end, "verifying consistency");

        let start_resolver = IncrementalResolver::new(start, start);
        let end_resolver = IncrementalVerifyResolver::new(start, end);
        self.recompute(proof, start, &start_resolver) == *start_digest
            && self.recompute(proof, end, &end_resolver) == *end_digest
    }

    fn recompute(
        &self,
        proof: &IncrementalProof,
        version: u64,
        resolver: &dyn CacheResolver<HistoryPosition>,
    ) -> Digest {
        let context = HistoryPruningContext {
            navigator: HistoryNavigator::new(version),
            resolver,
            cache: &proof.audit_path,
        };
        let pruned = VerifyPruner::new(Digest::default(), context).prune();
        let mut compute = ComputeHashVisitor::new(&self.hasher);
        pruned.post_order(&mut compute)
    }
}

#[cfg(test)]
mod tests {
    use canopy_crypto::{Sha256Hasher, XorHasher};
    use canopy_storage::MemoryStore;
    use pretty_assertions::assert_eq;

    use crate::audit::AuditPath;

    use super::*;

    fn tree() -> HistoryTree<XorHasher, MemoryStore> {
        HistoryTree::new(XorHasher, MemoryStore::new())
    }

    fn d(byte: u8) -> Digest {
        Digest::from([byte])
    }

    fn path(entries: &[(&str, u8)]) -> AuditPath {
        entries
            .iter()
            .map(|(id, byte)| (id.to_string(), d(*byte)))
            .collect()
    }

    #[test]
    fn test_add() {
        let expected_roots = [0x0, 0x1, 0x3, 0x0, 0x4, 0x1, 0x7, 0x0, 0x8, 0x1];

        let tree = tree();
        for (version, expected) in expected_roots.into_iter().enumerate() {
            let version = version as u64;
            let commitment = tree.add(d(version as u8), version).unwrap();
            assert_eq!(
                commitment,
                Commitment::new(version, d(expected)),
                "incorrect root hash for version {version}",
            );
        }
    }

    #[test]
    fn test_add_freezes_complete_subtrees() {
        let tree = tree();
        tree.add(d(0x0), 0).unwrap();
        tree.add(d(0x1), 1).unwrap();

        let cache = tree.cache();
        use crate::cache::Cache as _;
        assert_eq!(cache.get(&HistoryPosition::new(0, 0)), Some(d(0x0)));
        assert_eq!(cache.get(&HistoryPosition::new(1, 0)), Some(d(0x1)));
        assert_eq!(cache.get(&HistoryPosition::new(0, 1)), Some(d(0x1)));
        // Nothing above the frontier is frozen yet.
        assert_eq!(cache.get(&HistoryPosition::new(0, 2)), None);
    }

    #[test]
    fn test_prove_membership() {
        let cases: Vec<(u8, AuditPath)> = vec![
            (0x0, path(&[])),
            (0x1, path(&[("0|0", 0x0)])),
            (0x2, path(&[("0|1", 0x1)])),
            (0x3, path(&[("0|1", 0x1), ("2|0", 0x2)])),
            (0x4, path(&[("0|2", 0x0)])),
            (0x5, path(&[("0|2", 0x0), ("4|0", 0x4)])),
            (0x6, path(&[("0|2", 0x0), ("4|1", 0x1)])),
            (0x7, path(&[("0|2", 0x0), ("4|1", 0x1), ("6|0", 0x6)])),
            (0x8, path(&[("0|3", 0x0)])),
            (0x9, path(&[("0|3", 0x0), ("8|0", 0x8)])),
        ];

        let tree = tree();
        for (version, (event, expected)) in cases.into_iter().enumerate() {
            let version = version as u64;
            tree.add(d(event), version).unwrap();
            let proof = tree.prove_membership(version, version);
            assert_eq!(
                proof.audit_path, expected,
                "incorrect audit path for version {version}",
            );
        }
    }

    #[test]
    fn test_prove_membership_non_consecutive() {
        let tree = tree();
        for i in 0u64..9 {
            tree.add(Digest::from(i.to_le_bytes()), i).unwrap();
        }

        let proof = tree.prove_membership(0, 8);
        let expected = path(&[("1|0", 0x1), ("2|1", 0x1), ("4|2", 0x0), ("8|0", 0x8)]);
        assert_eq!(proof.audit_path, expected);
    }

    #[test]
    fn test_verify_membership() {
        let cases: Vec<(u8, u8, AuditPath)> = vec![
            (0x0, 0x0, path(&[])),
            (0x1, 0x1, path(&[("0|0", 0x0)])),
            (0x2, 0x3, path(&[("0|1", 0x1)])),
            (0x3, 0x0, path(&[("0|1", 0x1), ("2|0", 0x2)])),
            (0x4, 0x4, path(&[("0|2", 0x0)])),
            (0x5, 0x1, path(&[("0|2", 0x0), ("4|0", 0x4)])),
            (0x6, 0x7, path(&[("0|2", 0x0), ("4|1", 0x1)])),
            (0x7, 0x0, path(&[("0|2", 0x0), ("4|1", 0x1), ("6|0", 0x6)])),
            (0x8, 0x8, path(&[("0|3", 0x0)])),
            (0x9, 0x1, path(&[("0|3", 0x0), ("8|0", 0x8)])),
        ];

        let tree = tree();
        for (version, (event, expected_root, audit_path)) in cases.into_iter().enumerate() {
            let version = version as u64;
            let proof = MembershipProof::new(audit_path);
            assert!(
                tree.verify_membership(&proof, version, d(event), &d(expected_root)),
                "event at version {version} should verify",
            );
            assert!(
                !tree.verify_membership(&proof, version, d(event ^ 0xff), &d(expected_root)),
                "tampered event at version {version} should not verify",
            );
        }
    }

    #[test]
    fn test_prove_consistency() {
        let cases: Vec<(u8, AuditPath)> = vec![
            (0x0, path(&[("0|0", 0x0)])),
            (0x1, path(&[("0|0", 0x0), ("1|0", 0x1)])),
            (0x2, path(&[("0|0", 0x0), ("1|0", 0x1), ("2|0", 0x2)])),
            (0x3, path(&[("0|1", 0x1), ("2|0", 0x2), ("3|0", 0x3)])),
            (
                0x4,
                path(&[("0|1", 0x1), ("2|0", 0x2), ("3|0", 0x3), ("4|0", 0x4)]),
            ),
            (0x5, path(&[("0|2", 0x0), ("4|0", 0x4), ("5|0", 0x5)])),
            (
                0x6,
                path(&[("0|2", 0x0), ("4|0", 0x4), ("5|0", 0x5), ("6|0", 0x6)]),
            ),
            (
                0x7,
                path(&[("0|2", 0x0), ("4|1", 0x1), ("6|0", 0x6), ("7|0", 0x7)]),
            ),
            (
                0x8,
                path(&[
                    ("0|2", 0x0),
                    ("4|1", 0x1),
                    ("6|0", 0x6),
                    ("7|0", 0x7),
                    ("8|0", 0x8),
                ]),
            ),
            (0x9, path(&[("0|3", 0x0), ("8|0", 0x8), ("9|0", 0x9)])),
        ];

        let tree = tree();
        for (version, (event, expected)) in cases.into_iter().enumerate() {
            let version = version as u64;
            tree.add(d(event), version).unwrap();
            let proof = tree.prove_consistency(version.saturating_sub(1), version);
            assert_eq!(
                proof.audit_path, expected,
                "incorrect audit path for version {version}",
            );
        }
    }

    #[test]
    fn test_prove_consistency_non_consecutive() {
        let tree = tree();
        for i in 0u64..9 {
            tree.add(Digest::from(i.to_le_bytes()), i).unwrap();
        }

        let proof = tree.prove_consistency(2, 8);
        let expected = path(&[
            ("0|1", 0x1),
            ("2|0", 0x2),
            ("3|0", 0x3),
            ("4|2", 0x0),
            ("8|0", 0x8),
        ]);
        assert_eq!(proof.audit_path, expected);
    }

    #[test]
    fn test_prove_consistency_same_version() {
        let tree = tree();
        for i in 0u64..9 {
            tree.add(Digest::from(i.to_le_bytes()), i).unwrap();
        }

        let proof = tree.prove_consistency(8, 8);
        assert_eq!(proof.audit_path, path(&[("0|3", 0x0), ("8|0", 0x8)]));
    }

    #[test]
    fn test_verify_incremental_roundtrip() {
        let tree = tree();
        let mut commitments = Vec::new();
        for i in 0u64..10 {
            commitments.push(tree.add(d(i as u8), i).unwrap());
        }

        for start in 0u64..10 {
            for end in start..10 {
                let proof = tree.prove_consistency(start, end);
                assert!(
                    tree.verify_incremental(
                        &proof,
                        start,
                        end,
                        &commitments[start as usize].digest,
                        &commitments[end as usize].digest,
                    ),
                    "versions {start} and {end} should be consistent",
                );
            }
        }
    }

    #[test]
    fn test_verify_incremental_rejects_wrong_roots() {
        let tree = tree();
        let mut commitments = Vec::new();
        for i in 0u64..10 {
            commitments.push(tree.add(d(i as u8), i).unwrap());
        }

        let proof = tree.prove_consistency(2, 8);
        assert!(!tree.verify_incremental(
            &proof,
            2,
            8,
            &d(0xff),
            &commitments[8].digest,
        ));
        assert!(!tree.verify_incremental(
            &proof,
            2,
            8,
            &commitments[2].digest,
            &d(0xff),
        ));
    }

    #[test]
    fn test_sha256_end_to_end() {
        let hasher = Sha256Hasher;
        let tree = HistoryTree::new(Sha256Hasher, MemoryStore::new());

        let mut commitments = Vec::new();
        for i in 0u64..32 {
            let event = hasher.digest(&[&i.to_le_bytes()]);
            commitments.push(tree.add(event, i).unwrap());
        }

        for i in 0u64..32 {
            let event = hasher.digest(&[&i.to_le_bytes()]);
            let proof = tree.prove_membership(i, i);
            assert!(tree.verify_membership(
                &proof,
                i,
                event.clone(),
                &commitments[i as usize].digest,
            ));

            let other = hasher.digest(&[b"not this event"]);
            assert!(!tree.verify_membership(&proof, i, other, &commitments[i as usize].digest));
        }

        for start in (0u64..32).step_by(5) {
            for end in start..32 {
                let proof = tree.prove_consistency(start, end);
                assert!(tree.verify_incremental(
                    &proof,
                    start,
                    end,
                    &commitments[start as usize].digest,
                    &commitments[end as usize].digest,
                ));
            }
        }
    }
}
