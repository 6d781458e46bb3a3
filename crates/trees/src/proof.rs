use canopy_crypto::Digest;
use serde::{Deserialize, Serialize};

use crate::audit::AuditPath;

/// The `(version, root digest)` pair issued after an add.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// The version the tree was advanced to.
    pub version: u64,
    /// The root digest at that version.
    pub digest: Digest,
}

impl Commitment {
    /// Create a commitment.
    pub fn new(version: u64, digest: Digest) -> Self {
        Self { version, digest }
    }
}

/// Proof that a leaf's value is committed under a root digest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipProof {
    /// Sibling digests sufficient to recompute the root.
    pub audit_path: AuditPath,
}

impl MembershipProof {
    /// Wrap an audit path.
    pub fn new(audit_path: AuditPath) -> Self {
        Self { audit_path }
    }
}

/// Proof that two historical roots are consistent extensions of the same
/// log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalProof {
    /// Sibling digests sufficient to recompute both roots.
    pub audit_path: AuditPath,
}

impl IncrementalProof {
    /// Wrap an audit path.
    pub fn new(audit_path: AuditPath) -> Self {
        Self { audit_path }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_commitment_wire_form() {
        let commitment = Commitment::new(7, Digest::from([0xab, 0xcd]));
        let json = serde_json::to_string(&commitment).unwrap();
        let back: Commitment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, commitment);
    }
}
