use core::fmt;

use serde::{Deserialize, Serialize};

/// A digest value produced by a [`Hasher`](crate::Hasher).
///
/// The length is fixed by the hasher that produced it; equality is byte
/// equality. Digests serialize as raw bytes.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest(#[serde(with = "serde_bytes")] Vec<u8>);

impl Digest {
    /// Wrap raw digest bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the digest, yielding its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// The digest length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the digest carries no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Digest {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Digest {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(&self.0))
    }
}

impl fmt::LowerHex for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}
