use sha2::{Digest as _, Sha256};

use crate::Digest;

/// A deterministic hash function over a sequence of byte slices.
///
/// Each implementation fixes its own rule for combining the input slices;
/// callers may not assume that `digest(&[a, b])` equals `digest(&[ab])`.
pub trait Hasher {
    /// Digest a sequence of byte slices.
    fn digest(&self, parts: &[&[u8]]) -> Digest;

    /// Output length in bits.
    fn bit_len(&self) -> u16;
}

/// SHA-256 over the concatenation of the inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn digest(&self, parts: &[&[u8]]) -> Digest {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Digest::new(hasher.finalize().to_vec())
    }

    fn bit_len(&self) -> u16 {
        256
    }
}

/// A one-byte hasher that XORs every byte of every input together.
///
/// Useful for tests: tree roots become the XOR of all leaf bytes, which
/// makes expected digests easy to derive by hand.
#[derive(Clone, Copy, Debug, Default)]
pub struct XorHasher;

impl Hasher for XorHasher {
    fn digest(&self, parts: &[&[u8]]) -> Digest {
        let mut result = 0u8;
        for part in parts {
            for byte in *part {
                result ^= byte;
            }
        }
        Digest::new(vec![result])
    }

    fn bit_len(&self) -> u16 {
        8
    }
}
