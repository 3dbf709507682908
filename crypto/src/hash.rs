//! Legacy Keccak hashing.

use sha3::{Digest, Keccak256, Keccak512};

/// Compute a 256-bit Keccak hash of arbitrary data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Keccak256::digest(data));
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn keccak256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Compute a 512-bit Keccak hash of arbitrary data.
pub fn keccak512(data: &[u8]) -> [u8; 64] {
    let mut output = [0u8; 64];
    output.copy_from_slice(&Keccak512::digest(data));
    output
}

/// A Keccak-512 state reused across many small hashes.
///
/// Cache and dataset generation hash millions of 64-byte rows; reusing one
/// hasher per thread avoids re-initialising the sponge for each row.
#[derive(Clone, Default)]
pub struct Keccak512Hasher {
    inner: Keccak512,
}

impl Keccak512Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `data` into the 64-byte `out`, leaving the hasher ready for the
    /// next input.
    pub fn hash_into(&mut self, data: &[u8], out: &mut [u8]) {
        self.inner.update(data);
        out.copy_from_slice(&self.inner.finalize_reset());
    }

    pub fn hash(&mut self, data: &[u8]) -> [u8; 64] {
        let mut out = [0u8; 64];
        self.hash_into(data, &mut out);
        out
    }
}
